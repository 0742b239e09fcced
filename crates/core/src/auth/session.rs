//! Current signed-in identity shared by a component graph.

use std::sync::Arc;

use tokio::sync::watch;

use super::Identity;

/// Observable "who is signed in" cell.
///
/// Clones share the same cell. Components read the identity at the moment
/// an operation runs; operations without an identity are no-ops.
#[derive(Debug, Clone)]
pub struct Session {
    current: Arc<watch::Sender<Option<Identity>>>,
}

impl Session {
    /// A session nobody is signed into.
    pub fn signed_out() -> Self {
        Self {
            current: Arc::new(watch::Sender::new(None)),
        }
    }

    pub fn signed_in(identity: Identity) -> Self {
        Self {
            current: Arc::new(watch::Sender::new(Some(identity))),
        }
    }

    pub fn identity(&self) -> Option<Identity> {
        self.current.borrow().clone()
    }

    pub fn user_id(&self) -> Option<String> {
        self.current.borrow().as_ref().map(|i| i.user_id.clone())
    }

    pub fn sign_in(&self, identity: Identity) {
        tracing::debug!(user_id = %identity.user_id, "Session signed in");
        self.current.send_replace(Some(identity));
    }

    pub fn sign_out(&self) {
        if self.current.send_replace(None).is_some() {
            tracing::debug!("Session signed out");
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.current.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::signed_out()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_identity() {
        let session = Session::signed_out();
        let clone = session.clone();
        assert!(clone.identity().is_none());

        session.sign_in(Identity::new("u1"));
        assert_eq!(clone.user_id().as_deref(), Some("u1"));

        clone.sign_out();
        assert!(session.identity().is_none());
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let session = Session::signed_in(Identity::new("u1"));
        let mut rx = session.subscribe();

        session.sign_out();
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_none());
    }
}
