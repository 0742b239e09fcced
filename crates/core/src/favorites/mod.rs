//! Favorites: the live set of item ids saved by a user.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::watch;

use crate::auth::Session;
use crate::catalog::CatalogItem;
use crate::listener::{LiveMirror, MirrorStatus};
use crate::notice::NoticeHandle;
use crate::store::{StoreError, UserDirectory};

/// Observable mirror of a user's favorites.
///
/// The set only ever holds confirmed remote snapshots: `add` and `remove`
/// write to the store and the listener brings the change back.
pub struct FavoritesSet {
    users: Arc<dyn UserDirectory>,
    session: Session,
    notices: NoticeHandle,
    mirror: LiveMirror<BTreeSet<String>>,
}

impl FavoritesSet {
    pub fn new(users: Arc<dyn UserDirectory>, session: Session, notices: NoticeHandle) -> Self {
        Self {
            users,
            session,
            notices,
            mirror: LiveMirror::new("favorites"),
        }
    }

    /// Start mirroring `user_id`'s favorites, replacing any previous listener.
    ///
    /// A missing user document mirrors as the empty set.
    pub fn load(&self, user_id: &str) {
        tracing::debug!(user_id, "Listening to favorites");
        let subscription = self.users.watch_user(user_id);
        self.mirror.attach(user_id, subscription, |profile| {
            profile.map(|p| p.favorites).unwrap_or_default()
        });
    }

    /// Add `item_id` to the remote set. No-op without a signed-in identity.
    pub async fn add(&self, user_id: &str, item_id: &str) -> Result<(), StoreError> {
        if self.session.identity().is_none() {
            tracing::debug!(item_id, "Ignoring favorite add without identity");
            return Ok(());
        }
        self.users
            .add_favorite(user_id, item_id)
            .await
            .inspect_err(|e| {
                tracing::warn!(user_id, item_id, error = %e, "Failed to add favorite");
                self.notices.error("Failed to add favorite");
            })
    }

    /// Remove `item_id` from the remote set. No-op without a signed-in identity.
    pub async fn remove(&self, user_id: &str, item_id: &str) -> Result<(), StoreError> {
        if self.session.identity().is_none() {
            tracing::debug!(item_id, "Ignoring favorite removal without identity");
            return Ok(());
        }
        self.users
            .remove_favorite(user_id, item_id)
            .await
            .inspect_err(|e| {
                tracing::warn!(user_id, item_id, error = %e, "Failed to remove favorite");
                self.notices.error("Failed to remove favorite");
            })
    }

    /// Add when absent from the mirrored set, remove otherwise.
    pub async fn toggle(&self, user_id: &str, item_id: &str) -> Result<(), StoreError> {
        if self.contains(item_id) {
            self.remove(user_id, item_id).await
        } else {
            self.add(user_id, item_id).await
        }
    }

    pub fn contains(&self, item_id: &str) -> bool {
        self.mirror.read(|set| set.contains(item_id))
    }

    pub fn current(&self) -> BTreeSet<String> {
        self.mirror.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<BTreeSet<String>> {
        self.mirror.subscribe()
    }

    pub fn status(&self) -> MirrorStatus {
        self.mirror.status()
    }

    /// Wait for the first snapshot (or error) after `load`.
    pub async fn wait_synced(&self) -> MirrorStatus {
        self.mirror.wait_synced().await
    }
}

impl std::fmt::Debug for FavoritesSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FavoritesSet")
            .field("mirror", &self.mirror)
            .finish()
    }
}

/// Catalog items whose id is in `favorites`, in catalog order.
pub fn join_favorites(items: &[CatalogItem], favorites: &BTreeSet<String>) -> Vec<CatalogItem> {
    items
        .iter()
        .filter(|item| favorites.contains(&item.id))
        .cloned()
        .collect()
}
