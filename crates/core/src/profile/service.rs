use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use super::{ProfileUpdate, UserProfile};
use crate::auth::{AuthError, Identity, IdentityProvider, Session, SignedIn};
use crate::notice::NoticeHandle;
use crate::store::{StoreError, UserDirectory};

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Account and profile lifecycle: registration, sign-in, profile edits and
/// account deletion.
pub struct ProfileService {
    users: Arc<dyn UserDirectory>,
    identities: Option<Arc<dyn IdentityProvider>>,
    notices: NoticeHandle,
}

impl ProfileService {
    /// `identities` is `None` when accounts are disabled; registration and
    /// sign-in then fail with a configuration error.
    pub fn new(
        users: Arc<dyn UserDirectory>,
        identities: Option<Arc<dyn IdentityProvider>>,
        notices: NoticeHandle,
    ) -> Self {
        Self {
            users,
            identities,
            notices,
        }
    }

    fn identities(&self) -> Result<&Arc<dyn IdentityProvider>, AuthError> {
        self.identities.as_ref().ok_or_else(|| {
            AuthError::ConfigurationError("accounts are disabled".to_string())
        })
    }

    /// Create an account, its user document, and sign `session` in.
    pub async fn register(
        &self,
        session: &Session,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<SignedIn, ProfileError> {
        let signed_in = self
            .identities()?
            .register(email, password, display_name)
            .await?;
        self.ensure_profile(&signed_in.identity).await?;
        session.sign_in(signed_in.identity.clone());
        Ok(signed_in)
    }

    /// Sign in and create the user document if this is the first sign-in.
    pub async fn sign_in(
        &self,
        session: &Session,
        email: &str,
        password: &str,
    ) -> Result<SignedIn, ProfileError> {
        let signed_in = self.identities()?.sign_in(email, password).await?;
        self.ensure_profile(&signed_in.identity).await?;
        session.sign_in(signed_in.identity.clone());
        Ok(signed_in)
    }

    pub async fn sign_out(&self, session: &Session, token: &str) -> Result<(), ProfileError> {
        self.identities()?.sign_out(token).await?;
        session.sign_out();
        Ok(())
    }

    /// Return the user document, creating it with empty fields when missing.
    pub async fn ensure_profile(&self, identity: &Identity) -> Result<UserProfile, ProfileError> {
        if let Some(profile) = self.users.get_user(&identity.user_id).await? {
            return Ok(profile);
        }

        let profile = UserProfile::new_for(identity, Utc::now());
        self.users.put_user(&profile).await.inspect_err(|e| {
            tracing::warn!(user_id = %identity.user_id, error = %e, "Failed to create profile");
            self.notices.error("Failed to create profile");
        })?;
        tracing::info!(user_id = %identity.user_id, "Created profile");
        Ok(profile)
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError> {
        self.users.get_user(user_id).await
    }

    /// Direct field update. Returns the updated document.
    pub async fn update(
        &self,
        user_id: &str,
        update: &ProfileUpdate,
    ) -> Result<Option<UserProfile>, StoreError> {
        self.users
            .update_user(user_id, update)
            .await
            .inspect_err(|e| {
                tracing::warn!(user_id, error = %e, "Failed to update profile");
                self.notices.error("Failed to update profile");
            })?;
        self.notices.info("Profile updated");
        self.users.get_user(user_id).await
    }

    /// Delete the user document, then the account, then sign out.
    ///
    /// No-op when `session` has no identity.
    pub async fn delete_account(&self, session: &Session) -> Result<(), ProfileError> {
        let Some(user_id) = session.user_id() else {
            tracing::debug!("Ignoring account deletion without identity");
            return Ok(());
        };
        let identities = self.identities()?;

        self.users.delete_user(&user_id).await.inspect_err(|e| {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to delete user document");
            self.notices.error("Failed to delete account");
        })?;
        identities.delete_account(&user_id).await.inspect_err(|e| {
            tracing::warn!(user_id = %user_id, error = %e, "Failed to delete account");
            self.notices.error("Failed to delete account");
        })?;
        session.sign_out();
        tracing::info!(user_id = %user_id, "Account deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::LocalIdentityProvider;
    use crate::notice::{notice_channel, NoticeKind};
    use crate::testing::{fixtures, MockStore};

    fn service(store: &Arc<MockStore>) -> ProfileService {
        let provider = Arc::new(LocalIdentityProvider::in_memory(24).unwrap());
        ProfileService::new(store.clone(), Some(provider), NoticeHandle::detached())
    }

    #[tokio::test]
    async fn test_register_creates_profile_and_signs_in() {
        let store = Arc::new(MockStore::new());
        let service = service(&store);
        let session = Session::signed_out();

        let signed_in = service
            .register(&session, "ada@example.com", "pw", Some("Ada"))
            .await
            .unwrap();

        let profile = store.user(&signed_in.identity.user_id).unwrap();
        assert_eq!(profile.email, "ada@example.com");
        assert_eq!(profile.name, "Ada");
        assert!(profile.favorites.is_empty());
        assert_eq!(session.identity(), Some(signed_in.identity));
    }

    #[tokio::test]
    async fn test_profile_created_once() {
        let store = Arc::new(MockStore::new());
        let service = service(&store);
        let identity = fixtures::identity("u1");

        let first = service.ensure_profile(&identity).await.unwrap();
        service
            .update("u1", &ProfileUpdate {
                description: Some("hello".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        let second = service.ensure_profile(&identity).await.unwrap();

        assert_eq!(first.registration_date, second.registration_date);
        assert_eq!(second.description, "hello");
        let puts = store.calls().iter().filter(|c| *c == "put_user").count();
        assert_eq!(puts, 1);
    }

    #[tokio::test]
    async fn test_sign_in_creates_missing_profile() {
        let store = Arc::new(MockStore::new());
        let service = service(&store);
        let session = Session::signed_out();
        let registered = service
            .register(&session, "a@b.c", "pw", None)
            .await
            .unwrap();
        store.delete_user(&registered.identity.user_id).await.unwrap();

        let signed_in = service.sign_in(&session, "a@b.c", "pw").await.unwrap();
        assert!(store.user(&signed_in.identity.user_id).is_some());
    }

    #[tokio::test]
    async fn test_update_emits_notice() {
        let store = Arc::new(MockStore::new());
        store.set_user(fixtures::profile("u1"));
        let (notices, mut rx) = notice_channel(4);
        let service = ProfileService::new(store.clone(), None, notices);

        let updated = service
            .update("u1", &ProfileUpdate {
                name: Some("Grace".into()),
                gender: Some("f".into()),
                ..Default::default()
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name, "Grace");
        assert_eq!(updated.gender, "f");

        let notice = rx.recv().await.unwrap();
        assert_eq!(notice.kind, NoticeKind::Info);
        assert_eq!(notice.message, "Profile updated");
    }

    #[tokio::test]
    async fn test_update_missing_profile_fails_with_notice() {
        let store = Arc::new(MockStore::new());
        let (notices, mut rx) = notice_channel(4);
        let service = ProfileService::new(store.clone(), None, notices);

        let result = service.update("ghost", &ProfileUpdate::default()).await;
        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert_eq!(rx.recv().await.unwrap().kind, NoticeKind::Error);
    }

    #[tokio::test]
    async fn test_delete_account_removes_document_account_and_session() {
        let store = Arc::new(MockStore::new());
        let service = service(&store);
        let session = Session::signed_out();
        let signed_in = service
            .register(&session, "a@b.c", "pw", None)
            .await
            .unwrap();
        let user_id = signed_in.identity.user_id.clone();

        service.delete_account(&session).await.unwrap();

        assert!(store.user(&user_id).is_none());
        assert!(session.identity().is_none());
        let result = service.sign_in(&Session::signed_out(), "a@b.c", "pw").await;
        assert!(matches!(
            result,
            Err(ProfileError::Auth(AuthError::InvalidCredentials(_)))
        ));
    }

    #[tokio::test]
    async fn test_delete_account_without_identity_is_noop() {
        let store = Arc::new(MockStore::new());
        let service = service(&store);
        service.delete_account(&Session::signed_out()).await.unwrap();
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn test_accounts_disabled() {
        let store = Arc::new(MockStore::new());
        let service = ProfileService::new(store, None, NoticeHandle::detached());
        let result = service
            .register(&Session::signed_out(), "a@b.c", "pw", None)
            .await;
        assert!(matches!(
            result,
            Err(ProfileError::Auth(AuthError::ConfigurationError(_)))
        ));
    }
}
