use async_trait::async_trait;
use thiserror::Error;

use super::types::{AuthRequest, Identity, SignedIn};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authentication required")]
    NotAuthenticated,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Authentication storage error: {0}")]
    Storage(String),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),
}

#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Authenticate a request and return the identity.
    ///
    /// `NotAuthenticated` means no credentials were presented (a guest);
    /// `InvalidCredentials` means credentials were presented and rejected.
    async fn authenticate(&self, request: &AuthRequest) -> Result<Identity, AuthError>;

    /// Name of this authentication method
    fn method_name(&self) -> &'static str;
}

/// Account lifecycle against the authentication provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account and sign it in.
    async fn register(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<SignedIn, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignedIn, AuthError>;

    /// Invalidate a session token. Unknown tokens are ignored.
    async fn sign_out(&self, token: &str) -> Result<(), AuthError>;

    /// Identity behind a live session token.
    async fn resolve(&self, token: &str) -> Result<Identity, AuthError>;

    /// Delete the account and all of its sessions.
    async fn delete_account(&self, user_id: &str) -> Result<(), AuthError>;
}
