use async_trait::async_trait;

use super::{AuthError, AuthRequest, Authenticator, Identity};

/// Authenticator that treats every request as a guest.
///
/// Guests can browse the catalog and read reviews; everything tied to a user
/// document is unavailable.
pub struct NoneAuthenticator;

impl NoneAuthenticator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NoneAuthenticator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Authenticator for NoneAuthenticator {
    async fn authenticate(&self, _request: &AuthRequest) -> Result<Identity, AuthError> {
        Err(AuthError::NotAuthenticated)
    }

    fn method_name(&self) -> &'static str {
        "none"
    }
}
