use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Request information for authentication
#[derive(Debug, Clone, Default)]
pub struct AuthRequest {
    /// Header names are lowercase.
    pub headers: HashMap<String, String>,
}

impl AuthRequest {
    /// Token from an `Authorization: Bearer <token>` header.
    pub fn bearer_token(&self) -> Option<&str> {
        let header = self.headers.get("authorization")?;
        header
            .strip_prefix("Bearer ")
            .or_else(|| header.strip_prefix("bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
    }
}

/// Authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Identity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            email: None,
        }
    }

    /// Name stamped on reviews: display name, then email, then "Anonymous".
    pub fn author_name(&self) -> String {
        [&self.display_name, &self.email]
            .into_iter()
            .flatten()
            .find(|value| !value.is_empty())
            .cloned()
            .unwrap_or_else(|| "Anonymous".to_string())
    }
}

/// Result of a successful sign-in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedIn {
    pub identity: Identity,
    /// Opaque bearer token.
    pub token: String,
    /// RFC 3339 expiry time.
    pub expires_at: String,
}
