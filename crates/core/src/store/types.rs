//! Types shared by document store backends.

use thiserror::Error;

/// Errors for document store operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A committed write, published to live listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// The catalog collection was replaced or extended.
    Catalog,
    /// A user document (profile fields or favorites) changed.
    User(String),
    /// A review of the given item was added, edited or deleted.
    Reviews(String),
}

impl Change {
    pub fn touches_user(&self, user_id: &str) -> bool {
        matches!(self, Change::User(id) if id == user_id)
    }

    pub fn touches_reviews_of(&self, item_id: &str) -> bool {
        matches!(self, Change::Reviews(id) if id == item_id)
    }
}
