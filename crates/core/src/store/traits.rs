//! Collaborator traits for the remote document database.

use async_trait::async_trait;

use super::{StoreError, Subscription};
use crate::catalog::CatalogItem;
use crate::profile::{ProfileUpdate, UserProfile};
use crate::reviews::{NewReview, ReviewPatch, ReviewRecord};

/// Read-only catalog collection. No filtering is pushed down.
#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Fetch every catalog item.
    async fn fetch_all(&self) -> Result<Vec<CatalogItem>, StoreError>;
}

/// Per-user documents.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Get a user document, `None` if it does not exist.
    async fn get_user(&self, user_id: &str) -> Result<Option<UserProfile>, StoreError>;

    /// Create or overwrite a user document, favorites included.
    async fn put_user(&self, profile: &UserProfile) -> Result<(), StoreError>;

    /// Direct field update. Fails with `NotFound` if the document is missing.
    async fn update_user(&self, user_id: &str, update: &ProfileUpdate) -> Result<(), StoreError>;

    /// Delete a user document and its favorites.
    async fn delete_user(&self, user_id: &str) -> Result<(), StoreError>;

    /// Add-to-set on the favorites field. Idempotent.
    async fn add_favorite(&self, user_id: &str, item_id: &str) -> Result<(), StoreError>;

    /// Remove-from-set on the favorites field. Idempotent.
    async fn remove_favorite(&self, user_id: &str, item_id: &str) -> Result<(), StoreError>;

    /// Live listener on one user document.
    fn watch_user(&self, user_id: &str) -> Subscription<Option<UserProfile>>;
}

/// The review collection.
#[async_trait]
pub trait ReviewCollection: Send + Sync {
    /// Reviews of an item, oldest first.
    async fn list_for_item(&self, item_id: &str) -> Result<Vec<ReviewRecord>, StoreError>;

    async fn get_review(&self, review_id: &str) -> Result<Option<ReviewRecord>, StoreError>;

    /// Store a new review and return its generated id.
    async fn add_review(&self, review: &NewReview) -> Result<String, StoreError>;

    /// Rewrite comment, rating and timestamp. Fails with `NotFound` if missing.
    async fn update_review(&self, review_id: &str, patch: &ReviewPatch) -> Result<(), StoreError>;

    /// Delete by id. Deleting a missing review succeeds.
    async fn delete_review(&self, review_id: &str) -> Result<(), StoreError>;

    /// Live listener on the reviews of one item, oldest first.
    fn watch_item(&self, item_id: &str) -> Subscription<Vec<ReviewRecord>>;
}
