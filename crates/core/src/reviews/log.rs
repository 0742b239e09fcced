use std::sync::Arc;

use chrono::Utc;
use tokio::sync::watch;

use super::{NewReview, ReviewPatch, ReviewRecord};
use crate::auth::{Identity, Session};
use crate::listener::{LiveMirror, MirrorStatus};
use crate::metrics::REVIEWS_SUBMITTED;
use crate::notice::NoticeHandle;
use crate::store::{ReviewCollection, StoreError, UserDirectory};

/// Live, timestamp-ascending reviews of one catalog item.
///
/// Submitting is an upsert per author: when the loaded list already holds the
/// author's review of the item it is edited in place, otherwise a new review
/// is created. Successful writes patch the local list right away; the next
/// remote snapshot replaces it.
pub struct ReviewLog {
    reviews: Arc<dyn ReviewCollection>,
    users: Arc<dyn UserDirectory>,
    session: Session,
    notices: NoticeHandle,
    mirror: LiveMirror<Vec<ReviewRecord>>,
}

impl ReviewLog {
    pub fn new(
        reviews: Arc<dyn ReviewCollection>,
        users: Arc<dyn UserDirectory>,
        session: Session,
        notices: NoticeHandle,
    ) -> Self {
        Self {
            reviews,
            users,
            session,
            notices,
            mirror: LiveMirror::new("reviews"),
        }
    }

    /// Start mirroring the reviews of `item_id`, replacing any previous listener.
    pub fn load(&self, item_id: &str) {
        tracing::debug!(item_id, "Listening to reviews");
        let subscription = self.reviews.watch_item(item_id);
        self.mirror.attach(item_id, subscription, |reviews| reviews);
    }

    /// Create or update the signed-in author's review of `item_id`.
    ///
    /// Returns the stored record, or `None` when nobody is signed in.
    pub async fn submit(
        &self,
        item_id: &str,
        comment: &str,
        rating: i32,
    ) -> Result<Option<ReviewRecord>, StoreError> {
        let Some(identity) = self.session.identity() else {
            tracing::debug!(item_id, "Ignoring review submit without identity");
            return Ok(None);
        };
        let timestamp = Utc::now().timestamp_millis();

        let existing = self.mirror.read(|list| {
            list.iter()
                .find(|r| r.user_id == identity.user_id && r.item_id == item_id)
                .cloned()
        });

        let record = match existing {
            Some(mut record) => {
                let patch = ReviewPatch {
                    comment: comment.to_string(),
                    rating,
                    timestamp,
                };
                self.reviews
                    .update_review(&record.id, &patch)
                    .await
                    .inspect_err(|e| {
                        tracing::warn!(review_id = %record.id, error = %e, "Failed to update review");
                        self.notices.error("Failed to update review");
                    })?;
                record.apply(&patch);
                REVIEWS_SUBMITTED.with_label_values(&["updated"]).inc();
                tracing::info!(review_id = %record.id, item_id, "Updated review");
                record
            }
            None => {
                let review = NewReview {
                    item_id: item_id.to_string(),
                    user_id: identity.user_id.clone(),
                    user_name: self.author_name(&identity).await,
                    rating,
                    comment: comment.to_string(),
                    timestamp,
                };
                let id = self.reviews.add_review(&review).await.inspect_err(|e| {
                    tracing::warn!(item_id, error = %e, "Failed to add review");
                    self.notices.error("Failed to add review");
                })?;
                REVIEWS_SUBMITTED.with_label_values(&["created"]).inc();
                tracing::info!(review_id = %id, item_id, "Added review");
                review.with_id(id)
            }
        };

        self.mirror.patch(item_id, |list| upsert_local(list, &record));
        Ok(Some(record))
    }

    /// Delete `record` by id and drop it from the local list.
    ///
    /// No-op without a signed-in identity.
    pub async fn delete(&self, record: &ReviewRecord) -> Result<(), StoreError> {
        if self.session.identity().is_none() {
            tracing::debug!(review_id = %record.id, "Ignoring review delete without identity");
            return Ok(());
        }
        self.reviews
            .delete_review(&record.id)
            .await
            .inspect_err(|e| {
                tracing::warn!(review_id = %record.id, error = %e, "Failed to delete review");
                self.notices.error("Failed to delete review");
            })?;

        self.mirror.patch(&record.item_id, |list| {
            let before = list.len();
            list.retain(|r| r.id != record.id);
            list.len() != before
        });
        tracing::info!(review_id = %record.id, "Deleted review");
        Ok(())
    }

    /// The signed-in author's review in the loaded list, if any.
    pub fn own_review(&self) -> Option<ReviewRecord> {
        let user_id = self.session.user_id()?;
        self.mirror
            .read(|list| list.iter().find(|r| r.user_id == user_id).cloned())
    }

    pub fn current(&self) -> Vec<ReviewRecord> {
        self.mirror.current()
    }

    pub fn subscribe(&self) -> watch::Receiver<Vec<ReviewRecord>> {
        self.mirror.subscribe()
    }

    /// Item whose reviews are mirrored.
    pub fn item_id(&self) -> Option<String> {
        self.mirror.key()
    }

    pub fn status(&self) -> MirrorStatus {
        self.mirror.status()
    }

    /// Notified on every snapshot and on every listener error.
    pub fn subscribe_status(&self) -> watch::Receiver<MirrorStatus> {
        self.mirror.subscribe_status()
    }

    pub async fn wait_synced(&self) -> MirrorStatus {
        self.mirror.wait_synced().await
    }

    /// Profile name, then the identity's display name or email, then "Anonymous".
    async fn author_name(&self, identity: &Identity) -> String {
        match self.users.get_user(&identity.user_id).await {
            Ok(Some(profile)) if !profile.name.is_empty() => profile.name,
            Ok(_) => identity.author_name(),
            Err(e) => {
                tracing::debug!(user_id = %identity.user_id, error = %e, "Profile lookup failed, using identity name");
                identity.author_name()
            }
        }
    }
}

impl std::fmt::Debug for ReviewLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReviewLog")
            .field("mirror", &self.mirror)
            .finish()
    }
}

/// Replace the record with the same id, or insert it keeping timestamp order.
fn upsert_local(list: &mut Vec<ReviewRecord>, record: &ReviewRecord) -> bool {
    if let Some(slot) = list.iter_mut().find(|r| r.id == record.id) {
        if *slot == *record {
            return false;
        }
        *slot = record.clone();
    } else {
        list.push(record.clone());
    }
    list.sort_by_key(|r| r.timestamp);
    true
}
