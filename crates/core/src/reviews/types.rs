//! Review records.

use serde::{Deserialize, Serialize};

/// A review of one catalog item by one author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewRecord {
    /// Generated document id.
    pub id: String,
    /// Reviewed catalog item.
    pub item_id: String,
    /// Author user id.
    pub user_id: String,
    /// Author display name at submission time.
    pub user_name: String,
    /// Rating, 1 to 5 by convention (not enforced).
    pub rating: i32,
    pub comment: String,
    /// Creation or last update time, milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// A review that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub item_id: String,
    pub user_id: String,
    pub user_name: String,
    pub rating: i32,
    pub comment: String,
    pub timestamp: i64,
}

impl NewReview {
    /// Attach the id assigned by the collection.
    pub fn with_id(self, id: impl Into<String>) -> ReviewRecord {
        ReviewRecord {
            id: id.into(),
            item_id: self.item_id,
            user_id: self.user_id,
            user_name: self.user_name,
            rating: self.rating,
            comment: self.comment,
            timestamp: self.timestamp,
        }
    }
}

/// Fields rewritten when an author edits their review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewPatch {
    pub comment: String,
    pub rating: i32,
    pub timestamp: i64,
}

impl ReviewRecord {
    pub(crate) fn apply(&mut self, patch: &ReviewPatch) {
        self.comment.clone_from(&patch.comment);
        self.rating = patch.rating;
        self.timestamp = patch.timestamp;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_review() -> NewReview {
        NewReview {
            item_id: "pixel".into(),
            user_id: "u1".into(),
            user_name: "Ada".into(),
            rating: 4,
            comment: "Solid".into(),
            timestamp: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_with_id_keeps_fields() {
        let record = new_review().with_id("r1");
        assert_eq!(record.id, "r1");
        assert_eq!(record.item_id, "pixel");
        assert_eq!(record.user_name, "Ada");
        assert_eq!(record.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_apply_patch() {
        let mut record = new_review().with_id("r1");
        record.apply(&ReviewPatch {
            comment: "Battery got worse".into(),
            rating: 2,
            timestamp: 1_700_000_100_000,
        });
        assert_eq!(record.comment, "Battery got worse");
        assert_eq!(record.rating, 2);
        assert_eq!(record.timestamp, 1_700_000_100_000);
        assert_eq!(record.user_id, "u1");
    }
}
