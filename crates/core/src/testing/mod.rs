//! Testing utilities and mock implementations.
//!
//! `MockStore` implements every document store trait in memory, so the
//! catalog store, favorites set, review log and profile service can be
//! exercised without SQLite.
//!
//! # Example
//!
//! ```rust,ignore
//! use phonelist_core::testing::{fixtures, MockStore};
//!
//! let store = Arc::new(MockStore::new());
//! store.set_catalog(vec![fixtures::catalog_item("pixel", "Pixel 8")]);
//! store.set_user(fixtures::profile("u1"));
//! ```

mod mock_store;

pub use mock_store::MockStore;

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::auth::Identity;
    use crate::catalog::CatalogItem;
    use crate::profile::UserProfile;
    use crate::reviews::{NewReview, ReviewRecord};

    /// Create a catalog item whose descriptors all parse.
    pub fn catalog_item(id: &str, name: &str) -> CatalogItem {
        CatalogItem {
            id: id.to_string(),
            name: name.to_string(),
            images: vec![format!("https://img.example.com/{}.png", id)],
            date: "Released, 2023/05".to_string(),
            memory: vec!["8/128".to_string()],
            soc: "Snapdragon 8 Gen 2".to_string(),
            battery: 4000,
            charge: vec!["25W wired".to_string()],
            display: vec!["OLED".to_string(), "6.1 inches".to_string()],
            front_camera: "12 MP".to_string(),
            main_camera: vec!["50 MP, f/1.8".to_string()],
            stock_os: "Android 14".to_string(),
        }
    }

    /// Create a catalog item with every filterable descriptor spelled out.
    #[allow(clippy::too_many_arguments)]
    pub fn phone(
        id: &str,
        name: &str,
        date: &str,
        memory: &[&str],
        battery: u32,
        charge: &str,
        display: &str,
        camera: &str,
        os: &str,
    ) -> CatalogItem {
        CatalogItem {
            date: date.to_string(),
            memory: memory.iter().map(|m| m.to_string()).collect(),
            battery,
            charge: vec![charge.to_string()],
            display: vec!["OLED".to_string(), display.to_string()],
            main_camera: vec![camera.to_string()],
            stock_os: os.to_string(),
            ..catalog_item(id, name)
        }
    }

    /// Galaxy (2024, 12 GB, 200 MP, Android 14), Pixel (2023, 8 GB, 50 MP,
    /// Android 14) and iPhone (2023, 6 GB, 48 MP, iOS 17), in that order.
    pub fn sample_phones() -> Vec<CatalogItem> {
        vec![
            phone(
                "galaxy",
                "Galaxy S24 Ultra",
                "Released, 2024/01",
                &["12/256"],
                5000,
                "45W wired",
                "6.8 inches",
                "200 MP",
                "Android 14",
            ),
            phone(
                "pixel",
                "Pixel 8",
                "Released, 2023/10",
                &["8/128"],
                4575,
                "27W wired",
                "6.2 inches",
                "50 MP",
                "Android 14",
            ),
            phone(
                "iphone",
                "iPhone 15",
                "Released, 2023/09",
                &["6/128"],
                3349,
                "20W wired",
                "6.1 inches",
                "48 MP",
                "iOS 17",
            ),
        ]
    }

    /// Identity with a display name and email derived from the user id.
    pub fn identity(user_id: &str) -> Identity {
        Identity {
            user_id: user_id.to_string(),
            display_name: Some(format!("User {}", user_id)),
            email: Some(format!("{}@example.com", user_id)),
        }
    }

    /// User document with no favorites.
    pub fn profile(user_id: &str) -> UserProfile {
        UserProfile {
            user_id: user_id.to_string(),
            name: format!("User {}", user_id),
            email: format!("{}@example.com", user_id),
            registration_date: "2024-01-01T00:00:00+00:00".to_string(),
            ..Default::default()
        }
    }

    /// Review not yet stored.
    pub fn new_review(item_id: &str, user_id: &str, timestamp: i64) -> NewReview {
        NewReview {
            item_id: item_id.to_string(),
            user_id: user_id.to_string(),
            user_name: format!("User {}", user_id),
            rating: 4,
            comment: format!("Review of {} by {}", item_id, user_id),
            timestamp,
        }
    }

    /// Stored review.
    pub fn review(id: &str, item_id: &str, user_id: &str, timestamp: i64) -> ReviewRecord {
        new_review(item_id, user_id, timestamp).with_id(id)
    }
}
