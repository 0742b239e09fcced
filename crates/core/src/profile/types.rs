//! User profile document.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::Identity;

/// Per-user document: profile fields plus the favorites set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UserProfile {
    pub user_id: String,
    pub name: String,
    pub birth_date: String,
    pub description: String,
    pub gender: String,
    pub email: String,
    /// RFC 3339 registration time.
    pub registration_date: String,
    /// Favorite catalog item ids.
    pub favorites: BTreeSet<String>,
}

impl UserProfile {
    /// Fresh document for a newly registered identity.
    pub fn new_for(identity: &Identity, registered_at: DateTime<Utc>) -> Self {
        Self {
            user_id: identity.user_id.clone(),
            name: identity.display_name.clone().unwrap_or_default(),
            email: identity.email.clone().unwrap_or_default(),
            registration_date: registered_at.to_rfc3339(),
            ..Default::default()
        }
    }

    pub fn favorites_count(&self) -> usize {
        self.favorites.len()
    }
}

/// Direct field update of the editable profile fields. `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.birth_date.is_none()
            && self.description.is_none()
            && self.gender.is_none()
    }

    pub(crate) fn apply(&self, profile: &mut UserProfile) {
        if let Some(name) = &self.name {
            profile.name.clone_from(name);
        }
        if let Some(birth_date) = &self.birth_date {
            profile.birth_date.clone_from(birth_date);
        }
        if let Some(description) = &self.description {
            profile.description.clone_from(description);
        }
        if let Some(gender) = &self.gender {
            profile.gender.clone_from(gender);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_profile_from_identity() {
        let identity = Identity {
            user_id: "u1".into(),
            display_name: None,
            email: Some("ada@example.com".into()),
        };
        let profile = UserProfile::new_for(&identity, Utc::now());
        assert_eq!(profile.user_id, "u1");
        assert_eq!(profile.email, "ada@example.com");
        assert!(profile.name.is_empty());
        assert!(profile.favorites.is_empty());
        assert!(DateTime::parse_from_rfc3339(&profile.registration_date).is_ok());
    }

    #[test]
    fn test_partial_update() {
        let mut profile = UserProfile {
            name: "Ada".into(),
            gender: "f".into(),
            ..Default::default()
        };
        let update = ProfileUpdate {
            description: Some("Likes small phones".into()),
            ..Default::default()
        };
        assert!(!update.is_empty());
        update.apply(&mut profile);
        assert_eq!(profile.name, "Ada");
        assert_eq!(profile.description, "Likes small phones");
    }

    #[test]
    fn test_update_deserializes_missing_fields_as_none() {
        let update: ProfileUpdate = serde_json::from_str(r#"{"gender": "n/a"}"#).unwrap();
        assert_eq!(update.gender.as_deref(), Some("n/a"));
        assert!(update.name.is_none());
    }
}
