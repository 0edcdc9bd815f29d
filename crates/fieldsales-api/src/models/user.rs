use serde::{Deserialize, Serialize};

use super::{ContactRecord, SavedItem};

/// The per-user document: who the user is and what they saved.
///
/// Synchronizing a session writes this whole document in one call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub uid: String,

    #[serde(default)]
    pub contact: ContactRecord,

    #[serde(default)]
    pub saved_items: Vec<SavedItem>,
}

impl UserRecord {
    /// Creates an empty record for a user.
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            contact: ContactRecord::default(),
            saved_items: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_record_deserialize_without_items() {
        let json = r#"{"uid": "u-1", "contact": {"email": "rep@example.com"}}"#;
        let user: UserRecord = serde_json::from_str(json).unwrap();
        assert_eq!(user.uid, "u-1");
        assert!(user.saved_items.is_empty());
        assert_eq!(user.contact.email.as_deref(), Some("rep@example.com"));
    }
}
