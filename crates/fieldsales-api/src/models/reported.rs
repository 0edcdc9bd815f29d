use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{AddressRecord, ContactRecord, Locatable, SavedItem};

/// A location reported by any user, visible to everyone.
///
/// There is at most one reported item per canonical address; reporting the
/// same address again overwrites the shared fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportedItem {
    pub name: String,

    #[serde(default)]
    pub address: AddressRecord,

    #[serde(default)]
    pub owner: ContactRecord,

    #[serde(default)]
    pub contact_person: ContactRecord,

    #[serde(default)]
    pub current_provider: String,

    #[serde(default)]
    pub notes: String,

    #[serde(default)]
    pub reported_by: ContactRecord,

    pub date_reported: NaiveDate,
}

impl ReportedItem {
    /// Builds a report from the informational fields of a saved item.
    pub fn from_saved(item: &SavedItem, reported_by: ContactRecord, date: NaiveDate) -> Self {
        Self {
            name: item.name.clone(),
            address: item.address.clone(),
            owner: item.owner.clone(),
            contact_person: item.contact_person.clone(),
            current_provider: item.current_provider.clone(),
            notes: item.notes.clone(),
            reported_by,
            date_reported: date,
        }
    }
}

impl Locatable for ReportedItem {
    fn address(&self) -> &AddressRecord {
        &self.address
    }
}

/// A reported item together with its document id in the shared collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedRecord {
    pub id: String,

    #[serde(flatten)]
    pub item: ReportedItem,
}

impl Locatable for ReportedRecord {
    fn address(&self) -> &AddressRecord {
        &self.item.address
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_saved_copies_informational_fields() {
        let mut item = SavedItem::manual("Cafe A", AddressRecord::new("1 Main St", "Town", "", "", ""));
        item.notes = "Open late".to_string();
        item.current_provider = "Acme".to_string();
        item.is_reported = false;

        let date = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();
        let reported = ReportedItem::from_saved(&item, ContactRecord::named("Rep"), date);

        assert_eq!(reported.name, "Cafe A");
        assert_eq!(reported.notes, "Open late");
        assert_eq!(reported.current_provider, "Acme");
        assert_eq!(reported.reported_by.name.as_deref(), Some("Rep"));
        assert_eq!(reported.date_reported, date);
    }

    #[test]
    fn test_reported_record_flattens_document() {
        let json = r#"{
            "id": "doc-1",
            "name": "Cafe A",
            "address": {"street": "1 Main St", "postalCode": "12345"},
            "reportedBy": {"name": "Rep"},
            "dateReported": "2026-05-01"
        }"#;
        let record: ReportedRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "doc-1");
        assert_eq!(record.item.name, "Cafe A");
        assert_eq!(record.address().postal_code, "12345");
    }
}
