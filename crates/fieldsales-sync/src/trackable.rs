//! The item contract the sync engine is generic over.

use chrono::NaiveDate;
use fieldsales_api::models::{ContactRecord, Locatable, ReportedItem, SaveState, SavedItem};
use serde::{Deserialize, Serialize};

/// Which side wins when a saved item and its reported counterpart disagree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergePrecedence {
    /// Fields present on the reported item overwrite the saved item's.
    #[default]
    PreferReported,
    /// Saved fields are kept; reported values only fill blanks.
    PreferSaved,
}

/// An item that can be tracked by the [`SyncEngine`](crate::SyncEngine).
pub trait Trackable: Locatable + Clone + PartialEq {
    /// Stable identifier within the owning collection.
    fn id(&self) -> &str;

    /// Human-readable name used in messages.
    fn label(&self) -> &str;

    fn address_mut(&mut self) -> &mut fieldsales_api::models::AddressRecord;

    fn save_state(&self) -> SaveState;

    fn set_save_state(&mut self, state: SaveState);

    fn date_saved(&self) -> Option<NaiveDate>;

    fn set_date_saved(&mut self, date: NaiveDate);

    fn set_date_updated(&mut self, date: NaiveDate);

    fn is_reported(&self) -> bool;

    fn set_reported(&mut self, reported: bool);

    /// Returns false when name and address must not change after creation.
    fn identity_editable(&self) -> bool;

    /// Returns true if `other` has the same name and address.
    fn same_identity(&self, other: &Self) -> bool;

    /// Copies the informational fields of a report into this item.
    fn absorb_report(&mut self, report: &ReportedItem, precedence: MergePrecedence);

    /// Builds the report filed for this item.
    fn to_report(&self, reported_by: ContactRecord, date: NaiveDate) -> ReportedItem;
}

fn merge_text(target: &mut String, incoming: &str, precedence: MergePrecedence) {
    if incoming.is_empty() {
        return;
    }
    if precedence == MergePrecedence::PreferReported || target.is_empty() {
        *target = incoming.to_string();
    }
}

fn merge_contact(target: &mut ContactRecord, incoming: &ContactRecord, precedence: MergePrecedence) {
    if incoming.is_empty() {
        return;
    }
    if precedence == MergePrecedence::PreferReported || target.is_empty() {
        *target = incoming.clone();
    }
}

impl Trackable for SavedItem {
    fn id(&self) -> &str {
        &self.id
    }

    fn label(&self) -> &str {
        &self.name
    }

    fn address_mut(&mut self) -> &mut fieldsales_api::models::AddressRecord {
        &mut self.address
    }

    fn save_state(&self) -> SaveState {
        self.save_state
    }

    fn set_save_state(&mut self, state: SaveState) {
        self.save_state = state;
    }

    fn date_saved(&self) -> Option<NaiveDate> {
        self.date_saved
    }

    fn set_date_saved(&mut self, date: NaiveDate) {
        self.date_saved = Some(date);
    }

    fn set_date_updated(&mut self, date: NaiveDate) {
        self.date_updated = Some(date);
    }

    fn is_reported(&self) -> bool {
        self.is_reported
    }

    fn set_reported(&mut self, reported: bool) {
        self.is_reported = reported;
    }

    fn identity_editable(&self) -> bool {
        self.was_manually_saved
    }

    fn same_identity(&self, other: &Self) -> bool {
        self.name == other.name && self.address == other.address
    }

    fn absorb_report(&mut self, report: &ReportedItem, precedence: MergePrecedence) {
        // Name and address identify the location; only the informational fields merge.
        merge_contact(&mut self.owner, &report.owner, precedence);
        merge_contact(&mut self.contact_person, &report.contact_person, precedence);
        merge_text(&mut self.current_provider, &report.current_provider, precedence);
        merge_text(&mut self.notes, &report.notes, precedence);
    }

    fn to_report(&self, reported_by: ContactRecord, date: NaiveDate) -> ReportedItem {
        ReportedItem::from_saved(self, reported_by, date)
    }
}
