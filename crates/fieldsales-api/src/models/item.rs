use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{AddressRecord, ContactRecord, Locatable};

/// Where a saved item is in its lifecycle.
///
/// The only transitions are `Unsaved -> Saved` (on add) and the symmetric
/// toggle between `Saved` and `Starred`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveState {
    #[default]
    Unsaved,
    Saved,
    Starred,
}

impl SaveState {
    /// Returns the state a star toggle leads to, or `None` for `Unsaved`.
    pub fn toggled(self) -> Option<SaveState> {
        match self {
            SaveState::Saved => Some(SaveState::Starred),
            SaveState::Starred => Some(SaveState::Saved),
            SaveState::Unsaved => None,
        }
    }

    /// Returns the lowercase name used in documents.
    pub fn as_str(self) -> &'static str {
        match self {
            SaveState::Unsaved => "unsaved",
            SaveState::Saved => "saved",
            SaveState::Starred => "starred",
        }
    }
}

impl fmt::Display for SaveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attempt to change the name or address of an item picked from map search.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("name and address of map locations cannot be changed")]
pub struct ImmutableFieldError;

/// A location saved by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedItem {
    /// Stable identifier of this item within the user's collection.
    pub id: String,

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
    pub save_state: SaveState,

    /// False for items picked from map search; their name and address are fixed.
    #[serde(default)]
    pub was_manually_saved: bool,

    #[serde(default)]
    pub is_reported: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_saved: Option<NaiveDate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_updated: Option<NaiveDate>,
}

impl SavedItem {
    fn blank(name: String, address: AddressRecord, was_manually_saved: bool) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            address,
            owner: ContactRecord::default(),
            contact_person: ContactRecord::default(),
            current_provider: String::new(),
            notes: String::new(),
            save_state: SaveState::Unsaved,
            was_manually_saved,
            is_reported: false,
            date_saved: None,
            date_updated: None,
        }
    }

    /// Creates an item entered by hand. Its name and address stay editable.
    pub fn manual(name: impl Into<String>, address: AddressRecord) -> Self {
        Self::blank(name.into(), address, true)
    }

    /// Creates an item from a map-search pick. Its name and address are fixed.
    pub fn from_search_result(name: impl Into<String>, address: AddressRecord) -> Self {
        Self::blank(name.into(), address, false)
    }

    /// Changes the name of a manually saved item.
    pub fn rename(&mut self, name: impl Into<String>) -> Result<(), ImmutableFieldError> {
        if !self.was_manually_saved {
            return Err(ImmutableFieldError);
        }
        self.name = name.into();
        Ok(())
    }

    /// Changes the address of a manually saved item.
    pub fn relocate(&mut self, address: AddressRecord) -> Result<(), ImmutableFieldError> {
        if !self.was_manually_saved {
            return Err(ImmutableFieldError);
        }
        self.address = address;
        Ok(())
    }

    /// Returns true if the item is starred.
    pub fn is_starred(&self) -> bool {
        self.save_state == SaveState::Starred
    }
}

impl Locatable for SavedItem {
    fn address(&self) -> &AddressRecord {
        &self.address
    }
}
