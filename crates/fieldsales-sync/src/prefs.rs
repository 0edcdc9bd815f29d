//! User preferences kept in device storage.
//!
//! Each preference kind is a plain serde struct implementing [`Preference`];
//! [`PrefsStore`] loads and saves any of them under the kind's key. A kind
//! that was never saved loads as its `Default`.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::storage::{LocalStorage, Result};
use crate::trackable::MergePrecedence;

/// A kind of preference persisted under a fixed storage key.
pub trait Preference: Serialize + DeserializeOwned + Default {
    /// Storage key the preference is kept under.
    const KEY: &'static str;
}

/// Loads and saves preferences in local storage.
#[derive(Debug, Clone)]
pub struct PrefsStore<L> {
    storage: L,
}

impl<L: LocalStorage> PrefsStore<L> {
    pub fn new(storage: L) -> Self {
        Self { storage }
    }

    /// Loads a preference, or its default if it was never saved.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored value cannot be read or decoded.
    pub fn load<P: Preference>(&self) -> Result<P> {
        match self.storage.get_item(P::KEY)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(P::default()),
        }
    }

    /// Saves a preference, replacing the stored value.
    ///
    /// # Errors
    ///
    /// Returns an error if the value cannot be encoded or written.
    pub fn save<P: Preference>(&self, prefs: &P) -> Result<()> {
        tracing::debug!(key = P::KEY, "saving preferences");
        self.storage.set_item(P::KEY, &serde_json::to_value(prefs)?)
    }

    /// Removes a saved preference so it loads as the default again.
    pub fn reset<P: Preference>(&self) -> Result<()> {
        self.storage.remove_item(P::KEY)
    }

    pub fn storage(&self) -> &L {
        &self.storage
    }
}

/// Follow-up reminder settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NotificationPrefs {
    /// Whether reminders are generated at all.
    pub enabled: bool,

    /// Days a starred item may go without an update before a reminder is due.
    pub remind_after_days: u32,

    /// How often the trigger process checks for due reminders.
    pub check_interval_minutes: u32,
}

impl Default for NotificationPrefs {
    fn default() -> Self {
        Self {
            enabled: true,
            remind_after_days: 14,
            check_interval_minutes: 60,
        }
    }
}

impl NotificationPrefs {
    /// Returns the check interval, at least one minute.
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.check_interval_minutes.max(1)) * 60)
    }
}

impl Preference for NotificationPrefs {
    const KEY: &'static str = "notification_prefs";
}

/// How reported information is merged into saved items.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergePrefs {
    pub precedence: MergePrecedence,
}

impl Preference for MergePrefs {
    const KEY: &'static str = "merge_prefs";
}
