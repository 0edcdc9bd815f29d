//! Optimistic sync engine for a user's saved locations.
//!
//! Every change to the saved-item collection is applied locally first, then
//! the whole user record is synchronized to the remote store; if that fails
//! the local change is rolled back exactly. Alongside the engine this crate
//! provides duplicate detection by canonical address, merging with the shared
//! reported-item collection, device storage with an offline copy of the
//! user's record, preferences, and follow-up reminders.

pub mod duplicate;
pub mod engine;
pub mod feed;
pub mod format;
pub mod notify;
pub mod observer;
pub mod prefs;
pub mod session;
pub mod storage;
pub mod trackable;

use chrono::{DateTime, Utc};
use fieldsales_api::models::UserRecord;
use serde::{Deserialize, Serialize};

pub use engine::{DeletionHook, ErrorKind, Feedback, Receipt, SyncEngine, SyncError};
pub use feed::ReportedFeed;
pub use notify::{NotificationGenerator, Reminder, TriggerProcess};
pub use observer::{Subscribers, Subscription};
pub use prefs::{MergePrefs, NotificationPrefs, Preference, PrefsStore};
pub use session::{AuthSession, UserSession};
pub use storage::{FileStorage, LocalStorage, MemoryStorage, StorageError};
pub use trackable::{MergePrecedence, Trackable};

/// Storage key of the offline copy.
pub const OFFLINE_CACHE_KEY: &str = "offline_cache";

/// Offline copy of the signed-in user's record, for reads without a connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OfflineCache {
    /// The user's record as last loaded or synchronized.
    pub user: UserRecord,

    /// UTC timestamp of the last successful load or synchronize.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<DateTime<Utc>>,
}

impl OfflineCache {
    /// Loads the offline copy, or `None` if there is none.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored copy cannot be read or decoded.
    pub fn load(storage: &impl LocalStorage) -> Result<Option<Self>, StorageError> {
        storage
            .get_item(OFFLINE_CACHE_KEY)?
            .map(serde_json::from_value)
            .transpose()
            .map_err(StorageError::from)
    }

    /// Writes the offline copy.
    ///
    /// # Errors
    ///
    /// Returns an error if the copy cannot be encoded or written.
    pub fn store(&self, storage: &impl LocalStorage) -> Result<(), StorageError> {
        storage.set_item(OFFLINE_CACHE_KEY, &serde_json::to_value(self)?)
    }
}
