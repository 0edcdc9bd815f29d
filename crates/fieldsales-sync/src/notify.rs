//! Follow-up reminders for starred items.
//!
//! [`NotificationGenerator`] turns stale starred items into [`Reminder`]s and
//! keeps the pending ones in local storage. [`TriggerProcess`] runs a callback
//! on a fixed period, typically one that calls
//! [`NotificationGenerator::generate`].

use std::time::Duration;

use chrono::NaiveDate;
use fieldsales_api::models::SavedItem;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::engine::DeletionHook;
use crate::prefs::NotificationPrefs;
use crate::storage::{LocalStorage, Result};

/// Storage key of the pending reminders.
pub const NOTIFICATIONS_KEY: &str = "notifications";

/// A pending reminder to follow up on a saved item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub item_id: String,
    pub item_name: String,
    pub message: String,
    pub created: NaiveDate,
}

/// Generates and stores reminders.
#[derive(Debug, Clone)]
pub struct NotificationGenerator<L> {
    storage: L,
}

impl<L: LocalStorage> NotificationGenerator<L> {
    pub fn new(storage: L) -> Self {
        Self { storage }
    }

    /// Returns the pending reminders, oldest first.
    pub fn pending(&self) -> Result<Vec<Reminder>> {
        match self.storage.get_item(NOTIFICATIONS_KEY)? {
            Some(value) => Ok(serde_json::from_value(value)?),
            None => Ok(Vec::new()),
        }
    }

    fn write(&self, reminders: &[Reminder]) -> Result<()> {
        self.storage
            .set_item(NOTIFICATIONS_KEY, &serde_json::to_value(reminders)?)
    }

    /// Creates reminders for starred items not updated in the last
    /// `remind_after_days` days, and returns the new ones.
    ///
    /// An item gets at most one pending reminder. Items that were never dated
    /// are skipped. Nothing is generated when reminders are disabled.
    pub fn generate(
        &self,
        items: &[SavedItem],
        today: NaiveDate,
        prefs: &NotificationPrefs,
    ) -> Result<Vec<Reminder>> {
        if !prefs.enabled {
            return Ok(Vec::new());
        }

        let mut pending = self.pending()?;
        let threshold = i64::from(prefs.remind_after_days);
        let mut created = Vec::new();

        for item in items.iter().filter(|item| item.is_starred()) {
            let Some(last_touched) = item.date_updated.or(item.date_saved) else {
                continue;
            };
            let idle_days = (today - last_touched).num_days();
            if idle_days < threshold || pending.iter().any(|r| r.item_id == item.id) {
                continue;
            }
            let reminder = Reminder {
                id: uuid::Uuid::new_v4().to_string(),
                item_id: item.id.clone(),
                item_name: item.name.clone(),
                message: format!("Follow up with \"{}\": no updates in {idle_days} days", item.name),
                created: today,
            };
            pending.push(reminder.clone());
            created.push(reminder);
        }

        if !created.is_empty() {
            self.write(&pending)?;
            tracing::info!(count = created.len(), "generated reminders");
        }
        Ok(created)
    }

    /// Removes a reminder. Returns false if no reminder has that id.
    pub fn dismiss(&self, id: &str) -> Result<bool> {
        let mut pending = self.pending()?;
        let before = pending.len();
        pending.retain(|r| r.id != id);
        if pending.len() == before {
            return Ok(false);
        }
        self.write(&pending)?;
        Ok(true)
    }

    /// Removes every reminder for an item and returns how many were removed.
    pub fn remove_for_item(&self, item_id: &str) -> Result<usize> {
        let mut pending = self.pending()?;
        let before = pending.len();
        pending.retain(|r| r.item_id != item_id);
        let removed = before - pending.len();
        if removed > 0 {
            self.write(&pending)?;
        }
        Ok(removed)
    }
}

impl<L: LocalStorage> DeletionHook<SavedItem> for NotificationGenerator<L> {
    fn on_item_deleted(&self, item: &SavedItem) {
        match self.remove_for_item(&item.id) {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(item = %item.id, removed, "dropped reminders for deleted item"),
            Err(e) => tracing::warn!(item = %item.id, error = %e, "failed to drop reminders for deleted item"),
        }
    }
}

/// Runs a callback on a fixed period until stopped.
///
/// The first run happens one period after start. Runs missed while the
/// callback was busy are skipped, not replayed.
#[derive(Debug)]
pub struct TriggerProcess {
    handle: JoinHandle<()>,
}

impl TriggerProcess {
    /// Starts the process on the current tokio runtime.
    pub fn start<F>(period: Duration, mut callback: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let period = period.max(Duration::from_millis(1));
        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                callback();
            }
        });
        Self { handle }
    }

    /// Stops the process. Safe to call more than once.
    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for TriggerProcess {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
