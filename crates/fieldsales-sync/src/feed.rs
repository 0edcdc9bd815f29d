//! Live view of the shared reported-item collection.
//!
//! The store has no push channel, so [`ReportedFeed`] polls
//! [`ReportedStore::list_reported`] and publishes each snapshot that differs
//! from the previous one. Consumers hand new snapshots to
//! [`SyncEngine::apply_reported_snapshot`](crate::SyncEngine::apply_reported_snapshot).

use std::sync::Arc;
use std::time::Duration;

use fieldsales_api::models::ReportedRecord;
use fieldsales_api::remote::ReportedStore;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

/// A background poller of the reported collection.
#[derive(Debug)]
pub struct ReportedFeed {
    receiver: watch::Receiver<Vec<ReportedRecord>>,
    handle: JoinHandle<()>,
}

impl ReportedFeed {
    /// Starts polling `store` every `period`, beginning immediately.
    ///
    /// Poll failures are logged and retried on the next tick.
    pub fn spawn<R>(store: Arc<R>, period: Duration) -> Self
    where
        R: ReportedStore + Send + Sync + 'static,
    {
        let (sender, receiver) = watch::channel(Vec::new());
        let period = period.max(Duration::from_millis(1));

        let handle = tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                if sender.is_closed() {
                    break;
                }
                match store.list_reported().await {
                    Ok(records) => {
                        let changed = sender.send_if_modified(|current| {
                            if *current == records {
                                return false;
                            }
                            *current = records;
                            true
                        });
                        if changed {
                            tracing::debug!("reported collection changed");
                        }
                    }
                    Err(e) => tracing::warn!(error = %e, "failed to poll reported items"),
                }
            }
        });

        Self { receiver, handle }
    }

    /// Waits for the next changed snapshot.
    ///
    /// Returns `None` once the feed has stopped.
    pub async fn changed(&mut self) -> Option<Vec<ReportedRecord>> {
        self.receiver.changed().await.ok()?;
        Some(self.receiver.borrow_and_update().clone())
    }

    /// Returns the most recent snapshot (empty before the first poll).
    pub fn latest(&self) -> Vec<ReportedRecord> {
        self.receiver.borrow().clone()
    }

    /// Stops polling.
    pub fn stop(&self) {
        self.handle.abort();
    }
}

impl Drop for ReportedFeed {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use fieldsales_api::error::{ApiError, Result as RemoteResult};
    use fieldsales_api::models::{AddressRecord, ContactRecord, ReportedItem, SavedItem};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    #[derive(Default)]
    struct PolledStore {
        records: Mutex<Vec<ReportedRecord>>,
        polls: AtomicUsize,
        fail_first: bool,
    }

    impl PolledStore {
        fn push(&self, id: &str) {
            let item = SavedItem::manual(id, AddressRecord::new(id, "Town", "", "", ""));
            self.records.lock().unwrap().push(ReportedRecord {
                id: id.to_string(),
                item: ReportedItem::from_saved(
                    &item,
                    ContactRecord::default(),
                    NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                ),
            });
        }
    }

    impl ReportedStore for PolledStore {
        async fn add_reported(&self, _item: &ReportedItem) -> RemoteResult<String> {
            unreachable!("feed only lists")
        }

        async fn update_reported(&self, _id: &str, _item: &ReportedItem) -> RemoteResult<()> {
            unreachable!("feed only lists")
        }

        async fn find_reported(
            &self,
            _field: &str,
            _value: &str,
            _limit: usize,
        ) -> RemoteResult<Vec<ReportedRecord>> {
            unreachable!("feed only lists")
        }

        async fn list_reported(&self) -> RemoteResult<Vec<ReportedRecord>> {
            let poll = self.polls.fetch_add(1, Ordering::SeqCst);
            if self.fail_first && poll == 0 {
                return Err(ApiError::Network {
                    message: "offline".to_string(),
                }
                .into());
            }
            Ok(self.records.lock().unwrap().clone())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_publishes_changes() {
        let store = Arc::new(PolledStore::default());
        store.push("r1");
        let mut feed = ReportedFeed::spawn(Arc::clone(&store), Duration::from_secs(10));

        let first = feed.changed().await.unwrap();
        assert_eq!(first.len(), 1);

        store.push("r2");
        let second = feed.changed().await.unwrap();
        assert_eq!(second.len(), 2);
        assert_eq!(feed.latest(), second);
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_skips_unchanged_snapshots() {
        let store = Arc::new(PolledStore::default());
        store.push("r1");
        let mut feed = ReportedFeed::spawn(Arc::clone(&store), Duration::from_secs(10));
        feed.changed().await.unwrap();

        let waited = tokio::time::timeout(Duration::from_secs(60), feed.changed()).await;

        assert!(waited.is_err());
        assert!(store.polls.load(Ordering::SeqCst) >= 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_feed_survives_poll_failure() {
        let store = Arc::new(PolledStore {
            fail_first: true,
            ..PolledStore::default()
        });
        store.push("r1");
        let mut feed = ReportedFeed::spawn(Arc::clone(&store), Duration::from_secs(10));

        let snapshot = feed.changed().await.unwrap();

        assert_eq!(snapshot.len(), 1);
        assert!(store.polls.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stopped_feed_ends_stream() {
        let store = Arc::new(PolledStore::default());
        let mut feed = ReportedFeed::spawn(store, Duration::from_secs(10));

        feed.stop();

        assert!(feed.changed().await.is_none());
        assert!(feed.latest().is_empty());
    }
}
