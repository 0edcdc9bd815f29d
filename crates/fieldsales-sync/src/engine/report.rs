//! Reporting saved items to the shared reported-item collection.
//!
//! The shared collection holds at most one record per canonical address. A
//! report for an address that is already reported overwrites that record
//! (last reporter wins) instead of adding a second one.

use fieldsales_api::error::Result as RemoteResult;
use fieldsales_api::models::{Locatable, ReportedItem, ReportedRecord};
use fieldsales_api::remote::{ReportedStore, FULL_ADDRESS_FIELD, POSTAL_CODE_FIELD};

use super::{Receipt, Result, SyncEngine, SyncError, Undo};
use crate::duplicate::{exists, same_address};
use crate::session::AuthSession;
use crate::trackable::Trackable;

impl<T: Trackable, R: ReportedStore> SyncEngine<T, R> {
    // ==================== Reporting ====================

    /// Reports a saved item on behalf of the signed-in user.
    ///
    /// The report carries the item's informational fields, the user's contact
    /// details and today's date. If an item is already reported at the same
    /// address its record is updated, otherwise a new record is added. The
    /// local item is then flagged as reported and synchronized, and update
    /// subscribers are notified.
    ///
    /// The remote report itself is not withdrawn if flagging the local item
    /// fails to synchronize; only the local flag is rolled back.
    ///
    /// # Errors
    ///
    /// - [`SyncError::NotAuthenticated`] if no user is signed in
    /// - [`SyncError::ItemDoesNotExist`] if no saved item has `item_id`
    /// - [`SyncError::RemoteSyncFailure`] if the report or the sync fails
    pub async fn report_item<S: AuthSession<T>>(
        &mut self,
        session: &mut S,
        item_id: &str,
    ) -> Result<Receipt<T>> {
        if !session.is_authenticated() {
            return Err(SyncError::NotAuthenticated);
        }
        let reporter = session.contact().cloned().unwrap_or_default();
        let items = session.saved_items().ok_or(SyncError::NotAuthenticated)?;
        let index = items
            .iter()
            .position(|item| item.id() == item_id)
            .ok_or(SyncError::ItemDoesNotExist)?;
        let name = items[index].label().to_string();
        let report = items[index].to_report(reporter, self.today());

        let existing = self
            .find_existing_report(&report)
            .await
            .map_err(SyncError::RemoteSyncFailure)?;
        let updated = match existing {
            Some(id) => {
                tracing::debug!(id = %id, "address already reported, updating record");
                match self.reported_store.update_reported(&id, &report).await {
                    Ok(()) => {
                        self.upsert_reported(id, report.clone());
                        true
                    }
                    Err(e) if e.is_not_found() => {
                        // Deleted remotely since the snapshot was taken
                        tracing::debug!(id = %id, "reported record is gone, adding a new one");
                        self.reported.retain(|record| record.id != id);
                        false
                    }
                    Err(e) => return Err(SyncError::RemoteSyncFailure(e)),
                }
            }
            None => false,
        };
        let message = if updated {
            format!("Updated report for \"{name}\"")
        } else {
            let id = self
                .reported_store
                .add_reported(&report)
                .await
                .map_err(SyncError::RemoteSyncFailure)?;
            tracing::debug!(id = %id, "added reported record");
            self.upsert_reported(id, report);
            format!("Reported \"{name}\"")
        };

        let reported = self
            .commit(session, move |items| {
                let item = &mut items[index];
                let previous = item.is_reported();
                item.set_reported(true);
                Ok((Undo::SetReported(index, previous), item.clone()))
            })
            .await?;

        tracing::info!(id = reported.id(), "item reported");
        self.subscribers.notify(&reported);
        Ok(Receipt {
            message,
            item: reported,
        })
    }

    /// Recomputes every saved item's reported flag from the reported snapshot.
    ///
    /// An item is flagged iff an item is reported at its address. The user's
    /// collection is synchronized once afterwards. Returns the number of
    /// flagged items.
    ///
    /// # Errors
    ///
    /// - [`SyncError::NotAuthenticated`] if no user is signed in
    /// - [`SyncError::RemoteSyncFailure`] if the sync fails (all flags are restored)
    pub async fn refresh_local_reported_flags<S: AuthSession<T>>(
        &mut self,
        session: &mut S,
    ) -> Result<usize> {
        let items = session.saved_items().ok_or(SyncError::NotAuthenticated)?;
        let flags: Vec<bool> = items
            .iter()
            .map(|item| exists(item, &self.reported))
            .collect();
        let flagged = flags.iter().filter(|flag| **flag).count();

        self.commit(session, move |items| {
            let previous = items.iter().map(|item| item.is_reported()).collect();
            for (item, flag) in items.iter_mut().zip(flags) {
                item.set_reported(flag);
            }
            Ok((Undo::ReportedFlags(previous), ()))
        })
        .await?;

        tracing::info!(flagged, "reported flags refreshed");
        Ok(flagged)
    }

    /// Fetches the whole reported collection and makes it the local snapshot.
    ///
    /// Returns the number of records loaded.
    pub async fn load_reported(&mut self) -> RemoteResult<usize> {
        let records = self.reported_store.list_reported().await?;
        let count = records.len();
        self.apply_reported_snapshot(records);
        Ok(count)
    }

    /// Replaces the local snapshot of the reported collection.
    pub fn apply_reported_snapshot(&mut self, records: Vec<ReportedRecord>) {
        tracing::debug!(records = records.len(), "applying reported snapshot");
        self.reported = records;
    }

    /// Returns the local snapshot of the reported collection.
    pub fn reported(&self) -> &[ReportedRecord] {
        &self.reported
    }

    /// Returns the store reports are sent to.
    pub fn reported_store(&self) -> &R {
        &self.reported_store
    }

    /// Finds the id of the record already reported at the report's address.
    ///
    /// The local snapshot is checked first; the remote collection is queried
    /// only when the snapshot has no match.
    async fn find_existing_report(
        &self,
        report: &ReportedItem,
    ) -> RemoteResult<Option<String>> {
        let address = report.address();
        if let Some(record) = self
            .reported
            .iter()
            .find(|record| same_address(record.address(), address))
        {
            return Ok(Some(record.id.clone()));
        }

        let (field, value) = if address.has_postal_code() {
            (POSTAL_CODE_FIELD, address.postal_code.trim().to_string())
        } else {
            (FULL_ADDRESS_FIELD, address.display())
        };
        let found = self.reported_store.find_reported(field, &value, 1).await?;
        Ok(found
            .into_iter()
            .find(|record| same_address(record.address(), address))
            .map(|record| record.id))
    }

    fn upsert_reported(&mut self, id: String, item: ReportedItem) {
        match self.reported.iter_mut().find(|record| record.id == id) {
            Some(record) => record.item = item,
            None => self.reported.push(ReportedRecord { id, item }),
        }
    }
}
