//! Sync engine for a user's saved items.
//!
//! Every operation follows the same protocol:
//!
//! 1. check that a user is signed in and the target is valid
//! 2. mutate the in-memory collection
//! 3. synchronize the whole user record to the remote store
//! 4. on failure, undo the mutation exactly and report the remote error
//!
//! Steps 2 to 4 live in one place, [`SyncEngine::commit`]; each operation
//! only supplies its mutation and the matching [`Undo`].
//!
//! # Example
//!
//! ```no_run
//! use fieldsales_api::client::StoreClient;
//! use fieldsales_api::models::{AddressRecord, SavedItem};
//! use fieldsales_sync::{FileStorage, SyncEngine, UserSession};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = StoreClient::new("https://store.example.com", "token")?;
//!     let mut session = UserSession::new(client.clone(), FileStorage::new()?);
//!     session.sign_in("user-1").await?;
//!
//!     let mut engine = SyncEngine::new(client);
//!     let candidate = SavedItem::manual("Cafe A", AddressRecord::new("1 Main St", "Town", "", "", ""));
//!     let receipt = engine.add(&mut session, candidate).await?;
//!     println!("{}", receipt.message);
//!     Ok(())
//! }
//! ```

mod report;

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use fieldsales_api::error::Error as RemoteError;
use fieldsales_api::models::{Locatable, ReportedRecord, SaveState};
use fieldsales_api::remote::ReportedStore;

use crate::duplicate::{exists, position, same_address};
use crate::format::{normalize_address, Trim};
use crate::observer::{Subscribers, Subscription};
use crate::session::AuthSession;
use crate::trackable::{MergePrecedence, Trackable};

/// Errors returned by engine operations.
///
/// The `Display` text of each variant is written for end users and may be
/// shown verbatim.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// No user is signed in. Nothing was changed.
    #[error("You must be signed in to do that")]
    NotAuthenticated,

    /// An item already exists at the candidate's address. Nothing was changed.
    #[error("A saved location already exists at this address")]
    DuplicateExists,

    /// The target item is not in the collection. Nothing was changed.
    #[error("That location no longer exists")]
    ItemDoesNotExist,

    /// Star toggling was requested on an item that is not saved.
    #[error("Only saved locations can be starred")]
    InvalidTransition,

    /// An update tried to change the name or address of a map-search item.
    #[error("Name and address of map locations cannot be changed")]
    ImmutableField,

    /// The remote write failed. Any local change has been rolled back.
    #[error("Could not sync your changes: {0}")]
    RemoteSyncFailure(#[source] RemoteError),
}

/// Coarse classification of [`SyncError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotAuthenticated,
    DuplicateExists,
    ItemDoesNotExist,
    InvalidTransition,
    ImmutableField,
    RemoteSyncFailure,
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SyncError::NotAuthenticated => ErrorKind::NotAuthenticated,
            SyncError::DuplicateExists => ErrorKind::DuplicateExists,
            SyncError::ItemDoesNotExist => ErrorKind::ItemDoesNotExist,
            SyncError::InvalidTransition => ErrorKind::InvalidTransition,
            SyncError::ImmutableField => ErrorKind::ImmutableField,
            SyncError::RemoteSyncFailure(_) => ErrorKind::RemoteSyncFailure,
        }
    }
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, SyncError>;

/// Successful outcome of an engine operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Receipt<T> {
    /// Confirmation text for the user.
    pub message: String,
    /// The item as it now stands (or as it was, for a delete).
    pub item: T,
}

/// Success flag plus message, ready for a toast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Feedback {
    pub success: bool,
    pub message: String,
}

impl<T> From<&Result<Receipt<T>>> for Feedback {
    fn from(result: &Result<Receipt<T>>) -> Self {
        match result {
            Ok(receipt) => Feedback {
                success: true,
                message: receipt.message.clone(),
            },
            Err(e) => Feedback {
                success: false,
                message: e.to_string(),
            },
        }
    }
}

/// Called after an item has been deleted and the deletion synchronized.
pub trait DeletionHook<T> {
    fn on_item_deleted(&self, item: &T);
}

/// Inverse of a local mutation, applied when the remote write fails.
#[derive(Debug)]
enum Undo<T> {
    /// Remove the item appended at this index.
    Remove(usize),
    /// Put back the value that was replaced at this index.
    Restore(usize, T),
    /// Re-insert a removed item at its old index.
    Reinsert(usize, T),
    /// Restore the save state at this index.
    SetState(usize, SaveState),
    /// Restore the reported flag at this index.
    SetReported(usize, bool),
    /// Restore the reported flag of every item, in order.
    ReportedFlags(Vec<bool>),
}

impl<T: Trackable> Undo<T> {
    fn revert(self, items: &mut Vec<T>) {
        match self {
            Undo::Remove(index) => {
                if index < items.len() {
                    items.remove(index);
                }
            }
            Undo::Restore(index, previous) => {
                if let Some(slot) = items.get_mut(index) {
                    *slot = previous;
                }
            }
            Undo::Reinsert(index, removed) => {
                let index = index.min(items.len());
                items.insert(index, removed);
            }
            Undo::SetState(index, state) => {
                if let Some(item) = items.get_mut(index) {
                    item.set_save_state(state);
                }
            }
            Undo::SetReported(index, flag) => {
                if let Some(item) = items.get_mut(index) {
                    item.set_reported(flag);
                }
            }
            Undo::ReportedFlags(flags) => {
                for (item, flag) in items.iter_mut().zip(flags) {
                    item.set_reported(flag);
                }
            }
        }
    }
}

type Clock = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Tracks a user's saved items against the remote store.
///
/// The engine does not own the items; they belong to the session passed to
/// each operation. It does own the snapshot of the shared reported-item
/// collection, the update subscribers, and the deletion hook.
///
/// # Thread Safety
///
/// Operations take the session by `&mut`, so at most one write is in flight
/// per session. To share a session and engine between tasks, wrap them in
/// `Arc<tokio::sync::Mutex<_>>` and hold the lock for the whole operation.
pub struct SyncEngine<T, R> {
    reported_store: R,
    reported: Vec<ReportedRecord>,
    subscribers: Subscribers<T>,
    deletion_hook: Option<Arc<dyn DeletionHook<T> + Send + Sync>>,
    precedence: MergePrecedence,
    clock: Clock,
}

impl<T, R> std::fmt::Debug for SyncEngine<T, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("reported", &self.reported.len())
            .field("subscribers", &self.subscribers)
            .field("precedence", &self.precedence)
            .finish()
    }
}

impl<T: Trackable, R: ReportedStore> SyncEngine<T, R> {
    /// Creates an engine that reports through `reported_store`.
    pub fn new(reported_store: R) -> Self {
        Self {
            reported_store,
            reported: Vec::new(),
            subscribers: Subscribers::new(),
            deletion_hook: None,
            precedence: MergePrecedence::default(),
            clock: Arc::new(|| Local::now().date_naive()),
        }
    }

    /// Sets which side wins when merging a reported item into a saved one.
    pub fn with_precedence(mut self, precedence: MergePrecedence) -> Self {
        self.precedence = precedence;
        self
    }

    /// Registers the hook called after successful deletes.
    pub fn with_deletion_hook(mut self, hook: Arc<dyn DeletionHook<T> + Send + Sync>) -> Self {
        self.deletion_hook = Some(hook);
        self
    }

    /// Replaces the source of "today" (for tests and replays).
    pub fn with_clock<F>(mut self, clock: F) -> Self
    where
        F: Fn() -> NaiveDate + Send + Sync + 'static,
    {
        self.clock = Arc::new(clock);
        self
    }

    pub fn precedence(&self) -> MergePrecedence {
        self.precedence
    }

    /// Returns the update subscribers (shared handle).
    pub fn subscribers(&self) -> &Subscribers<T> {
        &self.subscribers
    }

    /// Subscribes to item updates (successful update and report).
    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    pub fn unsubscribe(&self, subscription: &Subscription) -> bool {
        self.subscribers.unsubscribe(subscription)
    }

    fn today(&self) -> NaiveDate {
        (self.clock)()
    }

    /// Applies a mutation locally, synchronizes, and undoes it if the sync fails.
    async fn commit<S, F, O>(&self, session: &mut S, mutate: F) -> Result<O>
    where
        S: AuthSession<T>,
        F: FnOnce(&mut Vec<T>) -> Result<(Undo<T>, O)>,
    {
        let items = session
            .saved_items_mut()
            .ok_or(SyncError::NotAuthenticated)?;
        let (undo, output) = mutate(items)?;

        tracing::debug!("local change applied, synchronizing");
        match session.synchronize().await {
            Ok(()) => Ok(output),
            Err(e) => {
                if let Some(items) = session.saved_items_mut() {
                    undo.revert(items);
                }
                tracing::warn!(error = %e, "synchronize failed, local change rolled back");
                Err(SyncError::RemoteSyncFailure(e))
            }
        }
    }

    /// Saves a new item.
    ///
    /// The candidate's address is normalized, its state becomes `Saved` and
    /// both dates become today. A candidate already flagged as reported takes
    /// the informational fields of the matching reported item, per the
    /// configured [`MergePrecedence`].
    ///
    /// # Errors
    ///
    /// - [`SyncError::NotAuthenticated`] if no user is signed in
    /// - [`SyncError::DuplicateExists`] if an item is already saved at the address
    /// - [`SyncError::RemoteSyncFailure`] if the sync fails (the item is removed again)
    pub async fn add<S: AuthSession<T>>(&mut self, session: &mut S, candidate: T) -> Result<Receipt<T>> {
        let items = session.saved_items().ok_or(SyncError::NotAuthenticated)?;
        let mut item = candidate;
        normalize_address(item.address_mut());
        if exists(&item, items) {
            return Err(SyncError::DuplicateExists);
        }

        let today = self.today();
        item.set_save_state(SaveState::Saved);
        item.set_date_saved(today);
        item.set_date_updated(today);
        if item.is_reported() {
            if let Some(record) = self
                .reported
                .iter()
                .find(|r| same_address(r.item.address(), item.address()))
            {
                item.absorb_report(&record.item, self.precedence);
            }
        }

        let added = self
            .commit(session, move |items| {
                items.push(item.clone());
                Ok((Undo::Remove(items.len() - 1), item))
            })
            .await?;

        tracing::info!(id = added.id(), "item saved");
        Ok(Receipt {
            message: format!("Saved \"{}\"", added.label()),
            item: added,
        })
    }

    /// Replaces `original` with `updated`.
    ///
    /// `original` is located by id; `updated` must keep that id. The updated
    /// address is normalized, `date_updated` becomes today and `date_saved` is
    /// filled in if missing. The save state and reported flag are kept from
    /// the stored item; only [`toggle_star`](Self::toggle_star),
    /// [`report_item`](Self::report_item) and
    /// [`refresh_local_reported_flags`](Self::refresh_local_reported_flags)
    /// change them. Subscribers are notified on success.
    ///
    /// # Errors
    ///
    /// - [`SyncError::NotAuthenticated`] if no user is signed in
    /// - [`SyncError::ItemDoesNotExist`] if `original` is not in the collection
    /// - [`SyncError::ImmutableField`] if a map-search item's name or address changed
    /// - [`SyncError::DuplicateExists`] if the new address belongs to another item
    /// - [`SyncError::RemoteSyncFailure`] if the sync fails (`original` is restored)
    pub async fn update<S: AuthSession<T>>(
        &mut self,
        session: &mut S,
        original: &T,
        updated: T,
    ) -> Result<Receipt<T>> {
        let items = session.saved_items().ok_or(SyncError::NotAuthenticated)?;
        if updated.id() != original.id() {
            return Err(SyncError::ItemDoesNotExist);
        }
        let index = items
            .iter()
            .position(|item| item.id() == original.id())
            .ok_or(SyncError::ItemDoesNotExist)?;

        let stored = &items[index];
        if !stored.identity_editable() && !stored.same_identity(&updated) {
            return Err(SyncError::ImmutableField);
        }
        let mut item = updated;
        if item.identity_editable() {
            normalize_address(item.address_mut());
        }
        let moved = !same_address(stored.address(), item.address());
        if moved
            && items
                .iter()
                .enumerate()
                .any(|(i, other)| i != index && same_address(other.address(), item.address()))
        {
            return Err(SyncError::DuplicateExists);
        }
        item.set_save_state(stored.save_state());
        item.set_reported(stored.is_reported());

        let today = self.today();
        item.set_date_updated(today);
        if item.date_saved().is_none() {
            item.set_date_saved(today);
        }

        let replaced = self
            .commit(session, move |items| {
                let previous = std::mem::replace(&mut items[index], item.clone());
                Ok((Undo::Restore(index, previous), item))
            })
            .await?;

        self.subscribers.notify(&replaced);
        Ok(Receipt {
            message: "Changes saved".to_string(),
            item: replaced,
        })
    }

    /// Removes the first item at `item`'s address.
    ///
    /// The deletion hook runs after a successful sync.
    ///
    /// # Errors
    ///
    /// - [`SyncError::NotAuthenticated`] if no user is signed in
    /// - [`SyncError::ItemDoesNotExist`] if no item is at that address
    /// - [`SyncError::RemoteSyncFailure`] if the sync fails (the item is put back)
    pub async fn delete<S: AuthSession<T>>(&mut self, session: &mut S, item: &T) -> Result<Receipt<T>> {
        let items = session.saved_items().ok_or(SyncError::NotAuthenticated)?;
        let index = position(item, items).ok_or(SyncError::ItemDoesNotExist)?;

        let removed = self
            .commit(session, move |items| {
                let removed = items.remove(index);
                Ok((Undo::Reinsert(index, removed.clone()), removed))
            })
            .await?;

        if let Some(hook) = &self.deletion_hook {
            hook.on_item_deleted(&removed);
        }
        Ok(Receipt {
            message: format!("Deleted \"{}\"", removed.label()),
            item: removed,
        })
    }

    /// Flips an item between `Saved` and `Starred`.
    ///
    /// # Errors
    ///
    /// - [`SyncError::NotAuthenticated`] if no user is signed in
    /// - [`SyncError::ItemDoesNotExist`] if the item is not in the collection
    /// - [`SyncError::InvalidTransition`] if the item is `Unsaved`
    /// - [`SyncError::RemoteSyncFailure`] if the sync fails (the state is restored)
    pub async fn toggle_star<S: AuthSession<T>>(&mut self, session: &mut S, item: &T) -> Result<Receipt<T>> {
        let items = session.saved_items().ok_or(SyncError::NotAuthenticated)?;
        let index = items
            .iter()
            .position(|i| i.id() == item.id())
            .ok_or(SyncError::ItemDoesNotExist)?;
        let previous = items[index].save_state();
        let next = previous.toggled().ok_or(SyncError::InvalidTransition)?;

        let toggled = self
            .commit(session, move |items| {
                items[index].set_save_state(next);
                Ok((Undo::SetState(index, previous), items[index].clone()))
            })
            .await?;

        let message = match next {
            SaveState::Starred => "Starred",
            _ => "Un-Starred",
        };
        Ok(Receipt {
            message: message.to_string(),
            item: toggled,
        })
    }
}

/// Trims and normalizes a candidate before it is offered to the engine.
///
/// The engine normalizes addresses itself; this also trims every other field.
pub fn prepare<T: Trackable + Trim>(mut candidate: T) -> T {
    candidate.trim_in_place();
    normalize_address(candidate.address_mut());
    candidate
}
