//! Remote collaborators used by the sync engine.
//!
//! The engine never talks HTTP directly; it goes through these traits so the
//! store can be swapped (the HTTP [`StoreClient`](crate::client::StoreClient)
//! in production, an in-memory fake in tests). Returned futures are `Send` so
//! callers may drive them from spawned tasks.

use std::future::Future;

use crate::error::Result;
use crate::models::{ReportedItem, ReportedRecord, UserRecord};

/// Field of a reported document that holds the postal code.
pub const POSTAL_CODE_FIELD: &str = "address.postalCode";

/// Field of a reported document that holds the full address.
pub const FULL_ADDRESS_FIELD: &str = "address.fullAddress";

/// Storage for per-user documents.
pub trait UserStore {
    /// Loads a user's document, or `None` if the user has none yet.
    fn load_user(&self, uid: &str) -> impl Future<Output = Result<Option<UserRecord>>> + Send;

    /// Writes a user's whole document.
    fn save_user(&self, user: &UserRecord) -> impl Future<Output = Result<()>> + Send;
}

/// The shared collection of reported items.
pub trait ReportedStore {
    /// Inserts a new reported item and returns its document id.
    fn add_reported(&self, item: &ReportedItem) -> impl Future<Output = Result<String>> + Send;

    /// Overwrites the reported item stored under `id`.
    fn update_reported(
        &self,
        id: &str,
        item: &ReportedItem,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Returns up to `limit` reported items whose `field` equals `value`.
    fn find_reported(
        &self,
        field: &str,
        value: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<ReportedRecord>>> + Send;

    /// Returns every reported item.
    fn list_reported(&self) -> impl Future<Output = Result<Vec<ReportedRecord>>> + Send;
}
