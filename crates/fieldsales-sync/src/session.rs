//! The signed-in user's session.
//!
//! A session is an explicit context object: it is created at startup, passed
//! by reference to whatever needs the user's data, and owns the user's saved
//! items for as long as the user is signed in.

use chrono::Utc;
use fieldsales_api::error::{ApiError, Error as RemoteError};
use fieldsales_api::models::{ContactRecord, SavedItem, UserRecord};
use fieldsales_api::remote::UserStore;

use crate::storage::{LocalStorage, StorageError};
use crate::OfflineCache;

/// What the sync engine needs from an authenticated session.
#[allow(async_fn_in_trait)]
pub trait AuthSession<T> {
    /// Returns true if a user is signed in.
    fn is_authenticated(&self) -> bool;

    /// Contact details of the signed-in user.
    fn contact(&self) -> Option<&ContactRecord>;

    /// The signed-in user's saved items.
    fn saved_items(&self) -> Option<&[T]>;

    /// Mutable access to the signed-in user's saved items.
    fn saved_items_mut(&mut self) -> Option<&mut Vec<T>>;

    /// Persists the whole user record, saved items included, to the remote store.
    async fn synchronize(&mut self) -> Result<(), RemoteError>;
}

/// A session backed by a remote [`UserStore`] with an offline copy in local storage.
#[derive(Debug)]
pub struct UserSession<U, L> {
    store: U,
    storage: L,
    user: Option<UserRecord>,
}

impl<U: UserStore, L: LocalStorage> UserSession<U, L> {
    /// Creates a signed-out session.
    pub fn new(store: U, storage: L) -> Self {
        Self {
            store,
            storage,
            user: None,
        }
    }

    /// Signs a user in by loading their record from the remote store.
    ///
    /// A user with no record yet starts with an empty one.
    ///
    /// # Errors
    ///
    /// Returns the remote error if the record cannot be loaded.
    pub async fn sign_in(&mut self, uid: &str) -> Result<&UserRecord, RemoteError> {
        let user = match self.store.load_user(uid).await? {
            Some(user) => user,
            None => {
                tracing::info!(uid, "no remote record for user, starting empty");
                UserRecord::new(uid)
            }
        };
        tracing::debug!(uid, items = user.saved_items.len(), "signed in");
        self.write_offline_copy(&user);
        Ok(self.user.insert(user))
    }

    /// Signs in from the offline copy, without contacting the remote store.
    ///
    /// Returns false if no offline copy exists for `uid`.
    ///
    /// # Errors
    ///
    /// Returns an error if the offline copy exists but cannot be read.
    pub fn restore_offline(&mut self, uid: &str) -> Result<bool, StorageError> {
        match OfflineCache::load(&self.storage)? {
            Some(cache) if cache.user.uid == uid => {
                tracing::debug!(uid, "restored session from offline copy");
                self.user = Some(cache.user);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Signs the user out. The offline copy is kept.
    pub fn sign_out(&mut self) {
        self.user = None;
    }

    /// Replaces the signed-in user's contact details (persisted on next synchronize).
    pub fn set_contact(&mut self, contact: ContactRecord) {
        if let Some(user) = self.user.as_mut() {
            user.contact = contact;
        }
    }

    /// Returns the signed-in user's record.
    pub fn user(&self) -> Option<&UserRecord> {
        self.user.as_ref()
    }

    /// Returns the remote store.
    pub fn store(&self) -> &U {
        &self.store
    }

    /// Returns the local storage.
    pub fn storage(&self) -> &L {
        &self.storage
    }

    fn write_offline_copy(&self, user: &UserRecord) {
        let cache = OfflineCache {
            user: user.clone(),
            last_sync: Some(Utc::now()),
        };
        // The remote copy is authoritative; a stale offline copy is only a read fallback.
        if let Err(e) = cache.store(&self.storage) {
            tracing::warn!(error = %e, "failed to write offline copy");
        }
    }
}

impl<U: UserStore, L: LocalStorage> AuthSession<SavedItem> for UserSession<U, L> {
    fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    fn contact(&self) -> Option<&ContactRecord> {
        self.user.as_ref().map(|u| &u.contact)
    }

    fn saved_items(&self) -> Option<&[SavedItem]> {
        self.user.as_ref().map(|u| u.saved_items.as_slice())
    }

    fn saved_items_mut(&mut self) -> Option<&mut Vec<SavedItem>> {
        self.user.as_mut().map(|u| &mut u.saved_items)
    }

    async fn synchronize(&mut self) -> Result<(), RemoteError> {
        let Some(user) = self.user.as_ref() else {
            return Err(ApiError::Auth {
                message: "not signed in".to_string(),
            }
            .into());
        };
        self.store.save_user(user).await?;
        self.write_offline_copy(user);
        Ok(())
    }
}
