//! Data models for saved and reported locations.
//!
//! These types mirror the documents kept by the remote store: the per-user
//! document holding a user's saved items, and the shared collection of items
//! reported by any user.

mod address;
mod contact;
mod item;
mod reported;
mod user;

pub use address::{AddressRecord, Locatable};
pub use contact::ContactRecord;
pub use item::{ImmutableFieldError, SaveState, SavedItem};
pub use reported::{ReportedItem, ReportedRecord};
pub use user::UserRecord;
