//! Prelude module for convenient imports.
//!
//! ```
//! use fieldsales_api::prelude::*;
//!
//! // Now you have access to:
//! // - StoreClient, StoreClientBuilder (document-store client)
//! // - Error, ApiError, Result (error handling)
//! // - UserStore, ReportedStore (remote collaborator traits)
//! // - SavedItem, ReportedItem, AddressRecord, etc. (data models)
//! ```

// Client types
pub use crate::client::{StoreClient, StoreClientBuilder};

// Error types
pub use crate::error::{ApiError, Error, Result};

// Remote collaborators
pub use crate::remote::{ReportedStore, UserStore};

// Data models
pub use crate::models::{
    AddressRecord, ContactRecord, ImmutableFieldError, Locatable, ReportedItem, ReportedRecord,
    SaveState, SavedItem, UserRecord,
};
