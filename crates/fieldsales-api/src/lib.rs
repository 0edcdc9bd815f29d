//! Data model and remote document-store client for field-sales saved locations.
//!
//! # Quick Start
//!
//! For convenient imports, use the prelude:
//!
//! ```
//! use fieldsales_api::prelude::*;
//! ```
//!
//! This re-exports the most commonly used types including [`StoreClient`],
//! error types, the remote collaborator traits, and data models.
//!
//! [`StoreClient`]: client::StoreClient

pub mod client;
pub mod error;
pub mod models;
pub mod prelude;
pub mod remote;
mod retry;
