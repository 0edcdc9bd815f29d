//! Output formatting utilities for the fsales CLI.
//!
//! This module provides functions for formatting data as tables or JSON.
//! It is organized into submodules by entity type:
//!
//! - [`items`] - Saved location output (list, receipts for changes)
//! - [`reported`] - Reported location output
//! - [`reminders`] - Follow-up reminder output
//! - [`helpers`] - Common formatting utilities (truncation, dates, state markers)

pub mod helpers;
mod items;
mod reminders;
mod reported;

pub use items::{format_items_json, format_items_table, format_receipt, format_receipt_json};
pub use reminders::{format_reminders_json, format_reminders_table};
pub use reported::{format_reported_json, format_reported_table};
