//! Saved location output formatting.

use chrono::NaiveDate;
use fieldsales_api::models::SavedItem;
use owo_colors::OwoColorize;
use serde::Serialize;

use super::helpers::{format_date, format_state, pad, truncate_id, truncate_str};

/// JSON output structure for the list command.
#[derive(Serialize)]
pub struct ItemsListOutput<'a> {
    pub items: &'a [&'a SavedItem],
    pub offline: bool,
}

/// JSON output structure for a completed change.
#[derive(Serialize)]
pub struct ReceiptOutput<'a> {
    pub status: &'static str,
    pub message: &'a str,
    pub item: &'a SavedItem,
}

/// Formats saved locations as JSON.
pub fn format_items_json(items: &[&SavedItem], offline: bool) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ItemsListOutput { items, offline })
}

/// Formats saved locations as a table.
pub fn format_items_table(items: &[&SavedItem], today: NaiveDate, use_colors: bool) -> String {
    if items.is_empty() {
        return "No saved locations.\n".to_string();
    }

    let mut output = String::new();

    let header = format!(
        "{:<8}   {:<24} {:<36} {:<3} {}",
        "ID", "Name", "Address", "Rep", "Updated"
    );
    if use_colors {
        output.push_str(&format!("{}\n", header.dimmed()));
    } else {
        output.push_str(&header);
        output.push('\n');
    }

    for item in items {
        let name = pad(&truncate_str(&item.name, 24), 24);
        let name = if use_colors && item.is_starred() {
            name.bold().to_string()
        } else {
            name
        };
        let reported = if item.is_reported { "R" } else { "" };
        let updated = format_date(item.date_updated.or(item.date_saved), today);

        output.push_str(&format!(
            "{:<8} {} {} {:<36} {:<3} {}\n",
            truncate_id(&item.id),
            format_state(item.save_state, use_colors),
            name,
            truncate_str(&item.address.display(), 36),
            reported,
            updated
        ));
    }

    output
}

/// Formats a completed change as JSON.
pub fn format_receipt_json(message: &str, item: &SavedItem) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ReceiptOutput {
        status: "success",
        message,
        item,
    })
}

/// Formats a completed change for humans.
pub fn format_receipt(message: &str, item: &SavedItem, use_colors: bool) -> String {
    let id = format!("({})", truncate_id(&item.id));
    if use_colors {
        format!("{} {}\n", message.green(), id.dimmed())
    } else {
        format!("{} {}\n", message, id)
    }
}
