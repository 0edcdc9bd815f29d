//! Reported location output formatting.

use fieldsales_api::models::ReportedRecord;
use owo_colors::OwoColorize;
use serde::Serialize;

use super::helpers::{truncate_id, truncate_str};

/// JSON output structure for the reported command.
#[derive(Serialize)]
pub struct ReportedListOutput<'a> {
    pub reported: &'a [ReportedRecord],
}

/// Formats reported locations as JSON.
pub fn format_reported_json(records: &[ReportedRecord]) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&ReportedListOutput { reported: records })
}

/// Formats reported locations as a table, newest report first.
pub fn format_reported_table(records: &[ReportedRecord], use_colors: bool) -> String {
    if records.is_empty() {
        return "No reported locations.\n".to_string();
    }

    let mut sorted: Vec<&ReportedRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.item.date_reported.cmp(&a.item.date_reported));

    let mut output = String::new();
    let header = format!(
        "{:<8} {:<24} {:<36} {:<10} {}",
        "ID", "Name", "Address", "Reported", "By"
    );
    if use_colors {
        output.push_str(&format!("{}\n", header.dimmed()));
    } else {
        output.push_str(&header);
        output.push('\n');
    }

    for record in sorted {
        let reporter = record.item.reported_by.name.as_deref().unwrap_or("");
        output.push_str(&format!(
            "{:<8} {:<24} {:<36} {:<10} {}\n",
            truncate_id(&record.id),
            truncate_str(&record.item.name, 24),
            truncate_str(&record.item.address.display(), 36),
            record.item.date_reported.format("%Y-%m-%d"),
            reporter
        ));
    }

    output
}
