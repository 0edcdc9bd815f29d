//! Common helper functions for output formatting.

use chrono::NaiveDate;
use fieldsales_api::models::SaveState;
use owo_colors::OwoColorize;

/// Number of ID characters shown in tables.
const ID_DISPLAY_LEN: usize = 8;

/// Truncates an ID for display.
pub fn truncate_id(id: &str) -> String {
    id.chars().take(ID_DISPLAY_LEN).collect()
}

/// Truncates a string to a maximum number of characters.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() > max_len {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        s.to_string()
    }
}

/// Formats a save state as a one-character marker.
pub fn format_state(state: SaveState, use_colors: bool) -> String {
    let marker = match state {
        SaveState::Starred => "*",
        SaveState::Saved => " ",
        SaveState::Unsaved => "-",
    };
    if use_colors && state == SaveState::Starred {
        marker.yellow().to_string()
    } else {
        marker.to_string()
    }
}

/// Formats a date relative to `today`.
pub fn format_date(date: Option<NaiveDate>, today: NaiveDate) -> String {
    let Some(date) = date else {
        return String::new();
    };

    let days = (today - date).num_days();
    match days {
        0 => "Today".to_string(),
        1 => "Yesterday".to_string(),
        2..=6 => format!("{days} days ago"),
        _ => date.format("%b %d %Y").to_string(),
    }
}

/// Pads `s` to `width` characters.
///
/// `format!("{:<w$}")` pads by characters already, but colored strings carry
/// escape codes, so callers pad before coloring.
pub fn pad(s: &str, width: usize) -> String {
    format!("{:<width$}", s)
}
