//! Reminder output formatting.

use fieldsales_sync::Reminder;
use owo_colors::OwoColorize;
use serde::Serialize;

use super::helpers::truncate_id;

/// JSON output structure for the remind command.
#[derive(Serialize)]
pub struct RemindersOutput<'a> {
    pub created: usize,
    pub reminders: &'a [Reminder],
}

/// Formats pending reminders as JSON.
pub fn format_reminders_json(
    reminders: &[Reminder],
    created: usize,
) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&RemindersOutput { created, reminders })
}

/// Formats pending reminders as a list.
pub fn format_reminders_table(reminders: &[Reminder], use_colors: bool) -> String {
    if reminders.is_empty() {
        return "No reminders.\n".to_string();
    }

    let mut output = String::new();
    for reminder in reminders {
        let id = truncate_id(&reminder.id);
        let created = reminder.created.format("%Y-%m-%d").to_string();
        if use_colors {
            output.push_str(&format!(
                "{} {} {}\n",
                id.dimmed(),
                created.dimmed(),
                reminder.message
            ));
        } else {
            output.push_str(&format!("{} {} {}\n", id, created, reminder.message));
        }
    }
    output
}
