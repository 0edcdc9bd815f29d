//! Reminder commands: remind and watch.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use fieldsales_sync::{NotificationPrefs, ReportedFeed, TriggerProcess};
use owo_colors::OwoColorize;
use tokio::sync::mpsc;

use super::items::saved_items;
use super::{CommandContext, CommandError, Result, Workspace};
use crate::output::{format_reminders_json, format_reminders_table};

/// Options for the remind command.
#[derive(Debug, Default)]
pub struct RemindOptions {
    /// Dismiss the reminder with this ID (or unique prefix) instead of listing.
    pub dismiss: Option<String>,
}

/// Executes the remind command.
///
/// Generates reminders for stale starred locations, then lists everything
/// pending.
pub fn execute_remind(ctx: &CommandContext, ws: &Workspace, opts: &RemindOptions) -> Result<()> {
    if let Some(id) = &opts.dismiss {
        return dismiss(ctx, ws, id);
    }

    let prefs: NotificationPrefs = ws.prefs.load()?;
    let today = Local::now().date_naive();
    let created = ws.reminders.generate(saved_items(ws), today, &prefs)?;
    let pending = ws.reminders.pending()?;

    if ctx.json_output {
        println!("{}", format_reminders_json(&pending, created.len())?);
    } else if !ctx.quiet {
        if !prefs.enabled {
            eprintln!("Reminders are turned off.");
        }
        print!("{}", format_reminders_table(&pending, ctx.use_colors));
    }
    Ok(())
}

fn dismiss(ctx: &CommandContext, ws: &Workspace, query: &str) -> Result<()> {
    let pending = ws.reminders.pending()?;
    let matches: Vec<_> = pending
        .iter()
        .filter(|reminder| reminder.id.starts_with(query))
        .collect();
    let reminder = match matches.as_slice() {
        [reminder] => *reminder,
        [] => {
            return Err(CommandError::NotFound(format!(
                "No reminder matches '{}'",
                query
            )))
        }
        _ => {
            return Err(CommandError::NotFound(format!(
                "Reminder ID prefix '{}' is ambiguous",
                query
            )))
        }
    };

    ws.reminders.dismiss(&reminder.id)?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "dismissed": reminder.id,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!("Dismissed reminder for \"{}\"", reminder.item_name);
    }
    Ok(())
}

/// Executes the watch command.
///
/// Polls the reported collection and keeps reported flags current, and
/// checks for new reminders on the configured interval, until Ctrl-C.
pub async fn execute_watch(ctx: &CommandContext, ws: Workspace) -> Result<()> {
    let Workspace {
        config,
        mut session,
        mut engine,
        prefs,
        reminders,
        ..
    } = ws;

    let notification_prefs: NotificationPrefs = prefs.load()?;
    let poll = Duration::from_secs(config.sync.poll_seconds());
    let mut feed = ReportedFeed::spawn(Arc::new(session.store().clone()), poll);

    let (tick_tx, mut tick_rx) = mpsc::unbounded_channel();
    let trigger = TriggerProcess::start(notification_prefs.check_interval(), move || {
        let _ = tick_tx.send(());
    });

    if !ctx.quiet && !ctx.json_output {
        eprintln!(
            "Watching reported locations every {}s. Press Ctrl-C to stop.",
            poll.as_secs()
        );
    }

    let result = loop {
        tokio::select! {
            snapshot = feed.changed() => {
                let Some(records) = snapshot else {
                    break Ok(());
                };
                let count = records.len();
                engine.apply_reported_snapshot(records);
                match engine.refresh_local_reported_flags(&mut session).await {
                    Ok(flagged) => print_event(
                        ctx,
                        "reported",
                        &format!("{} reported locations; {} of yours flagged", count, flagged),
                    ),
                    // The next snapshot retries; a failed refresh is already rolled back.
                    Err(e) => tracing::warn!(error = %e, "failed to refresh reported flags"),
                }
            }
            Some(()) = tick_rx.recv() => {
                let items = session.user().map(|u| u.saved_items.as_slice()).unwrap_or(&[]);
                let today = Local::now().date_naive();
                match reminders.generate(items, today, &notification_prefs) {
                    Ok(created) => {
                        for reminder in created {
                            print_event(ctx, "reminder", &reminder.message);
                        }
                    }
                    Err(e) => break Err(CommandError::from(e)),
                }
            }
            signal = tokio::signal::ctrl_c() => {
                break signal.map_err(CommandError::Io);
            }
        }
    };

    trigger.stop();
    feed.stop();
    result
}

fn print_event(ctx: &CommandContext, kind: &str, message: &str) {
    if ctx.json_output {
        println!("{}", serde_json::json!({ "event": kind, "message": message }));
    } else if !ctx.quiet {
        let time = Local::now().format("%H:%M:%S").to_string();
        if ctx.use_colors {
            println!("{} {}", time.dimmed(), message);
        } else {
            println!("{} {}", time, message);
        }
    }
}
