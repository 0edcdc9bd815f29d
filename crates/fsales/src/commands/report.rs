//! Reporting commands: report, reported, refresh.

use super::items::{print_receipt, saved_items};
use super::lookups::resolve_item;
use super::{CommandContext, Result, Workspace};
use crate::output::{format_reported_json, format_reported_table};

/// Executes the report command.
///
/// Reporting the same address twice updates the existing shared record.
pub async fn execute_report(ctx: &CommandContext, ws: &mut Workspace, id: &str) -> Result<()> {
    let item_id = resolve_item(saved_items(ws), id)?.id.clone();
    let receipt = ws.engine.report_item(&mut ws.session, &item_id).await?;
    print_receipt(ctx, &receipt)
}

/// Executes the reported command: lists the shared reported collection.
pub async fn execute_reported(ctx: &CommandContext, ws: &mut Workspace) -> Result<()> {
    ws.engine.load_reported().await?;
    let records = ws.engine.reported();

    if ctx.json_output {
        println!("{}", format_reported_json(records)?);
    } else if !ctx.quiet {
        print!("{}", format_reported_table(records, ctx.use_colors));
    }
    Ok(())
}

/// Executes the refresh command: reloads the reported collection and
/// recomputes every saved location's reported flag.
pub async fn execute_refresh(ctx: &CommandContext, ws: &mut Workspace) -> Result<()> {
    let loaded = ws.engine.load_reported().await?;
    let flagged = ws
        .engine
        .refresh_local_reported_flags(&mut ws.session)
        .await?;

    if ctx.json_output {
        let output = serde_json::json!({
            "status": "success",
            "reported": loaded,
            "flagged": flagged,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else if !ctx.quiet {
        println!(
            "Loaded {} reported location{}; {} of your locations {} reported.",
            loaded,
            if loaded == 1 { "" } else { "s" },
            flagged,
            if flagged == 1 { "is" } else { "are" }
        );
    }
    Ok(())
}
