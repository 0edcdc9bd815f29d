//! Saved location commands: list, add, edit, delete, star.
//!
//! Every change goes through the sync engine, which applies it locally,
//! synchronizes the user record and rolls back if the store rejects it.

use chrono::Local;
use fieldsales_api::models::{AddressRecord, SavedItem};
use fieldsales_sync::engine::prepare;
use fieldsales_sync::{Receipt, SyncError};

use super::lookups::resolve_item;
use super::{confirm, CommandContext, ConfirmResult, Result, Workspace};
use crate::output::{format_items_json, format_items_table, format_receipt, format_receipt_json};

/// Options for the list command.
#[derive(Debug, Default)]
pub struct ListOptions {
    /// Show only starred locations.
    pub starred: bool,
}

/// Executes the list command.
pub fn execute_list(ctx: &CommandContext, ws: &Workspace, opts: &ListOptions) -> Result<()> {
    let items: Vec<&SavedItem> = saved_items(ws)
        .iter()
        .filter(|item| !opts.starred || item.is_starred())
        .collect();

    if ctx.json_output {
        println!("{}", format_items_json(&items, ws.offline)?);
        return Ok(());
    }

    if ws.offline && !ctx.quiet {
        eprintln!("Store unreachable: showing the last synced copy.");
    }
    if !ctx.quiet {
        let today = Local::now().date_naive();
        print!("{}", format_items_table(&items, today, ctx.use_colors));
    }
    Ok(())
}

/// Options for the add command.
#[derive(Debug, Default)]
pub struct AddOptions {
    pub name: String,
    pub street: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub postal: String,
    pub notes: Option<String>,
    pub provider: Option<String>,
}

impl AddOptions {
    /// Builds the candidate item, trimmed and with a formatted address.
    fn to_candidate(&self) -> SavedItem {
        let address = AddressRecord::new(
            self.street.as_str(),
            self.city.as_str(),
            self.region.as_str(),
            self.country.as_str(),
            self.postal.as_str(),
        );
        let mut item = SavedItem::manual(self.name.as_str(), address);
        if let Some(notes) = &self.notes {
            item.notes = notes.clone();
        }
        if let Some(provider) = &self.provider {
            item.current_provider = provider.clone();
        }
        prepare(item)
    }
}

/// Executes the add command.
pub async fn execute_add(ctx: &CommandContext, ws: &mut Workspace, opts: &AddOptions) -> Result<()> {
    let receipt = ws.engine.add(&mut ws.session, opts.to_candidate()).await?;
    print_receipt(ctx, &receipt)
}

/// Options for the edit command.
#[derive(Debug, Default)]
pub struct EditOptions {
    /// Location ID (or prefix) or name.
    pub id: String,
    pub name: Option<String>,
    pub notes: Option<String>,
    pub provider: Option<String>,
    pub contact_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
}

impl EditOptions {
    fn has_changes(&self) -> bool {
        self.name.is_some()
            || self.notes.is_some()
            || self.provider.is_some()
            || self.contact_name.is_some()
            || self.contact_email.is_some()
            || self.contact_phone.is_some()
    }

    /// Applies the requested changes to a copy of `original`.
    fn apply(&self, original: &SavedItem) -> std::result::Result<SavedItem, SyncError> {
        let mut updated = original.clone();
        if let Some(name) = &self.name {
            updated
                .rename(name.as_str())
                .map_err(|_| SyncError::ImmutableField)?;
        }
        if let Some(notes) = &self.notes {
            updated.notes = notes.clone();
        }
        if let Some(provider) = &self.provider {
            updated.current_provider = provider.clone();
        }
        let contact = &mut updated.contact_person;
        if let Some(name) = &self.contact_name {
            contact.name = non_empty(name);
        }
        if let Some(email) = &self.contact_email {
            contact.email = non_empty(email);
        }
        if let Some(phone) = &self.contact_phone {
            contact.phone_number = non_empty(phone);
        }
        Ok(prepare(updated))
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Executes the edit command.
pub async fn execute_edit(ctx: &CommandContext, ws: &mut Workspace, opts: &EditOptions) -> Result<()> {
    let original = resolve_item(saved_items(ws), &opts.id)?.clone();

    if !opts.has_changes() {
        if !ctx.quiet {
            eprintln!("Nothing to change.");
        }
        return Ok(());
    }

    let updated = opts.apply(&original)?;
    let receipt = ws.engine.update(&mut ws.session, &original, updated).await?;
    print_receipt(ctx, &receipt)
}

/// Options for the delete command.
#[derive(Debug, Default)]
pub struct DeleteOptions {
    /// Location ID (or prefix) or name.
    pub id: String,
    /// Skip confirmation prompt.
    pub force: bool,
}

/// Executes the delete command.
pub async fn execute_delete(
    ctx: &CommandContext,
    ws: &mut Workspace,
    opts: &DeleteOptions,
) -> Result<()> {
    let item = resolve_item(saved_items(ws), &opts.id)?.clone();

    let prompt = format!("Delete \"{}\"?", item.name);
    if confirm(&prompt, opts.force)? == ConfirmResult::Aborted {
        if !ctx.quiet {
            eprintln!("Aborted.");
        }
        return Ok(());
    }

    let receipt = ws.engine.delete(&mut ws.session, &item).await?;
    print_receipt(ctx, &receipt)
}

/// Executes the star command.
pub async fn execute_star(ctx: &CommandContext, ws: &mut Workspace, id: &str) -> Result<()> {
    let item = resolve_item(saved_items(ws), id)?.clone();
    let receipt = ws.engine.toggle_star(&mut ws.session, &item).await?;
    print_receipt(ctx, &receipt)
}

/// Returns the signed-in user's saved items (empty when signed out).
pub(crate) fn saved_items(ws: &Workspace) -> &[SavedItem] {
    ws.session
        .user()
        .map(|user| user.saved_items.as_slice())
        .unwrap_or(&[])
}

pub(crate) fn print_receipt(ctx: &CommandContext, receipt: &Receipt<SavedItem>) -> Result<()> {
    if ctx.json_output {
        println!("{}", format_receipt_json(&receipt.message, &receipt.item)?);
    } else if !ctx.quiet {
        print!("{}", format_receipt(&receipt.message, &receipt.item, ctx.use_colors));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldsales_api::models::ContactRecord;

    #[test]
    fn test_add_options_build_trimmed_candidate() {
        let opts = AddOptions {
            name: "  Cafe Aroma ".to_string(),
            street: "1 Main St ".to_string(),
            city: "Town".to_string(),
            notes: Some(" busy at noon ".to_string()),
            ..AddOptions::default()
        };

        let item = opts.to_candidate();

        assert_eq!(item.name, "Cafe Aroma");
        assert_eq!(item.notes, "busy at noon");
        assert!(item.was_manually_saved);
        assert_eq!(item.address.display(), "1 Main St, Town");
    }

    #[test]
    fn test_edit_options_apply_contact_and_notes() {
        let original =
            SavedItem::manual("Cafe Aroma", AddressRecord::new("1 Main St", "Town", "", "", ""));
        let opts = EditOptions {
            notes: Some("ask for Ana".to_string()),
            contact_name: Some("Ana".to_string()),
            contact_phone: Some("  ".to_string()),
            ..EditOptions::default()
        };

        let updated = opts.apply(&original).unwrap();

        assert_eq!(updated.id, original.id);
        assert_eq!(updated.notes, "ask for Ana");
        assert_eq!(
            updated.contact_person,
            ContactRecord {
                name: Some("Ana".to_string()),
                ..ContactRecord::default()
            }
        );
    }

    #[test]
    fn test_edit_options_rename_map_item_is_immutable() {
        let original = SavedItem::from_search_result(
            "Map Cafe",
            AddressRecord::new("2 Side St", "Town", "", "", ""),
        );
        let opts = EditOptions {
            name: Some("Renamed".to_string()),
            ..EditOptions::default()
        };

        assert!(matches!(opts.apply(&original), Err(SyncError::ImmutableField)));
    }

    #[test]
    fn test_edit_options_without_changes() {
        assert!(!EditOptions::default().has_changes());
        assert!(EditOptions {
            provider: Some("Acme".to_string()),
            ..EditOptions::default()
        }
        .has_changes());
    }
}
