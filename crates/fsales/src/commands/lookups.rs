//! Resolving user input to saved locations.
//!
//! A location can be named by its full ID, a unique ID prefix, or its name
//! (case-insensitive). Misses suggest the closest name.

use fieldsales_api::models::SavedItem;

use super::{CommandError, Result};

/// Maximum edit distance for a "did you mean" suggestion.
const MAX_SUGGESTION_DISTANCE: usize = 3;

/// Finds the saved location `query` refers to.
///
/// # Errors
///
/// Returns `CommandError::NotFound` if nothing matches, or if an ID prefix
/// matches more than one location.
pub fn resolve_item<'a>(items: &'a [SavedItem], query: &str) -> Result<&'a SavedItem> {
    let query = query.trim();
    if query.is_empty() {
        return Err(CommandError::NotFound("No location given".to_string()));
    }

    if let Some(item) = items.iter().find(|item| item.id == query) {
        return Ok(item);
    }

    let by_prefix: Vec<&SavedItem> = items
        .iter()
        .filter(|item| item.id.starts_with(query))
        .collect();
    match by_prefix.as_slice() {
        [item] => return Ok(*item),
        [] => {}
        many => {
            let names: Vec<&str> = many.iter().map(|item| item.name.as_str()).collect();
            return Err(CommandError::NotFound(format!(
                "ID prefix '{}' is ambiguous: matches {}",
                query,
                names.join(", ")
            )));
        }
    }

    let lowered = query.to_lowercase();
    if let Some(item) = items.iter().find(|item| item.name.to_lowercase() == lowered) {
        return Ok(item);
    }

    Err(CommandError::NotFound(not_found_message(items, query)))
}

fn not_found_message(items: &[SavedItem], query: &str) -> String {
    match suggest_name(items, query) {
        Some(name) => format!("No location matches '{}'. Did you mean '{}'?", query, name),
        None => format!("No location matches '{}'", query),
    }
}

/// Returns the saved name closest to `query`, if any is close enough.
pub fn suggest_name<'a>(items: &'a [SavedItem], query: &str) -> Option<&'a str> {
    let lowered = query.to_lowercase();
    items
        .iter()
        .map(|item| {
            let distance = strsim::levenshtein(&lowered, &item.name.to_lowercase());
            (distance, item.name.as_str())
        })
        .filter(|(distance, _)| *distance <= MAX_SUGGESTION_DISTANCE)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, name)| name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use fieldsales_api::models::AddressRecord;

    fn item(id: &str, name: &str) -> SavedItem {
        let mut item = SavedItem::manual(name, AddressRecord::new(name, "Town", "", "", ""));
        item.id = id.to_string();
        item
    }

    fn items() -> Vec<SavedItem> {
        vec![
            item("a1b2c3d4", "Cafe Aroma"),
            item("a1ffee00", "Bakery Bun"),
            item("9f8e7d6c", "Corner Shop"),
        ]
    }

    #[test]
    fn test_resolve_by_full_id() {
        let items = items();
        assert_eq!(resolve_item(&items, "9f8e7d6c").unwrap().name, "Corner Shop");
    }

    #[test]
    fn test_resolve_by_unique_prefix() {
        let items = items();
        assert_eq!(resolve_item(&items, "a1b").unwrap().name, "Cafe Aroma");
    }

    #[test]
    fn test_ambiguous_prefix_is_error() {
        let items = items();
        let err = resolve_item(&items, "a1").unwrap_err();
        assert!(err.to_string().contains("ambiguous"));
        assert!(err.to_string().contains("Bakery Bun"));
    }

    #[test]
    fn test_resolve_by_name_case_insensitive() {
        let items = items();
        assert_eq!(resolve_item(&items, "  corner shop ").unwrap().id, "9f8e7d6c");
    }

    #[test]
    fn test_miss_suggests_close_name() {
        let items = items();
        let err = resolve_item(&items, "Corner Shp").unwrap_err();
        assert!(matches!(err, CommandError::NotFound(_)));
        assert!(err.to_string().contains("Did you mean 'Corner Shop'?"));
    }

    #[test]
    fn test_miss_without_suggestion() {
        let items = items();
        let err = resolve_item(&items, "Hardware Depot").unwrap_err();
        assert_eq!(err.to_string(), "No location matches 'Hardware Depot'");
    }

    #[test]
    fn test_empty_query_is_error() {
        assert!(resolve_item(&items(), "  ").is_err());
        assert!(resolve_item(&[], "abc").is_err());
    }
}
