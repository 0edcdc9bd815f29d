//! Address normalization and record clean-up.
//!
//! [`format_address`] produces the text used to compare addresses that have no
//! postal code. It is pure and idempotent.

use fieldsales_api::models::{AddressRecord, ContactRecord, ReportedItem, SavedItem};

/// Characters removed outright from addresses.
const BLACKLIST: &[char] = &[
    '!', '$', '%', '^', '&', '*', '(', ')', '_', '+', '=', '[', ']', '{', '}', ';', ':', '"',
    '<', '>', '?', '/', '\\', '|', '`', '~',
];

/// Separators that are collapsed when repeated and stripped from the ends.
const SEPARATORS: &[char] = &[' ', ',', '@', '#'];

/// Normalizes a raw address string.
///
/// Removes blacklisted symbols, collapses runs of the same separator
/// (space, comma, `@`, `#`) to a single occurrence, and strips separators and
/// whitespace from both ends.
pub fn format_address(raw: &str) -> String {
    let mut current = format_once(raw);
    // Trimming whitespace can expose a separator at the edge; repeat until stable.
    loop {
        let next = format_once(&current);
        if next == current {
            return current;
        }
        current = next;
    }
}

fn format_once(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut last: Option<char> = None;

    for c in raw.chars().filter(|c| !BLACKLIST.contains(c)) {
        if SEPARATORS.contains(&c) && last == Some(c) {
            continue;
        }
        out.push(c);
        last = Some(c);
    }

    out.trim_matches(|c: char| SEPARATORS.contains(&c) || c.is_whitespace())
        .to_string()
}

/// Returns the comparison key of an address without a postal code:
/// the formatted, lower-cased full address.
pub fn canonical_address(address: &AddressRecord) -> String {
    format_address(&address.display()).to_lowercase()
}

/// Normalizes an address in place: formats the street and rebuilds the full
/// address from the parts. An address with no parts keeps its full address,
/// formatted.
pub fn normalize_address(address: &mut AddressRecord) {
    address.trim_in_place();
    address.street = format_address(&address.street);
    let composed = address.compose_full();
    let full = if composed.is_empty() {
        &address.full_address
    } else {
        &composed
    };
    address.full_address = format_address(full);
}

/// Returns true if `after` differs from the `before` snapshot.
///
/// Used to decide whether leaving an edit should prompt to discard changes.
pub fn is_dirty<T: PartialEq>(before: &T, after: &T) -> bool {
    before != after
}

/// Trims every string leaf of a record in place.
pub trait Trim {
    fn trim_in_place(&mut self);
}

impl Trim for String {
    fn trim_in_place(&mut self) {
        let trimmed = self.trim();
        if trimmed.len() != self.len() {
            *self = trimmed.to_string();
        }
    }
}

impl Trim for Option<String> {
    fn trim_in_place(&mut self) {
        if let Some(value) = self {
            value.trim_in_place();
        }
    }
}

impl Trim for ContactRecord {
    fn trim_in_place(&mut self) {
        self.name.trim_in_place();
        self.email.trim_in_place();
        self.phone_number.trim_in_place();
    }
}

impl Trim for AddressRecord {
    fn trim_in_place(&mut self) {
        self.street.trim_in_place();
        self.city.trim_in_place();
        self.region.trim_in_place();
        self.country.trim_in_place();
        self.postal_code.trim_in_place();
        self.full_address.trim_in_place();
    }
}

impl Trim for SavedItem {
    fn trim_in_place(&mut self) {
        self.name.trim_in_place();
        self.address.trim_in_place();
        self.owner.trim_in_place();
        self.contact_person.trim_in_place();
        self.current_provider.trim_in_place();
        self.notes.trim_in_place();
    }
}

impl Trim for ReportedItem {
    fn trim_in_place(&mut self) {
        self.name.trim_in_place();
        self.address.trim_in_place();
        self.owner.trim_in_place();
        self.contact_person.trim_in_place();
        self.current_provider.trim_in_place();
        self.notes.trim_in_place();
        self.reported_by.trim_in_place();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_removes_blacklisted_symbols() {
        assert_eq!(format_address("1 Main St. (rear)!"), "1 Main St. rear");
        assert_eq!(format_address("Unit 4/5 {B}"), "Unit 45 B");
    }

    #[test]
    fn test_format_collapses_repeated_separators() {
        assert_eq!(format_address("1  Main   St,, Town"), "1 Main St, Town");
        assert_eq!(format_address("Box ## 12 @@ Mall"), "Box # 12 @ Mall");
    }

    #[test]
    fn test_format_strips_edges() {
        assert_eq!(format_address(", ,1 Main St, #"), "1 Main St");
        assert_eq!(format_address("\t,1 Main St\n"), "1 Main St");
    }

    #[test]
    fn test_format_is_idempotent() {
        let samples = [
            "",
            "   ",
            ",,,",
            "1 Main St",
            " , 1 Main St ,, Town @@ ## ",
            "\t,a",
            "a(,) ,b",
            "**1**  ,,  Main!!  St  ,",
            "x , , y",
            "@#@# a #@#@",
        ];
        for s in samples {
            let once = format_address(s);
            assert_eq!(format_address(&once), once, "not idempotent for {s:?}");
        }
    }

    #[test]
    fn test_canonical_address_is_case_insensitive() {
        let a = AddressRecord::new("1 MAIN ST", "Town", "", "", "");
        let b = AddressRecord::new("1 main st", "TOWN", "", "", "");
        assert_eq!(canonical_address(&a), canonical_address(&b));
    }

    #[test]
    fn test_normalize_address_formats_fields() {
        let mut address = AddressRecord::new("  1  Main St!! ", "Town", "", "", "");
        normalize_address(&mut address);
        assert_eq!(address.street, "1 Main St");
        assert_eq!(address.full_address, "1 Main St, Town");
    }

    #[test]
    fn test_trim_saved_item_recursively() {
        let mut item = SavedItem::manual(" Cafe A ", AddressRecord::new(" 1 Main St ", "", "", "", ""));
        item.owner.email = Some("  owner@example.com ".to_string());
        item.notes = "\tnotes\n".to_string();

        item.trim_in_place();

        assert_eq!(item.name, "Cafe A");
        assert_eq!(item.address.street, "1 Main St");
        assert_eq!(item.owner.email.as_deref(), Some("owner@example.com"));
        assert_eq!(item.notes, "notes");
    }

    #[test]
    fn test_clone_shares_no_state() {
        let original = SavedItem::manual("Cafe A", AddressRecord::new("1 Main St", "", "", "", ""));
        let mut copy = original.clone();
        copy.address.street = "2 Side St".to_string();
        copy.owner.name = Some("New Owner".to_string());

        assert_eq!(original.address.street, "1 Main St");
        assert!(original.owner.name.is_none());
        assert!(is_dirty(&original, &copy));
        assert!(!is_dirty(&original, &original.clone()));
    }
}
