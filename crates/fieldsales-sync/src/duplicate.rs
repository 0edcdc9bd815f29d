//! Duplicate detection by canonical address.
//!
//! Two addresses are the same location when both carry a postal code and the
//! postal codes match, or, failing that, when their formatted lower-cased full
//! addresses match.

use fieldsales_api::models::{AddressRecord, Locatable};

use crate::format::canonical_address;
use crate::session::AuthSession;

/// Returns true if `a` and `b` denote the same location.
pub fn same_address(a: &AddressRecord, b: &AddressRecord) -> bool {
    if a.has_postal_code() && b.has_postal_code() {
        return a.postal_code.trim().eq_ignore_ascii_case(b.postal_code.trim());
    }
    canonical_address(a) == canonical_address(b)
}

/// Returns true if any member of `collection` is at the candidate's address.
///
/// Stops at the first match.
pub fn exists<'a, C, L>(candidate: &C, collection: impl IntoIterator<Item = &'a L>) -> bool
where
    C: Locatable + ?Sized,
    L: Locatable + 'a,
{
    let address = candidate.address();
    collection
        .into_iter()
        .any(|member| same_address(address, member.address()))
}

/// Returns the index of the first member of `collection` at the candidate's address.
pub fn position<C, L>(candidate: &C, collection: &[L]) -> Option<usize>
where
    C: Locatable + ?Sized,
    L: Locatable,
{
    let address = candidate.address();
    collection
        .iter()
        .position(|member| same_address(address, member.address()))
}

/// Returns true if the signed-in user already saved an item at the candidate's address.
///
/// Without a signed-in user there is nothing to check against and the answer is `false`.
pub fn exists_in_session<T, S, C>(session: &S, candidate: &C) -> bool
where
    T: Locatable,
    S: AuthSession<T>,
    C: Locatable + ?Sized,
{
    if !session.is_authenticated() {
        return false;
    }
    session
        .saved_items()
        .is_some_and(|items| exists(candidate, items))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(street: &str, city: &str, postal: &str) -> AddressRecord {
        AddressRecord::new(street, city, "", "", postal)
    }

    #[test]
    fn test_same_postal_code_different_street_is_duplicate() {
        let a = addr("1 Main St", "Town", "12345");
        let b = addr("1 Main Street", "Townsville", "12345");
        assert!(same_address(&a, &b));
        assert!(exists(&a, &[b]));
    }

    #[test]
    fn test_postal_code_compare_ignores_case_and_padding() {
        let a = addr("10 Downing St", "London", "SW1A 2AA");
        let b = addr("10 Downing Street", "London", " sw1a 2aa ");
        assert!(same_address(&a, &b));
    }

    #[test]
    fn test_empty_postal_codes_compare_formatted_full_address() {
        let a = addr("1 Main St", "Town", "");
        let b = addr("1  MAIN  st!!", "town", "");
        assert!(same_address(&a, &b));
    }

    #[test]
    fn test_one_postal_code_falls_back_to_full_address() {
        // Only one side has a postal code, so the full address decides;
        // the postal code itself is part of the composed address.
        let a = addr("1 Main St", "Town", "");
        let b = addr("1 Main St", "Town", "12345");
        assert!(!same_address(&a, &b));

        let mut c = addr("1 Main St", "Town", "");
        c.full_address = "1 Main St, Town".to_string();
        let mut d = addr("", "", "12345");
        d.full_address = "1 main st, town".to_string();
        assert!(same_address(&c, &d));
    }

    #[test]
    fn test_different_postal_codes_are_distinct() {
        let a = addr("1 Main St", "Town", "12345");
        let b = addr("1 Main St", "Town", "54321");
        assert!(!same_address(&a, &b));
    }

    #[test]
    fn test_exists_on_empty_collection() {
        let a = addr("1 Main St", "Town", "");
        let empty: Vec<AddressRecord> = Vec::new();
        assert!(!exists(&a, &empty));
    }

    #[test]
    fn test_position_returns_first_match() {
        let target = addr("1 Main St", "Town", "");
        let collection = vec![
            addr("2 Side St", "Town", ""),
            addr("1 main st", "town", ""),
            addr("1 Main St", "Town", ""),
        ];
        assert_eq!(position(&target, &collection), Some(1));
        assert_eq!(position(&addr("9 Nowhere", "", ""), &collection), None);
    }
}
