use serde::{Deserialize, Serialize};

/// A postal address.
///
/// `full_address` is normally derived from the other parts with
/// [`compose_full`](Self::compose_full), but map-search results may carry a
/// provider-formatted value that is kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AddressRecord {
    pub street: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub postal_code: String,
    pub full_address: String,
}

impl AddressRecord {
    /// Creates an address from its parts and composes `full_address`.
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        region: impl Into<String>,
        country: impl Into<String>,
        postal_code: impl Into<String>,
    ) -> Self {
        let mut address = Self {
            street: street.into(),
            city: city.into(),
            region: region.into(),
            country: country.into(),
            postal_code: postal_code.into(),
            full_address: String::new(),
        };
        address.full_address = address.compose_full();
        address
    }

    /// Joins the non-empty parts as `street, city, region, postal code, country`.
    pub fn compose_full(&self) -> String {
        [
            &self.street,
            &self.city,
            &self.region,
            &self.postal_code,
            &self.country,
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }

    /// Returns the full address, composing it from the parts when unset.
    pub fn display(&self) -> String {
        if self.full_address.trim().is_empty() {
            self.compose_full()
        } else {
            self.full_address.clone()
        }
    }

    /// Returns true if a postal code is present.
    pub fn has_postal_code(&self) -> bool {
        !self.postal_code.trim().is_empty()
    }
}

/// Anything that sits at an address.
///
/// This is the key extractor used for duplicate detection: two values are
/// duplicates when their addresses are canonically equal.
pub trait Locatable {
    /// Returns the address of this value.
    fn address(&self) -> &AddressRecord;
}

impl Locatable for AddressRecord {
    fn address(&self) -> &AddressRecord {
        self
    }
}
