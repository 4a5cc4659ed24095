//! Shipping and billing addresses.

use boutique_core::{AddressId, AddressType, UserId};

/// A stored address.
///
/// At most one address per `(user_id, address_type)` has `default` set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    pub fields: AddressFields,
    pub address_type: AddressType,
    pub default: bool,
}

/// The user-entered part of an address.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressFields {
    pub name: String,
    pub street_address: String,
    pub apartment_address: Option<String>,
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
    pub zip: String,
}

impl AddressFields {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("name", &self.name),
            ("street address", &self.street_address),
            ("country", &self.country),
            ("zip", &self.zip),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(label, _)| label)
        .collect()
    }

    /// Copy with surrounding whitespace removed and an empty apartment
    /// collapsed to `None`.
    #[must_use]
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_owned(),
            street_address: self.street_address.trim().to_owned(),
            apartment_address: self
                .apartment_address
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            country: self.country.trim().to_ascii_uppercase(),
            zip: self.zip.trim().to_owned(),
        }
    }
}

/// Input for inserting an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAddress {
    pub user_id: UserId,
    pub fields: AddressFields,
    pub address_type: AddressType,
}

impl NewAddress {
    /// A new, independent record carrying `address`'s fields under a
    /// different type.
    #[must_use]
    pub fn copy_as(address: &Address, address_type: AddressType) -> Self {
        Self {
            user_id: address.user_id,
            fields: address.fields.clone(),
            address_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_lists_blank_required_fields() {
        let fields = AddressFields {
            name: "Ada".to_owned(),
            street_address: "  ".to_owned(),
            apartment_address: None,
            country: String::new(),
            zip: "1000".to_owned(),
        };
        assert_eq!(fields.missing_fields(), vec!["street address", "country"]);
    }

    #[test]
    fn test_apartment_is_optional() {
        let fields = AddressFields {
            name: "Ada".to_owned(),
            street_address: "1 Main St".to_owned(),
            apartment_address: Some("   ".to_owned()),
            country: "be".to_owned(),
            zip: "1000".to_owned(),
        };
        assert!(fields.missing_fields().is_empty());

        let trimmed = fields.trimmed();
        assert_eq!(trimmed.apartment_address, None);
        assert_eq!(trimmed.country, "BE");
    }
}
