use serde::{Deserialize, Serialize};

use depot_core::{CustomerId, DomainError, DomainResult, SupplierId};

/// Party kind: customer or supplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartyKind {
    Customer,
    Supplier,
}

impl core::fmt::Display for PartyKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PartyKind::Customer => f.write_str("customer"),
            PartyKind::Supplier => f.write_str("supplier"),
        }
    }
}

/// Contact information for a party.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    /// Contact person.
    pub contact: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// Validated name/contact/remarks shared by suppliers and customers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyDetails {
    pub name: String,
    pub contact: ContactInfo,
    pub remarks: Option<String>,
}

impl PartyDetails {
    pub fn new(name: &str, contact: ContactInfo, remarks: Option<String>) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("party name must not be empty"));
        }
        if name.chars().count() > 200 {
            return Err(DomainError::validation("party name must be at most 200 characters"));
        }
        Ok(Self {
            name: name.to_string(),
            contact,
            remarks,
        })
    }
}

/// A supplier goods are purchased from (and returned to).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Supplier {
    pub id: SupplierId,
    #[serde(flatten)]
    pub details: PartyDetails,
}

depot_core::impl_entity!(Supplier, SupplierId);

impl Supplier {
    pub fn new(id: SupplierId, details: PartyDetails) -> Self {
        Self { id, details }
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }
}

/// A customer goods are sold to (and returned from).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    #[serde(flatten)]
    pub details: PartyDetails,
}

depot_core::impl_entity!(Customer, CustomerId);

impl Customer {
    pub fn new(id: CustomerId, details: PartyDetails) -> Self {
        Self { id, details }
    }

    pub fn name(&self) -> &str {
        &self.details.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn details_trim_the_name() {
        let d = PartyDetails::new("  Acme Trading ", ContactInfo::default(), None).unwrap();
        assert_eq!(d.name, "Acme Trading");
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = PartyDetails::new(" ", ContactInfo::default(), None).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn supplier_serializes_flat() {
        let details = PartyDetails::new(
            "Acme",
            ContactInfo {
                contact: Some("Li Lei".into()),
                phone: Some("138".into()),
                address: None,
            },
            None,
        )
        .unwrap();
        let json = serde_json::to_value(Supplier::new(SupplierId::new(), details)).unwrap();
        assert_eq!(json["name"], "Acme");
        assert_eq!(json["contact"]["contact"], "Li Lei");
    }
}
