use serde::{Deserialize, Serialize};

use depot_core::{DomainError, DomainResult};

/// Settlement state of a document header.
///
/// For purchases `Settled` means paid; for returns it means the goods (or
/// money) have been returned. Stored as the numeric codes 1 and 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementState {
    Settled,
    Outstanding,
}

impl SettlementState {
    pub const fn code(self) -> i16 {
        match self {
            SettlementState::Settled => 1,
            SettlementState::Outstanding => 2,
        }
    }

    pub fn from_code(code: i16) -> DomainResult<Self> {
        match code {
            1 => Ok(SettlementState::Settled),
            2 => Ok(SettlementState::Outstanding),
            other => Err(DomainError::validation(format!("unknown settlement state code {other}"))),
        }
    }

    /// Accepts either the numeric code or the lowercase name.
    pub fn parse(s: &str) -> DomainResult<Self> {
        match s.trim() {
            "1" | "settled" => Ok(SettlementState::Settled),
            "2" | "outstanding" => Ok(SettlementState::Outstanding),
            other => Err(DomainError::validation(format!("unknown settlement state '{other}'"))),
        }
    }
}
