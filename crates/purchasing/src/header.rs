use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use depot_core::{Amount, DomainError, DomainResult, UserId};

use crate::SettlementState;

/// Header fields submitted when a document is created.
///
/// `P` is the party id type (supplier or customer).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDocument<P> {
    pub number: String,
    pub party_id: P,
    pub date: NaiveDate,
    pub amount_payable: Amount,
    pub state: SettlementState,
    #[serde(default)]
    pub remarks: Option<String>,
}

/// Document header shared by purchases, supplier returns and customer returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentHeader<Id, P> {
    pub id: Id,
    pub number: String,
    pub party_id: P,
    pub date: NaiveDate,
    pub amount_payable: Amount,
    pub amount_paid: Amount,
    pub state: SettlementState,
    pub created_by: UserId,
    pub remarks: Option<String>,
}

impl<Id, P> DocumentHeader<Id, P> {
    /// Build a header from a draft.
    ///
    /// The paid amount equals the payable amount when the document is
    /// created settled and is zero otherwise.
    pub fn create(id: Id, draft: NewDocument<P>, created_by: UserId) -> DomainResult<Self> {
        let number = draft.number.trim();
        if number.is_empty() {
            return Err(DomainError::validation("document number must not be empty"));
        }
        if number.chars().count() > 100 {
            return Err(DomainError::validation("document number must be at most 100 characters"));
        }
        if draft.amount_payable.is_negative() {
            return Err(DomainError::validation("amount payable must not be negative"));
        }

        let amount_paid = match draft.state {
            SettlementState::Settled => draft.amount_payable,
            SettlementState::Outstanding => Amount::ZERO,
        };

        Ok(Self {
            id,
            number: number.to_string(),
            party_id: draft.party_id,
            date: draft.date,
            amount_payable: draft.amount_payable,
            amount_paid,
            state: draft.state,
            created_by,
            remarks: draft.remarks.filter(|r| !r.trim().is_empty()),
        })
    }

    /// Single-field state transition; amounts are left untouched.
    ///
    /// `amount_paid` is fixed when the document is created: it equals
    /// `amount_payable` only for documents created settled. Settling an
    /// outstanding document later keeps `amount_paid` at zero, so a settled
    /// header may legitimately report `amount_paid == 0`.
    pub fn set_state(&mut self, state: SettlementState) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use depot_core::{PurchaseListId, SupplierId};

    fn draft(state: SettlementState) -> NewDocument<SupplierId> {
        NewDocument {
            number: " JH202601010001 ".into(),
            party_id: SupplierId::new(),
            date: NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
            amount_payable: Amount::from_minor(4000),
            state,
            remarks: Some("  ".into()),
        }
    }

    #[test]
    fn settled_documents_are_fully_paid() {
        let h = DocumentHeader::create(PurchaseListId::new(), draft(SettlementState::Settled), UserId::new()).unwrap();
        assert_eq!(h.amount_paid, h.amount_payable);
        assert_eq!(h.number, "JH202601010001");
        assert_eq!(h.remarks, None);
    }

    #[test]
    fn outstanding_documents_start_unpaid() {
        let h = DocumentHeader::create(PurchaseListId::new(), draft(SettlementState::Outstanding), UserId::new()).unwrap();
        assert_eq!(h.amount_paid, Amount::ZERO);
    }

    #[test]
    fn set_state_leaves_amounts_alone() {
        let mut h = DocumentHeader::create(PurchaseListId::new(), draft(SettlementState::Outstanding), UserId::new()).unwrap();
        h.set_state(SettlementState::Settled);
        assert_eq!(h.state, SettlementState::Settled);
        assert_eq!(h.amount_paid, Amount::ZERO);
    }

    #[test]
    fn blank_number_is_rejected() {
        let mut d = draft(SettlementState::Settled);
        d.number = "   ".into();
        assert!(DocumentHeader::create(PurchaseListId::new(), d, UserId::new()).is_err());
    }
}
