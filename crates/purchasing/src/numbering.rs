//! Business document numbers: a kind prefix, the date as `yyyyMMdd` and a
//! four-digit daily sequence, e.g. `JH202603140001`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use depot_core::{DomainError, DomainResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    Purchase,
    Return,
    CustomerReturn,
}

impl DocumentKind {
    pub const fn prefix(self) -> &'static str {
        match self {
            DocumentKind::Purchase => "JH",
            DocumentKind::Return => "TH",
            DocumentKind::CustomerReturn => "XT",
        }
    }

    /// Prefix plus date, shared by every number issued that day.
    pub fn day_prefix(self, date: NaiveDate) -> String {
        format!("{}{}", self.prefix(), date.format("%Y%m%d"))
    }
}

/// Digits in the daily sequence part of a generated number.
pub const SEQUENCE_DIGITS: usize = 4;

/// Whether `number` has the generated shape: `prefix` followed by exactly
/// [`SEQUENCE_DIGITS`] ASCII digits. Hand-entered numbers that merely share
/// the prefix do not take part in sequencing.
pub fn is_sequenced(prefix: &str, number: &str) -> bool {
    number
        .strip_prefix(prefix)
        .is_some_and(|tail| tail.len() == SEQUENCE_DIGITS && tail.bytes().all(|b| b.is_ascii_digit()))
}

/// Next number for `date`, given the highest sequenced number already
/// issued that day.
pub fn next_number(kind: DocumentKind, date: NaiveDate, latest: Option<&str>) -> DomainResult<String> {
    let prefix = kind.day_prefix(date);
    let seq = match latest {
        None => 1,
        Some(latest) => {
            let tail = latest
                .strip_prefix(prefix.as_str())
                .ok_or_else(|| DomainError::invariant(format!("'{latest}' is not a {prefix} number")))?;
            let current: u32 = tail
                .parse()
                .map_err(|_| DomainError::invariant(format!("'{latest}' has no numeric sequence")))?;
            current + 1
        }
    };
    if seq > 9999 {
        return Err(DomainError::validation(format!("daily sequence exhausted for {prefix}")));
    }
    Ok(format!("{prefix}{seq:04}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 14).unwrap()
    }

    #[test]
    fn first_number_of_the_day() {
        assert_eq!(next_number(DocumentKind::Purchase, day(), None).unwrap(), "JH202603140001");
        assert_eq!(next_number(DocumentKind::CustomerReturn, day(), None).unwrap(), "XT202603140001");
    }

    #[test]
    fn increments_the_latest() {
        let next = next_number(DocumentKind::Return, day(), Some("TH202603140041")).unwrap();
        assert_eq!(next, "TH202603140042");
    }

    #[test]
    fn foreign_latest_is_rejected() {
        assert!(next_number(DocumentKind::Purchase, day(), Some("TH202603140001")).is_err());
    }

    #[test]
    fn only_prefix_plus_four_digits_is_sequenced() {
        let prefix = DocumentKind::Purchase.day_prefix(day());
        assert!(is_sequenced(&prefix, "JH202603140007"));
        assert!(!is_sequenced(&prefix, "JH20260314-manual"));
        assert!(!is_sequenced(&prefix, "JH202603140001A"));
        assert!(!is_sequenced(&prefix, "JH2026031400012"));
        assert!(!is_sequenced(&prefix, "TH202603140001"));
    }

    #[test]
    fn sequence_is_bounded() {
        assert!(next_number(DocumentKind::Purchase, day(), Some("JH202603149999")).is_err());
    }
}
