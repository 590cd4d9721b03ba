//! Audit log query model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{ActionKind, LogEntry};

/// Pagination parameters for log queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    /// Maximum number of entries to return.
    pub limit: u32,
    /// Offset for pagination (0-based).
    pub offset: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            limit: 50,
            offset: 0,
        }
    }
}

impl Pagination {
    pub fn new(limit: Option<u32>, offset: Option<u32>) -> Self {
        Self {
            limit: limit.unwrap_or(50).clamp(1, 1000),
            offset: offset.unwrap_or(0),
        }
    }
}

/// Filter criteria for log queries. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogFilter {
    pub kind: Option<ActionKind>,
    /// Exact username of the actor.
    pub username: Option<String>,
    /// Inclusive lower bound.
    pub occurred_after: Option<DateTime<Utc>>,
    /// Inclusive upper bound.
    pub occurred_before: Option<DateTime<Utc>>,
}

impl LogFilter {
    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(kind) = self.kind {
            if entry.kind() != kind {
                return false;
            }
        }
        if let Some(username) = &self.username {
            if entry.actor().map(|a| a.username.as_str()) != Some(username.as_str()) {
                return false;
            }
        }
        if let Some(after) = self.occurred_after {
            if entry.occurred_at() < after {
                return false;
            }
        }
        if let Some(before) = self.occurred_before {
            if entry.occurred_at() > before {
                return false;
            }
        }
        true
    }
}

/// One page of log entries, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct LogPage {
    pub entries: Vec<LogEntry>,
    pub total: u64,
    pub pagination: Pagination,
    pub has_more: bool,
}

impl LogPage {
    pub fn new(entries: Vec<LogEntry>, total: u64, pagination: Pagination) -> Self {
        let has_more = u64::from(pagination.offset) + (entries.len() as u64) < total;
        Self {
            entries,
            total,
            pagination,
            has_more,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Actor;
    use chrono::Duration;
    use depot_core::UserId;

    fn entry(kind: ActionKind, user: &str, at: DateTime<Utc>) -> LogEntry {
        LogEntry::new(
            depot_core::LogId::new(),
            kind,
            "x",
            at,
            Some(Actor {
                user_id: UserId::new(),
                username: user.to_string(),
            }),
        )
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(LogFilter::default().matches(&entry(ActionKind::Select, "a", Utc::now())));
    }

    #[test]
    fn time_bounds_are_inclusive() {
        let at = Utc::now();
        let filter = LogFilter {
            occurred_after: Some(at),
            occurred_before: Some(at),
            ..Default::default()
        };
        assert!(filter.matches(&entry(ActionKind::Insert, "a", at)));
        assert!(!filter.matches(&entry(ActionKind::Insert, "a", at + Duration::seconds(1))));
    }

    #[test]
    fn kind_and_username_must_both_match() {
        let filter = LogFilter {
            kind: Some(ActionKind::Delete),
            username: Some("admin".into()),
            ..Default::default()
        };
        assert!(filter.matches(&entry(ActionKind::Delete, "admin", Utc::now())));
        assert!(!filter.matches(&entry(ActionKind::Delete, "bob", Utc::now())));
        assert!(!filter.matches(&entry(ActionKind::Insert, "admin", Utc::now())));
    }

    #[test]
    fn page_reports_more_results() {
        let page = LogPage::new(vec![], 10, Pagination { limit: 5, offset: 5 });
        assert!(!page.has_more);
        let page = LogPage::new(vec![entry(ActionKind::Select, "a", Utc::now())], 10, Pagination { limit: 1, offset: 0 });
        assert!(page.has_more);
    }
}
