use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use depot_core::{LogId, UserId};

use crate::ActionKind;

/// Who performed a logged action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: UserId,
    pub username: String,
}

/// One audit log entry.
///
/// `actor` is `None` only for actions without an authenticated identity
/// (e.g. a failed login for an unknown username).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    id: LogId,
    kind: ActionKind,
    description: String,
    occurred_at: DateTime<Utc>,
    actor: Option<Actor>,
}

impl LogEntry {
    pub fn new(
        id: LogId,
        kind: ActionKind,
        description: impl Into<String>,
        occurred_at: DateTime<Utc>,
        actor: Option<Actor>,
    ) -> Self {
        Self {
            id,
            kind,
            description: description.into(),
            occurred_at,
            actor,
        }
    }

    /// Entry stamped with a fresh id and the current time.
    pub fn now(kind: ActionKind, description: impl Into<String>, actor: Option<Actor>) -> Self {
        Self::new(LogId::new(), kind, description, Utc::now(), actor)
    }

    pub fn id(&self) -> LogId {
        self.id
    }

    pub fn kind(&self) -> ActionKind {
        self.kind
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn actor(&self) -> Option<&Actor> {
        self.actor.as_ref()
    }
}
