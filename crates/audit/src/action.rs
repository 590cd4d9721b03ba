use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of action recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActionKind {
    Insert,
    Select,
    Update,
    Delete,
    Login,
    Logout,
}

impl ActionKind {
    /// Stable storage/wire code.
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::Insert => "INSERT",
            ActionKind::Select => "SELECT",
            ActionKind::Update => "UPDATE",
            ActionKind::Delete => "DELETE",
            ActionKind::Login => "LOGIN",
            ActionKind::Logout => "LOGOUT",
        }
    }
}

impl core::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown action kind '{0}'")]
pub struct UnknownActionKind(pub String);

impl FromStr for ActionKind {
    type Err = UnknownActionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "INSERT" => Ok(ActionKind::Insert),
            "SELECT" => Ok(ActionKind::Select),
            "UPDATE" => Ok(ActionKind::Update),
            "DELETE" => Ok(ActionKind::Delete),
            "LOGIN" => Ok(ActionKind::Login),
            "LOGOUT" => Ok(ActionKind::Logout),
            _ => Err(UnknownActionKind(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("delete".parse::<ActionKind>().unwrap(), ActionKind::Delete);
        assert_eq!(" Login ".parse::<ActionKind>().unwrap(), ActionKind::Login);
    }

    #[test]
    fn serde_uses_storage_codes() {
        let json = serde_json::to_string(&ActionKind::Insert).unwrap();
        assert_eq!(json, "\"INSERT\"");
    }

    #[test]
    fn unknown_kind_is_an_error() {
        assert!("PURGE".parse::<ActionKind>().is_err());
    }
}
