//! Domain types for roster reconciliation.
//!
//! A roster row is addressed by its 0-based position among the data rows
//! (header excluded). That index is stable for one pass and is the only
//! handle used to write a status back.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Opaque grouping key for a roster row (a hosting-service group/namespace).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TeamName(pub String);

impl fmt::Display for TeamName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for TeamName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TeamName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Account identifier on the hosting service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LoginId(pub String);

impl fmt::Display for LoginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for LoginId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for LoginId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Normalized resource name derived from a display name.
///
/// Only ever built through [`crate::normalize_name`]; never written back to the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceName(pub String);

impl ResourceName {
    pub fn from_display_name(display_name: &str) -> Self {
        Self(crate::parser::normalize_name(display_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Persisted per-row status flag.
///
/// Cell text is matched exactly: anything other than `OK` or `PROCESSING`
/// (including an empty cell or a missing column) reads as [`Status::Absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Absent,
    Ok,
    Processing,
}

impl Status {
    pub const OK_CELL: &'static str = "OK";
    pub const PROCESSING_CELL: &'static str = "PROCESSING";

    pub fn from_cell(cell: Option<&str>) -> Self {
        match cell {
            Some(Self::OK_CELL) => Status::Ok,
            Some(Self::PROCESSING_CELL) => Status::Processing,
            _ => Status::Absent,
        }
    }

    /// Text written into the status cell.
    pub fn as_cell(&self) -> &'static str {
        match self {
            Status::Absent => "",
            Status::Ok => Self::OK_CELL,
            Status::Processing => Self::PROCESSING_CELL,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Absent => write!(f, "absent"),
            other => write!(f, "{}", other.as_cell()),
        }
    }
}

// ---------------------------------------------------------------------------
// Roster entry
// ---------------------------------------------------------------------------

/// One validated roster row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    /// 0-based position among data rows (header excluded).
    pub row_index: usize,
    pub team: TeamName,
    pub login: LoginId,
    /// Raw human name as entered in the sheet.
    pub display_name: String,
    pub resource_name: ResourceName,
    pub status: Status,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newtype_display() {
        assert_eq!(TeamName::from("team1").to_string(), "team1");
        assert_eq!(LoginId::from("alice").to_string(), "alice");
        assert_eq!(
            ResourceName::from_display_name("Ada Lovelace").to_string(),
            "ada-lovelace"
        );
    }

    #[test]
    fn status_cell_mapping() {
        assert_eq!(Status::from_cell(None), Status::Absent);
        assert_eq!(Status::from_cell(Some("")), Status::Absent);
        assert_eq!(Status::from_cell(Some("OK")), Status::Ok);
        assert_eq!(Status::from_cell(Some("PROCESSING")), Status::Processing);
        assert_eq!(Status::from_cell(Some("ok")), Status::Absent);
    }

    #[test]
    fn status_cell_text() {
        assert_eq!(Status::Ok.as_cell(), "OK");
        assert_eq!(Status::Processing.as_cell(), "PROCESSING");
        assert_eq!(Status::Absent.to_string(), "absent");
    }
}
