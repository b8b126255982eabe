//! In-memory gateways for tests and local experiments.
//!
//! [`MemorySheet`] holds a full sheet (header row included) and applies status
//! writes to its status column. [`MemoryHosting`] tracks which resources exist
//! and records every call made to it, in order.
//!
//! ## Limitations
//!
//! - No persistence: all state is lost when the value is dropped
//! - Failure injection is count/name based, not random

use std::collections::{BTreeSet, HashSet};

use roster_core::{LoginId, ResourceName, Status, TeamName, STATUS_CELL};

use crate::error::{HostingError, SheetReadError, TransientWriteError};
use crate::gateway::{HostingGateway, SheetGateway};

// ---------------------------------------------------------------------------
// Sheet
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct MemorySheet {
    rows: Vec<Vec<String>>,
    read_error: Option<String>,
    failing_writes: u32,
    reads: u32,
    write_calls: u32,
    writes: Vec<(usize, Status)>,
}

impl MemorySheet {
    /// `rows[0]` is the header.
    pub fn new(rows: Vec<Vec<String>>) -> Self {
        Self {
            rows,
            ..Self::default()
        }
    }

    /// Build from string slices.
    pub fn from_cells(rows: &[&[&str]]) -> Self {
        Self::new(
            rows.iter()
                .map(|r| r.iter().map(|c| c.to_string()).collect())
                .collect(),
        )
    }

    /// Make the next `n` status writes fail.
    pub fn fail_next_writes(mut self, n: u32) -> Self {
        self.failing_writes = n;
        self
    }

    pub fn fail_reads(mut self, message: impl Into<String>) -> Self {
        self.read_error = Some(message.into());
        self
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Status cell text of data row `row_index`, if the cell exists.
    pub fn status_cell(&self, row_index: usize) -> Option<&str> {
        self.rows
            .get(row_index + 1)
            .and_then(|row| row.get(STATUS_CELL))
            .map(String::as_str)
    }

    /// Successful writes, in order.
    pub fn writes(&self) -> &[(usize, Status)] {
        &self.writes
    }

    /// Every write call, including failed ones.
    pub fn write_calls(&self) -> u32 {
        self.write_calls
    }

    pub fn reads(&self) -> u32 {
        self.reads
    }
}

impl SheetGateway for MemorySheet {
    fn read_all_rows(&mut self) -> Result<Vec<Vec<String>>, SheetReadError> {
        self.reads += 1;
        match &self.read_error {
            Some(message) => Err(SheetReadError::new(message.clone())),
            None => Ok(self.rows.clone()),
        }
    }

    fn write_status(&mut self, row_index: usize, status: Status) -> Result<(), TransientWriteError> {
        self.write_calls += 1;
        if self.failing_writes > 0 {
            self.failing_writes -= 1;
            return Err(TransientWriteError::new("quota exceeded"));
        }

        let sheet_row = row_index + 1;
        if self.rows.len() <= sheet_row {
            self.rows.resize(sheet_row + 1, Vec::new());
        }
        let row = &mut self.rows[sheet_row];
        if row.len() <= STATUS_CELL {
            row.resize(STATUS_CELL + 1, String::new());
        }
        row[STATUS_CELL] = status.as_cell().to_string();
        self.writes.push((row_index, status));
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Hosting
// ---------------------------------------------------------------------------

/// One recorded hosting call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostingCall {
    Create {
        login: String,
        name: String,
        team: String,
    },
    Delete {
        name: String,
        team: String,
    },
    Verify {
        login: String,
    },
}

impl HostingCall {
    pub fn create(login: &str, name: &str, team: &str) -> Self {
        HostingCall::Create {
            login: login.into(),
            name: name.into(),
            team: team.into(),
        }
    }

    pub fn delete(name: &str, team: &str) -> Self {
        HostingCall::Delete {
            name: name.into(),
            team: team.into(),
        }
    }

    pub fn verify(login: &str) -> Self {
        HostingCall::Verify {
            login: login.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryHosting {
    /// `(team, name)` pairs that currently exist.
    existing: BTreeSet<(String, String)>,
    unknown_logins: HashSet<String>,
    failing_creates: HashSet<String>,
    failing_deletes: bool,
    calls: Vec<HostingCall>,
}

impl MemoryHosting {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-create a resource.
    pub fn with_resource(mut self, name: &str, team: &str) -> Self {
        self.existing.insert((team.to_string(), name.to_string()));
        self
    }

    pub fn with_unknown_login(mut self, login: &str) -> Self {
        self.unknown_logins.insert(login.to_string());
        self
    }

    /// Creates for `name` fail with a transport error.
    pub fn with_failing_create(mut self, name: &str) -> Self {
        self.failing_creates.insert(name.to_string());
        self
    }

    /// Every delete fails with a transport error, even for existing resources.
    pub fn with_failing_deletes(mut self) -> Self {
        self.failing_deletes = true;
        self
    }

    pub fn calls(&self) -> &[HostingCall] {
        &self.calls
    }

    pub fn exists(&self, name: &str, team: &str) -> bool {
        self.existing
            .contains(&(team.to_string(), name.to_string()))
    }
}

impl HostingGateway for MemoryHosting {
    fn create_resource(
        &mut self,
        login: &LoginId,
        name: &ResourceName,
        team: &TeamName,
    ) -> Result<(), HostingError> {
        self.calls
            .push(HostingCall::create(&login.0, name.as_str(), &team.0));

        if name.as_str().is_empty() {
            return Err(HostingError::Rejected("name can't be blank".into()));
        }
        if self.unknown_logins.contains(&login.0) {
            return Err(HostingError::UnknownLogin(login.0.clone()));
        }
        if self.failing_creates.contains(name.as_str()) {
            return Err(HostingError::Transport("connection reset".into()));
        }
        let key = (team.0.clone(), name.0.clone());
        if self.existing.contains(&key) {
            return Err(HostingError::Rejected(format!(
                "'{team}/{name}' has already been taken"
            )));
        }
        self.existing.insert(key);
        Ok(())
    }

    fn delete_resource(
        &mut self,
        name: &ResourceName,
        team: &TeamName,
    ) -> Result<(), HostingError> {
        self.calls.push(HostingCall::delete(name.as_str(), &team.0));

        if self.failing_deletes {
            return Err(HostingError::Transport("connection reset".into()));
        }
        if self.existing.remove(&(team.0.clone(), name.0.clone())) {
            Ok(())
        } else {
            Err(HostingError::NotFound(format!("{team}/{name}")))
        }
    }

    fn verify_login(&mut self, login: &LoginId) -> Result<(), HostingError> {
        self.calls.push(HostingCall::verify(&login.0));

        if self.unknown_logins.contains(&login.0) {
            Err(HostingError::UnknownLogin(login.0.clone()))
        } else {
            Ok(())
        }
    }
}
