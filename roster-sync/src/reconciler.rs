//! Per-row state machine.
//!
//! ## Provisioning
//!
//! | status at pass start | hosting calls              | status written            |
//! |----------------------|----------------------------|---------------------------|
//! | `OK`                 | none                       | none                      |
//! | absent               | create                     | `OK`, or `PROCESSING` on failure |
//! | `PROCESSING`         | delete (errors tolerated), then create | `OK`, or `PROCESSING` on failure |
//!
//! `PROCESSING` at the start of a pass means an earlier attempt died mid-flight,
//! so the remote resource may or may not exist. Deleting unconditionally before
//! recreating converges from either state.
//!
//! ## Verification
//!
//! Every valid row gets one verify call and is then marked `OK`, whatever the
//! verify result was.
//!
//! In both modes the sheet is read once per pass, rows are handled strictly in
//! order, and each status write blocks under the [`RetryPolicy`] before the next
//! row starts.

use std::fmt;

use chrono::Utc;
use serde::Serialize;

use roster_core::{parse_rows, ParseError, RosterEntry, Status};

use crate::error::{SyncError, TransientWriteError};
use crate::gateway::{HostingGateway, SheetGateway};
use crate::report::{PassReport, RowOutcome, RowResult};
use crate::retry::{RetryPolicy, Sleeper, ThreadSleeper};

// ---------------------------------------------------------------------------
// Mode / action
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Ensure one repository per roster row.
    Provision,
    /// Check that every roster login exists.
    Verify,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Provision => write!(f, "provision"),
            Mode::Verify => write!(f, "verify"),
        }
    }
}

/// What a pass does with a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Skip,
    Create,
    DeleteAndRecreate,
    Verify,
    Invalid,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Skip => write!(f, "skip"),
            Action::Create => write!(f, "create"),
            Action::DeleteAndRecreate => write!(f, "delete+recreate"),
            Action::Verify => write!(f, "verify"),
            Action::Invalid => write!(f, "invalid"),
        }
    }
}

/// Decide the action for a valid row from the status it had when the pass started.
pub fn action_for(mode: Mode, status: Status) -> Action {
    match (mode, status) {
        (Mode::Verify, _) => Action::Verify,
        (Mode::Provision, Status::Ok) => Action::Skip,
        (Mode::Provision, Status::Processing) => Action::DeleteAndRecreate,
        (Mode::Provision, Status::Absent) => Action::Create,
    }
}

/// Dry-run view of one row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlannedRow {
    pub row_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// Drives one pass over the roster.
///
/// Gateways are taken by value; pass `&mut gateway` to keep access to them
/// after the pass.
pub struct Reconciler<S, H, Z = ThreadSleeper> {
    sheet: S,
    hosting: H,
    retry: RetryPolicy,
    sleeper: Z,
}

impl<S, H> Reconciler<S, H, ThreadSleeper>
where
    S: SheetGateway,
    H: HostingGateway,
{
    pub fn new(sheet: S, hosting: H, retry: RetryPolicy) -> Self {
        Self {
            sheet,
            hosting,
            retry,
            sleeper: ThreadSleeper,
        }
    }
}

impl<S, H, Z> Reconciler<S, H, Z>
where
    S: SheetGateway,
    H: HostingGateway,
    Z: Sleeper,
{
    /// Replace the sleeper used between write-back attempts.
    pub fn with_sleeper<Z2: Sleeper>(self, sleeper: Z2) -> Reconciler<S, H, Z2> {
        Reconciler {
            sheet: self.sheet,
            hosting: self.hosting,
            retry: self.retry,
            sleeper,
        }
    }

    pub fn sleeper(&self) -> &Z {
        &self.sleeper
    }

    /// Run a full pass.
    ///
    /// Per-row failures never abort the pass. The only errors are a failed
    /// initial read and, with a capped retry policy, an exhausted write-back.
    pub fn run(&mut self, mode: Mode) -> Result<PassReport, SyncError> {
        let started_at = Utc::now();
        let entries = self.read_entries()?;
        tracing::info!("{mode} pass started: {} data rows", entries.len());

        let mut rows = Vec::with_capacity(entries.len());
        for parsed in entries {
            let outcome = match parsed {
                Err(err) => {
                    tracing::warn!("skipping invalid row: {err}");
                    RowOutcome::invalid(row_index_of(&err), err.reason())
                }
                Ok(entry) => match mode {
                    Mode::Provision => self.provision(&entry)?,
                    Mode::Verify => self.verify(&entry)?,
                },
            };
            rows.push(outcome);
        }

        let report = PassReport::finish(mode, started_at, rows);
        let s = &report.summary;
        tracing::info!(
            "{mode} pass finished: {} rows, {} created, {} verified, {} converged, {} failed, {} invalid",
            s.rows,
            s.created,
            s.verified,
            s.converged,
            s.failed,
            s.invalid
        );
        Ok(report)
    }

    /// Dry run; see [`plan_pass`].
    pub fn plan(&mut self, mode: Mode) -> Result<Vec<PlannedRow>, SyncError> {
        plan_pass(&mut self.sheet, mode)
    }

    fn read_entries(&mut self) -> Result<Vec<Result<RosterEntry, ParseError>>, SyncError> {
        let rows = self.sheet.read_all_rows()?;
        Ok(parse_rows(&rows))
    }

    fn provision(&mut self, entry: &RosterEntry) -> Result<RowOutcome, SyncError> {
        let action = action_for(Mode::Provision, entry.status);
        let mut outcome = outcome_for(entry, action);

        if action == Action::Skip {
            tracing::debug!("row {}: '{}' already OK", entry.row_index, entry.resource_name);
            return Ok(outcome);
        }

        if action == Action::DeleteAndRecreate {
            if let Err(err) = self
                .hosting
                .delete_resource(&entry.resource_name, &entry.team)
            {
                tracing::warn!(
                    "row {}: can't delete '{}/{}': {err}",
                    entry.row_index,
                    entry.team,
                    entry.resource_name
                );
                outcome.delete_error = Some(err.to_string());
            }
        }

        let (result, status) =
            match self
                .hosting
                .create_resource(&entry.login, &entry.resource_name, &entry.team)
            {
                Ok(()) => {
                    tracing::info!(
                        "row {}: created '{}/{}' for {}",
                        entry.row_index,
                        entry.team,
                        entry.resource_name,
                        entry.login
                    );
                    let result = if action == Action::DeleteAndRecreate {
                        RowResult::Recreated
                    } else {
                        RowResult::Created
                    };
                    (result, Status::Ok)
                }
                Err(err) => {
                    tracing::error!(
                        "row {}: can't create '{}/{}' for {}: {err}",
                        entry.row_index,
                        entry.team,
                        entry.resource_name,
                        entry.login
                    );
                    let reason = err.to_string();
                    (RowResult::CreateFailed { reason }, Status::Processing)
                }
            };

        outcome.result = result;
        outcome.write_attempts = self.write_status(entry.row_index, status)?;
        outcome.status_written = Some(status);
        Ok(outcome)
    }

    fn verify(&mut self, entry: &RosterEntry) -> Result<RowOutcome, SyncError> {
        let mut outcome = outcome_for(entry, Action::Verify);

        outcome.result = match self.hosting.verify_login(&entry.login) {
            Ok(()) => RowResult::Verified,
            Err(err) => {
                tracing::error!("row {}: invalid login '{}': {err}", entry.row_index, entry.login);
                RowResult::VerifyFailed {
                    reason: err.to_string(),
                }
            }
        };

        // Marked OK on both branches; the report keeps the verify result.
        outcome.write_attempts = self.write_status(entry.row_index, Status::Ok)?;
        outcome.status_written = Some(Status::Ok);
        Ok(outcome)
    }

    /// Write `status` for `row_index`, blocking until it lands. Returns the attempt count.
    fn write_status(&mut self, row_index: usize, status: Status) -> Result<u32, SyncError> {
        let sheet = &mut self.sheet;
        let written = self
            .retry
            .execute_with(&mut self.sleeper, || -> Result<(), TransientWriteError> {
                sheet.write_status(row_index, status)
            })
            .map_err(|source| SyncError::WriteExhausted { row_index, source })?;
        if written.attempts > 1 {
            tracing::info!(
                "row {row_index}: status {status} written after {} attempts",
                written.attempts
            );
        }
        Ok(written.attempts)
    }
}

/// Read and classify every row without calling the hosting service or
/// writing to the sheet.
pub fn plan_pass<S: SheetGateway + ?Sized>(
    sheet: &mut S,
    mode: Mode,
) -> Result<Vec<PlannedRow>, SyncError> {
    let rows = sheet.read_all_rows()?;
    let planned = parse_rows(&rows)
        .into_iter()
        .map(|parsed| match parsed {
            Ok(entry) => PlannedRow {
                row_index: entry.row_index,
                action: action_for(mode, entry.status),
                login: Some(entry.login.0),
                resource: Some(entry.resource_name.0),
                status: Some(entry.status),
                reason: None,
            },
            Err(err) => PlannedRow {
                row_index: row_index_of(&err),
                login: None,
                resource: None,
                status: None,
                action: Action::Invalid,
                reason: Some(err.reason().to_string()),
            },
        })
        .collect();
    Ok(planned)
}

fn outcome_for(entry: &RosterEntry, action: Action) -> RowOutcome {
    RowOutcome {
        row_index: entry.row_index,
        login: Some(entry.login.0.clone()),
        resource: Some(entry.resource_name.0.clone()),
        action,
        result: RowResult::Converged,
        delete_error: None,
        status_written: None,
        write_attempts: 0,
    }
}

fn row_index_of(err: &ParseError) -> usize {
    match err {
        ParseError::TooFewColumns { row_index, .. } => *row_index,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
