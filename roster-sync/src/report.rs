//! Per-pass outcome records.

use chrono::{DateTime, Utc};
use serde::Serialize;

use roster_core::Status;

use crate::reconciler::{Action, Mode};

/// What happened to one data row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RowResult {
    /// Already `OK`; nothing was called.
    Converged,
    Created,
    /// Torn down (or found missing) and created again.
    Recreated,
    CreateFailed { reason: String },
    Verified,
    VerifyFailed { reason: String },
    /// Malformed row; skipped and never retried.
    Invalid { reason: String },
}

impl RowResult {
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            RowResult::CreateFailed { .. } | RowResult::VerifyFailed { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowOutcome {
    pub row_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,
    pub action: Action,
    pub result: RowResult,
    /// Tolerated failure of the delete that precedes a recreate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_written: Option<Status>,
    /// Calls made to write the status back; `0` when nothing was written.
    pub write_attempts: u32,
}

impl RowOutcome {
    pub(crate) fn invalid(row_index: usize, reason: &str) -> Self {
        Self {
            row_index,
            login: None,
            resource: None,
            action: Action::Invalid,
            result: RowResult::Invalid {
                reason: reason.to_string(),
            },
            delete_error: None,
            status_written: None,
            write_attempts: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub rows: usize,
    pub created: usize,
    pub verified: usize,
    pub converged: usize,
    pub failed: usize,
    pub invalid: usize,
}

impl PassSummary {
    fn tally(rows: &[RowOutcome]) -> Self {
        let mut summary = PassSummary {
            rows: rows.len(),
            ..Default::default()
        };
        for row in rows {
            match row.result {
                RowResult::Created | RowResult::Recreated => summary.created += 1,
                RowResult::Verified => summary.verified += 1,
                RowResult::Converged => summary.converged += 1,
                RowResult::CreateFailed { .. } | RowResult::VerifyFailed { .. } => {
                    summary.failed += 1
                }
                RowResult::Invalid { .. } => summary.invalid += 1,
            }
        }
        summary
    }
}

/// Outcome of one full pass, rows in sheet order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub mode: Mode,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: PassSummary,
    pub rows: Vec<RowOutcome>,
}

impl PassReport {
    pub(crate) fn finish(mode: Mode, started_at: DateTime<Utc>, rows: Vec<RowOutcome>) -> Self {
        Self {
            mode,
            started_at,
            finished_at: Utc::now(),
            summary: PassSummary::tally(&rows),
            rows,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(result: RowResult) -> RowOutcome {
        RowOutcome {
            row_index: 0,
            login: Some("alice".into()),
            resource: Some("ada".into()),
            action: Action::Create,
            result,
            delete_error: None,
            status_written: Some(Status::Ok),
            write_attempts: 1,
        }
    }

    #[test]
    fn tally_counts_each_kind() {
        let rows = vec![
            outcome(RowResult::Created),
            outcome(RowResult::Recreated),
            outcome(RowResult::CreateFailed {
                reason: "x".into(),
            }),
            outcome(RowResult::Converged),
            RowOutcome::invalid(4, "too few columns"),
        ];
        let summary = PassSummary::tally(&rows);
        assert_eq!(
            summary,
            PassSummary {
                rows: 5,
                created: 2,
                verified: 0,
                converged: 1,
                failed: 1,
                invalid: 1,
            }
        );
    }

    #[test]
    fn row_result_serializes_with_kind_tag() {
        let json = serde_json::to_value(RowResult::CreateFailed {
            reason: "taken".into(),
        })
        .unwrap();
        assert_eq!(json["kind"], "create_failed");
        assert_eq!(json["reason"], "taken");
    }

    #[test]
    fn invalid_rows_omit_login_and_resource() {
        let json = serde_json::to_value(RowOutcome::invalid(2, "too few columns")).unwrap();
        assert!(json.get("login").is_none());
        assert_eq!(json["action"], "invalid");
        assert_eq!(json["write_attempts"], 0);
    }
}
