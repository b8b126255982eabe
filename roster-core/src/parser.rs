//! Raw sheet rows → [`RosterEntry`].
//!
//! Columns are positional: `1` team, `2` login, `3` display name, `4` status.
//! Column `0` is whatever the form puts there (usually a timestamp) and is ignored.

use crate::error::ParseError;
use crate::types::{LoginId, ResourceName, RosterEntry, Status, TeamName};

/// Minimum number of cells a data row needs to be reconciled.
pub const MIN_CELLS: usize = 4;

const TEAM_COL: usize = 1;
const LOGIN_COL: usize = 2;
const NAME_COL: usize = 3;

/// Index of the status cell within a row, counted from the first column read.
///
/// The configured status column must sit exactly this many columns right of
/// the first column; see [`crate::Settings::validate`].
pub const STATUS_CELL: usize = 4;

/// Lower-case `display_name` and join its whitespace-separated words with `-`.
///
/// Idempotent: `normalize_name(&normalize_name(x)) == normalize_name(x)`.
pub fn normalize_name(display_name: &str) -> String {
    display_name
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
        .to_lowercase()
}

/// Parse a single data row. `row_index` is the 0-based data-row position.
pub fn parse_row<S: AsRef<str>>(cells: &[S], row_index: usize) -> Result<RosterEntry, ParseError> {
    if cells.len() < MIN_CELLS {
        return Err(ParseError::TooFewColumns {
            row_index,
            found: cells.len(),
            expected: MIN_CELLS,
        });
    }

    let display_name = cells[NAME_COL].as_ref().to_owned();

    Ok(RosterEntry {
        row_index,
        team: TeamName::from(cells[TEAM_COL].as_ref()),
        login: LoginId::from(cells[LOGIN_COL].as_ref()),
        resource_name: ResourceName::from_display_name(&display_name),
        display_name,
        status: Status::from_cell(cells.get(STATUS_CELL).map(|c| c.as_ref())),
    })
}

/// Parse every data row of a full sheet read. The first row is the header and is skipped.
///
/// Results stay in row order; failures are returned, not dropped, so callers can
/// report them.
pub fn parse_rows<S: AsRef<str>>(rows: &[Vec<S>]) -> Vec<Result<RosterEntry, ParseError>> {
    rows.iter()
        .skip(1)
        .enumerate()
        .map(|(row_index, cells)| parse_row(cells, row_index))
        .collect()
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
