//! Roster core library: domain types, row parsing, configuration, errors.
//!
//! Public API surface:
//! - [`types`]: newtypes, [`Status`] and [`RosterEntry`]
//! - [`parser`]: raw sheet row → [`RosterEntry`]
//! - [`config`]: `~/.roster/config.yaml` load / save
//! - [`error`]: [`ParseError`], [`ConfigError`]

pub mod config;
pub mod error;
pub mod parser;
pub mod types;

pub use config::{HostingSettings, RetrySettings, Settings, SheetSettings};
pub use error::{ConfigError, ParseError};
pub use parser::{normalize_name, parse_row, parse_rows, MIN_CELLS, STATUS_CELL};
pub use types::{LoginId, ResourceName, RosterEntry, Status, TeamName};
