//! # roster-sync
//!
//! Reconciliation engine: walks every roster row once, in order, provisions
//! (or verifies) the matching hosting-service resource, and writes the
//! outcome back to the sheet under an exponential-backoff [`RetryPolicy`].
//!
//! Build a [`Reconciler`] from a [`SheetGateway`] and a [`HostingGateway`],
//! then call [`Reconciler::run`] or [`Reconciler::plan`].

pub mod error;
pub mod gateway;
pub mod memory;
pub mod reconciler;
pub mod report;
pub mod retry;

pub use error::{HostingError, RetryExhausted, SheetReadError, SyncError, TransientWriteError};
pub use gateway::{HostingGateway, SheetGateway};
pub use reconciler::{action_for, plan_pass, Action, Mode, PlannedRow, Reconciler};
pub use report::{PassReport, PassSummary, RowOutcome, RowResult};
pub use retry::{RecordingSleeper, Retried, RetryPolicy, Sleeper, ThreadSleeper};
