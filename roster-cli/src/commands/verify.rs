//! `roster verify`: check every roster login against GitLab.

use anyhow::Result;
use clap::Args;
use roster_sync::Mode;

/// Arguments for `roster verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl VerifyArgs {
    pub fn run(self) -> Result<()> {
        super::run_pass(Mode::Verify, false, self.json)
    }
}
