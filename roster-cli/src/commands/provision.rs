//! `roster provision`: create repositories for every row not yet marked OK.

use anyhow::Result;
use clap::Args;
use roster_sync::Mode;

/// Arguments for `roster provision`.
#[derive(Args, Debug)]
pub struct ProvisionArgs {
    /// Show what each row would get without touching GitLab or the sheet.
    #[arg(long)]
    pub dry_run: bool,

    /// Emit machine-readable JSON.
    #[arg(long)]
    pub json: bool,
}

impl ProvisionArgs {
    pub fn run(self) -> Result<()> {
        super::run_pass(Mode::Provision, self.dry_run, self.json)
    }
}
