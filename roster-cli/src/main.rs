//! Roster: reconcile a course roster spreadsheet against GitLab.
//!
//! # Usage
//!
//! ```text
//! roster config init --spreadsheet <id> [--sheet-name ..] [--gitlab-url ..] [--force]
//! roster config show
//! roster provision [--dry-run] [--json]
//! roster verify [--json]
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{config::ConfigCommand, provision::ProvisionArgs, verify::VerifyArgs};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "roster",
    version,
    about = "Provision one GitLab repository per roster row and record the outcome in the sheet",
    long_about = None,
)]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create missing repositories and mark their rows OK.
    Provision(ProvisionArgs),

    /// Check every roster login exists and mark rows OK.
    Verify(VerifyArgs),

    /// Create or inspect ~/.roster/config.yaml.
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    match cli.command {
        Commands::Provision(args) => args.run(),
        Commands::Verify(args) => args.run(),
        Commands::Config { command } => commands::config::run(command),
    }
}

/// Logs go to stderr so `--json` output stays parseable.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    // Fails only if a subscriber is already installed; the pass runs either way.
    if let Err(err) = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init()
    {
        eprintln!("roster: logging not initialised: {err}");
    }
}
