//! `roster config init` and `roster config show`

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use roster_core::{config, Settings};

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Write ~/.roster/config.yaml with defaults for everything not given.
    Init(InitArgs),

    /// Print the active configuration.
    Show,
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Google spreadsheet id (the long token in the sheet URL).
    #[arg(long)]
    pub spreadsheet: String,

    /// Tab holding the roster.
    #[arg(long)]
    pub sheet_name: Option<String>,

    /// Column letter of the status flag; team, login and name are read from
    /// the columns just before it.
    #[arg(long)]
    pub status_column: Option<String>,

    /// GitLab instance, e.g. https://gitlab.example.edu
    #[arg(long)]
    pub gitlab_url: Option<String>,

    /// Overwrite an existing config.
    #[arg(long)]
    pub force: bool,
}

pub fn run(cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Init(args) => init(args),
        ConfigCommand::Show => show(),
    }
}

fn init(args: InitArgs) -> Result<()> {
    let mut settings = Settings::new(args.spreadsheet);
    if let Some(name) = args.sheet_name {
        settings.sheet.sheet_name = name;
    }
    if let Some(column) = args.status_column {
        settings
            .sheet
            .set_status_column(&column)
            .context("bad --status-column")?;
    }
    if let Some(url) = args.gitlab_url {
        settings.hosting.api_base = gitlab_api_base(&url);
    }

    let path = config::init(&settings, args.force).context("failed to write roster config")?;
    println!("✓ Wrote {}", path.display());
    println!(
        "  Export {} and {} before running `roster provision`.",
        settings.sheet.token_env, settings.hosting.token_env
    );
    Ok(())
}

fn show() -> Result<()> {
    let settings = config::load().context("failed to load roster config")?;
    println!("# {}", config::config_path()?.display());
    print!(
        "{}",
        serde_yaml::to_string(&settings).context("failed to render config")?
    );
    Ok(())
}

/// Accept either an instance URL or its `/api/v4` base.
fn gitlab_api_base(url: &str) -> String {
    let trimmed = url.trim_end_matches('/');
    if trimmed.ends_with("/api/v4") {
        trimmed.to_string()
    } else {
        format!("{trimmed}/api/v4")
    }
}
