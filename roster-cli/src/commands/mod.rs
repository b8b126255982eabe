pub mod config;
pub mod output;
pub mod provision;
pub mod verify;

use std::time::Duration;

use anyhow::{Context, Result};

use roster_core::{config as settings_file, config::resolve_token, Settings};
use roster_remote::{GitlabClient, SheetsClient};
use roster_sync::{plan_pass, Mode, Reconciler, RetryPolicy};

fn load_settings() -> Result<Settings> {
    let settings = settings_file::load().context("failed to load roster config")?;
    tracing::debug!(
        "sheet '{}' columns {}:{}, hosting {}",
        settings.sheet.sheet_name,
        settings.sheet.first_column,
        settings.sheet.status_column,
        settings.hosting.api_base
    );
    Ok(settings)
}

fn sheets_client(settings: &Settings) -> Result<SheetsClient> {
    let token = resolve_token(&settings.sheet.token_env).context("no spreadsheet credentials")?;
    Ok(SheetsClient::new(
        &settings.sheet,
        token,
        Duration::from_secs(settings.hosting.timeout_secs),
    ))
}

fn gitlab_client(settings: &Settings) -> Result<GitlabClient> {
    let token = resolve_token(&settings.hosting.token_env).context("no GitLab credentials")?;
    Ok(GitlabClient::new(&settings.hosting, token))
}

/// Shared body of `roster provision` and `roster verify`.
pub(crate) fn run_pass(mode: Mode, dry_run: bool, json: bool) -> Result<()> {
    let settings = load_settings()?;
    let mut sheet = sheets_client(&settings)?;

    if dry_run {
        let plan = plan_pass(&mut sheet, mode).with_context(|| format!("{mode} dry run failed"))?;
        return if json {
            output::print_plan_json(mode, &plan)
        } else {
            output::print_plan(mode, &plan);
            Ok(())
        };
    }

    let hosting = gitlab_client(&settings)?;
    let retry = RetryPolicy::from(&settings.retry);
    let report = Reconciler::new(sheet, hosting, retry)
        .run(mode)
        .with_context(|| format!("{mode} pass aborted"))?;

    if json {
        output::print_report_json(&report)
    } else {
        output::print_report(&report);
        Ok(())
    }
}
