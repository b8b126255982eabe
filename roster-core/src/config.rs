//! `~/.roster/config.yaml`: sheet, hosting and retry settings.
//!
//! # API pattern
//!
//! Every operation comes in two forms:
//! - `fn_at(home: &Path, …)`: explicit home; used in tests with `TempDir`
//! - `fn(…)`: derives home from `dirs::home_dir()`, delegates to `_at`
//!
//! Tokens are never stored here, only the names of the environment
//! variables that hold them.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{io_err, ConfigError};
use crate::parser::STATUS_CELL;

pub const DEFAULT_SHEET_NAME: &str = "Таблица логинов";
pub const DEFAULT_SHEETS_API: &str = "https://sheets.googleapis.com/v4";
pub const DEFAULT_SHEETS_TOKEN_ENV: &str = "ROSTER_SHEETS_TOKEN";
pub const DEFAULT_HOSTING_API: &str = "https://gitlab.com/api/v4";
pub const DEFAULT_HOSTING_TOKEN_ENV: &str = "ROSTER_GITLAB_TOKEN";
/// GitLab "Developer".
pub const DEFAULT_MEMBER_ACCESS_LEVEL: u32 = 30;

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

/// Root of the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub sheet: SheetSettings,
    #[serde(default)]
    pub hosting: HostingSettings,
    #[serde(default)]
    pub retry: RetrySettings,
}

/// Where the roster lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSettings {
    pub spreadsheet_id: String,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    #[serde(default = "default_first_column")]
    pub first_column: String,
    /// Column holding the `OK` / `PROCESSING` flag.
    #[serde(default = "default_status_column")]
    pub status_column: String,
    #[serde(default = "default_sheets_api")]
    pub api_base: String,
    #[serde(default = "default_sheets_token_env")]
    pub token_env: String,
}

impl SheetSettings {
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            spreadsheet_id: spreadsheet_id.into(),
            sheet_name: default_sheet_name(),
            first_column: default_first_column(),
            status_column: default_status_column(),
            api_base: default_sheets_api(),
            token_env: default_sheets_token_env(),
        }
    }

    /// Move the status flag to `column` and the first column read along with it,
    /// so team, login and name stay in the four columns before the flag.
    pub fn set_status_column(&mut self, column: &str) -> Result<(), ConfigError> {
        let index = column_index(column).ok_or_else(|| {
            ConfigError::Invalid(format!("sheet.status_column '{column}' is not a column letter"))
        })?;
        let first = index.checked_sub(STATUS_CELL).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "sheet.status_column '{column}' leaves no room for the {STATUS_CELL} columns before it"
            ))
        })?;
        self.status_column = column.to_ascii_uppercase();
        self.first_column = column_letters(first);
        Ok(())
    }
}

/// Hosting-service connection settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostingSettings {
    #[serde(default = "default_hosting_api")]
    pub api_base: String,
    #[serde(default = "default_hosting_token_env")]
    pub token_env: String,
    #[serde(default = "default_member_access_level")]
    pub member_access_level: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for HostingSettings {
    fn default() -> Self {
        Self {
            api_base: default_hosting_api(),
            token_env: default_hosting_token_env(),
            member_access_level: default_member_access_level(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Backoff for status write-back.
///
/// `max_attempts: None` retries until the write succeeds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_base_wait_ms")]
    pub base_wait_ms: u64,
    #[serde(default = "default_multiplier")]
    pub multiplier: u32,
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_attempts: Option<u32>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            base_wait_ms: default_base_wait_ms(),
            multiplier: default_multiplier(),
            max_wait_ms: default_max_wait_ms(),
            max_attempts: None,
        }
    }
}

fn default_sheet_name() -> String {
    DEFAULT_SHEET_NAME.to_string()
}
fn default_first_column() -> String {
    "A".to_string()
}
fn default_status_column() -> String {
    "E".to_string()
}
fn default_sheets_api() -> String {
    DEFAULT_SHEETS_API.to_string()
}
fn default_sheets_token_env() -> String {
    DEFAULT_SHEETS_TOKEN_ENV.to_string()
}
fn default_hosting_api() -> String {
    DEFAULT_HOSTING_API.to_string()
}
fn default_hosting_token_env() -> String {
    DEFAULT_HOSTING_TOKEN_ENV.to_string()
}
fn default_member_access_level() -> u32 {
    DEFAULT_MEMBER_ACCESS_LEVEL
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_base_wait_ms() -> u64 {
    2_000
}
fn default_multiplier() -> u32 {
    2
}
fn default_max_wait_ms() -> u64 {
    10_000
}

impl Settings {
    pub fn new(spreadsheet_id: impl Into<String>) -> Self {
        Self {
            sheet: SheetSettings::new(spreadsheet_id),
            hosting: HostingSettings::default(),
            retry: RetrySettings::default(),
        }
    }

    /// Reject values that deserialize but cannot drive a pass.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sheet.spreadsheet_id.trim().is_empty() {
            return Err(ConfigError::Invalid("sheet.spreadsheet_id is empty".into()));
        }
        let sheet = &self.sheet;
        match (column_index(&sheet.first_column), column_index(&sheet.status_column)) {
            (Some(first), Some(status)) if status == first + STATUS_CELL => {}
            (Some(_), Some(_)) => {
                return Err(ConfigError::Invalid(format!(
                    "sheet.status_column must be {STATUS_CELL} columns right of sheet.first_column, \
                     got '{}' and '{}'",
                    sheet.first_column, sheet.status_column
                )));
            }
            _ => {
                return Err(ConfigError::Invalid(format!(
                    "sheet columns must be letters, got '{}' and '{}'",
                    sheet.first_column, sheet.status_column
                )));
            }
        }
        let retry = &self.retry;
        if retry.base_wait_ms == 0 {
            return Err(ConfigError::Invalid("retry.base_wait_ms must be > 0".into()));
        }
        if retry.multiplier < 1 {
            return Err(ConfigError::Invalid("retry.multiplier must be >= 1".into()));
        }
        if retry.max_wait_ms < retry.base_wait_ms {
            return Err(ConfigError::Invalid(format!(
                "retry.max_wait_ms ({}) is below retry.base_wait_ms ({})",
                retry.max_wait_ms, retry.base_wait_ms
            )));
        }
        if retry.max_attempts == Some(0) {
            return Err(ConfigError::Invalid("retry.max_attempts must be >= 1".into()));
        }
        Ok(())
    }
}

/// 0-based index of an A1 column (`A` = 0, `Z` = 25, `AA` = 26). Case-insensitive.
pub fn column_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut n: usize = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        n = n * 26 + (c.to_ascii_uppercase() as usize - 'A' as usize + 1);
    }
    Some(n - 1)
}

/// Inverse of [`column_index`].
pub fn column_letters(index: usize) -> String {
    let mut n = index + 1;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push((b'A' + rem as u8) as char);
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Read a token from the environment variable named `var`.
pub fn resolve_token(var: &str) -> Result<String, ConfigError> {
    match std::env::var(var) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingToken {
            var: var.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// `<home>/.roster/config.yaml`: pure, no I/O.
pub fn config_path_at(home: &Path) -> PathBuf {
    home.join(".roster").join("config.yaml")
}

/// `config_path_at` for the current user.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(config_path_at(&home()?))
}

/// Load and validate the config.
///
/// Returns `ConfigError::NotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(home: &Path) -> Result<Settings, ConfigError> {
    let path = config_path_at(home);
    if !path.exists() {
        return Err(ConfigError::NotFound { path });
    }
    let contents = std::fs::read_to_string(&path).map_err(|e| io_err(&path, e))?;
    let settings: Settings =
        serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse { path, source: e })?;
    settings.validate()?;
    Ok(settings)
}

/// `load_at` convenience wrapper.
pub fn load() -> Result<Settings, ConfigError> {
    load_at(&home()?)
}

/// Atomically save the config.
///
/// Write flow: validate → serialize → `.yaml.tmp` sibling → `chmod 0600` → `rename`.
pub fn save_at(home: &Path, settings: &Settings) -> Result<PathBuf, ConfigError> {
    settings.validate()?;
    let path = config_path_at(home);
    let dir = home.join(".roster");
    if !dir.exists() {
        std::fs::create_dir_all(&dir).map_err(|e| io_err(&dir, e))?;
        set_dir_permissions(&dir)?;
    }
    let tmp_path = path.with_file_name("config.yaml.tmp");

    let yaml = serde_yaml::to_string(settings)?;
    std::fs::write(&tmp_path, yaml).map_err(|e| io_err(&tmp_path, e))?;
    set_file_permissions(&tmp_path)?;
    if let Err(e) = std::fs::rename(&tmp_path, &path) {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(io_err(&path, e));
    }
    Ok(path)
}

/// Write a fresh config unless one exists (or `force` is set).
pub fn init_at(home: &Path, settings: &Settings, force: bool) -> Result<PathBuf, ConfigError> {
    settings.validate()?;
    let path = config_path_at(home);
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists { path });
    }
    save_at(home, settings)
}

/// `init_at` convenience wrapper.
pub fn init(settings: &Settings, force: bool) -> Result<PathBuf, ConfigError> {
    init_at(&home()?, settings, force)
}

// ---------------------------------------------------------------------------
// Private helpers
// ---------------------------------------------------------------------------

fn home() -> Result<PathBuf, ConfigError> {
    dirs::home_dir().ok_or(ConfigError::HomeNotFound)
}

#[cfg(unix)]
fn set_dir_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o700))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_dir_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

#[cfg(unix)]
fn set_file_permissions(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .map_err(|e| io_err(path, e))
}
#[cfg(not(unix))]
fn set_file_permissions(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
