/// Report configuration.
///
/// One explicit object handed to every component at construction. Values
/// come from an optional JSON file, then environment variables, then the
/// command line (applied by the CLI crate), and are checked by
/// [`ReportConfig::validate`] before a pass starts.
use crate::error::{AuditError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_OWNER: &str = "DRIVEAUDIT_OWNER";
pub const ENV_MONTHS_BACK: &str = "DRIVEAUDIT_MONTHS_BACK";
pub const ENV_PAGE_SIZE: &str = "DRIVEAUDIT_PAGE_SIZE";
pub const ENV_CHECKPOINT: &str = "DRIVEAUDIT_CHECKPOINT";
pub const ENV_ACCESS_TOKEN: &str = "GOOGLE_OAUTH_ACCESS_TOKEN";

/// Largest page the listing API accepts.
pub const MAX_PAGE_SIZE: u32 = 1_000;

/// Where report rows go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SinkConfig {
    /// A Google Sheets spreadsheet tab.
    Sheets {
        spreadsheet_id: String,
        #[serde(default = "default_sheet_name")]
        sheet_name: String,
    },
    /// A local CSV file.
    Csv { path: PathBuf },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    /// Size of the "recent" window in calendar months (default: 6).
    #[serde(default = "default_months_back")]
    pub months_back: u32,

    /// Restrict the listing to files owned by this address.
    #[serde(default)]
    pub owner_email: Option<String>,

    /// Records requested per listing page (default: 100).
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    #[serde(default = "default_drive_api_base")]
    pub drive_api_base: String,

    #[serde(default = "default_sheets_api_base")]
    pub sheets_api_base: String,

    /// OAuth bearer token. Normally supplied through the environment, never
    /// written back out.
    #[serde(default, skip_serializing)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub sink: Option<SinkConfig>,

    /// Checkpoint file; `None` disables resumption.
    #[serde(default)]
    pub checkpoint_path: Option<PathBuf>,

    /// Retries for transient listing failures (default: 0, fail fast).
    #[serde(default)]
    pub retry_attempts: u32,

    /// First backoff delay; doubles on each retry (default: 500 ms).
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,

    /// Stop between records once this many seconds have elapsed.
    #[serde(default)]
    pub time_budget_secs: Option<u64>,

    /// Per-request HTTP timeout. Unset means the client default (none).
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

fn default_months_back() -> u32 {
    6
}

fn default_page_size() -> u32 {
    100
}

fn default_drive_api_base() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}

fn default_sheets_api_base() -> String {
    "https://sheets.googleapis.com/v4".to_string()
}

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

fn default_retry_base_delay_ms() -> u64 {
    500
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            months_back: default_months_back(),
            owner_email: None,
            page_size: default_page_size(),
            drive_api_base: default_drive_api_base(),
            sheets_api_base: default_sheets_api_base(),
            access_token: None,
            sink: None,
            checkpoint_path: None,
            retry_attempts: 0,
            retry_base_delay_ms: default_retry_base_delay_ms(),
            time_budget_secs: None,
            request_timeout_secs: None,
        }
    }
}

impl ReportConfig {
    /// Read a JSON config file. Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| AuditError::io(path, e))?;
        serde_json::from_str(&text)
            .map_err(|e| AuditError::decode(format!("config file {}", path.display()), e))
    }

    /// Defaults, or the given file, with environment overrides applied.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env()?;
        Ok(config)
    }

    /// Apply `DRIVEAUDIT_*` and token variables on top of the current values.
    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_vars(|key| std::env::var(key).ok())
    }

    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(owner) = lookup(ENV_OWNER).filter(|s| !s.trim().is_empty()) {
            self.owner_email = Some(owner.trim().to_string());
        }
        if let Some(raw) = lookup(ENV_MONTHS_BACK) {
            self.months_back = raw
                .trim()
                .parse()
                .map_err(|_| AuditError::config(format!("{ENV_MONTHS_BACK} must be a whole number, got '{raw}'")))?;
        }
        if let Some(raw) = lookup(ENV_PAGE_SIZE) {
            self.page_size = raw
                .trim()
                .parse()
                .map_err(|_| AuditError::config(format!("{ENV_PAGE_SIZE} must be a whole number, got '{raw}'")))?;
        }
        if let Some(path) = lookup(ENV_CHECKPOINT).filter(|s| !s.is_empty()) {
            self.checkpoint_path = Some(PathBuf::from(path));
        }
        if let Some(token) = lookup(ENV_ACCESS_TOKEN).filter(|s| !s.is_empty()) {
            self.access_token = Some(token);
        }
        Ok(())
    }

    /// Reject values the remote APIs or the pass cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
            return Err(AuditError::config(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}, got {}",
                self.page_size
            )));
        }
        if let Some(owner) = self.owner_email.as_deref().map(str::trim).filter(|o| !o.is_empty()) {
            if !owner.contains('@') {
                return Err(AuditError::config(format!(
                    "owner_email '{owner}' is not an email address"
                )));
            }
        }
        match &self.sink {
            None => return Err(AuditError::config("no report sink configured")),
            Some(SinkConfig::Sheets { spreadsheet_id, .. }) if spreadsheet_id.trim().is_empty() => {
                return Err(AuditError::config("spreadsheet_id is empty"));
            }
            Some(_) => {}
        }
        Ok(())
    }

    /// The owner column value for every row: the configured owner, trimmed
    /// the same way the listing filter trims it, or `""`.
    pub fn queried_owner(&self) -> &str {
        self.owner_email.as_deref().map(str::trim).unwrap_or("")
    }
}
