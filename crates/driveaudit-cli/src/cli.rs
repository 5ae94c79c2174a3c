/// Command-line arguments.
///
/// Flags override the config file and environment; see
/// [`Cli::apply`] for the exact precedence.
use clap::{ArgAction, Parser, Subcommand};
use driveaudit_core::config::{ReportConfig, SinkConfig};
use driveaudit_core::listing::progress::PassCommand;
use std::path::PathBuf;

/// Checkpoint file used when none is configured and checkpointing is on.
pub const DEFAULT_CHECKPOINT_FILE: &str = "driveaudit-checkpoint.json";

#[derive(Parser, Debug)]
#[command(
    name = "driveaudit",
    version,
    about = "List files owned by a user and report their timestamps and sharing status"
)]
pub struct Cli {
    /// JSON config file.
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Only report files owned by this address.
    #[arg(long, global = true, value_name = "EMAIL")]
    pub owner: Option<String>,

    /// Size of the "recent" window in months.
    #[arg(long, global = true, value_name = "N")]
    pub months: Option<u32>,

    /// Records per listing page (1-1000).
    #[arg(long, global = true, value_name = "N")]
    pub page_size: Option<u32>,

    /// Write the report to a CSV file.
    #[arg(long, global = true, value_name = "FILE", conflicts_with = "spreadsheet")]
    pub csv: Option<PathBuf>,

    /// Write the report to this Google Sheets spreadsheet.
    #[arg(long, global = true, value_name = "ID")]
    pub spreadsheet: Option<String>,

    /// Tab of the spreadsheet to write (default: Sheet1).
    #[arg(long, global = true, value_name = "NAME", requires = "spreadsheet")]
    pub sheet: Option<String>,

    /// Checkpoint file for resumable passes.
    #[arg(long, global = true, value_name = "FILE", conflicts_with = "no_checkpoint")]
    pub checkpoint: Option<PathBuf>,

    /// Disable checkpointing; `continue` then re-lists everything.
    #[arg(long, global = true)]
    pub no_checkpoint: bool,

    /// Read files and permissions from a JSON snapshot instead of the API.
    #[arg(long, global = true, value_name = "FILE")]
    pub fixture: Option<PathBuf>,

    /// Stop between records after this many seconds.
    #[arg(long, global = true, value_name = "SECS")]
    pub time_budget: Option<u64>,

    /// Retries for transient listing failures.
    #[arg(long, global = true, value_name = "N")]
    pub retries: Option<u32>,

    /// More log output (-v debug, -vv trace).
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Clear the report, write the header and list every matching file.
    Start,
    /// Same as `start`.
    Reset,
    /// Resume the last pass from its checkpoint.
    Continue,
    /// Append rows for every matching file without clearing or checkpointing.
    List,
    /// Show the stored checkpoint.
    Status,
}

impl Command {
    /// The pass this command runs; `None` for commands that run no pass.
    pub fn pass_command(self) -> Option<PassCommand> {
        match self {
            Self::Start | Self::Reset => Some(PassCommand::Start),
            Self::Continue => Some(PassCommand::Continue),
            Self::List => Some(PassCommand::List),
            Self::Status => None,
        }
    }
}

impl Cli {
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }

    /// Apply flags on top of file and environment values.
    pub fn apply(&self, config: &mut ReportConfig) {
        if let Some(owner) = &self.owner {
            config.owner_email = Some(owner.trim().to_string()).filter(|o| !o.is_empty());
        }
        if let Some(months) = self.months {
            config.months_back = months;
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        if let Some(path) = &self.csv {
            config.sink = Some(SinkConfig::Csv { path: path.clone() });
        }
        if let Some(id) = &self.spreadsheet {
            config.sink = Some(SinkConfig::Sheets {
                spreadsheet_id: id.clone(),
                sheet_name: self.sheet.clone().unwrap_or_else(|| "Sheet1".to_string()),
            });
        }
        if let Some(path) = &self.checkpoint {
            config.checkpoint_path = Some(path.clone());
        }
        if self.no_checkpoint {
            config.checkpoint_path = None;
        } else if config.checkpoint_path.is_none() {
            config.checkpoint_path = Some(PathBuf::from(DEFAULT_CHECKPOINT_FILE));
        }
        if let Some(secs) = self.time_budget {
            config.time_budget_secs = Some(secs);
        }
        if let Some(retries) = self.retries {
            config.retry_attempts = retries;
        }
    }
}
