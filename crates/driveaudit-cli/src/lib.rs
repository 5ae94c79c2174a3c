/// DriveAudit CLI: argument parsing, pass state and command execution.
///
/// All report logic lives in `driveaudit-core`; this crate resolves the
/// configuration, starts the pass on a worker thread and follows its progress.
pub mod cli;
pub mod commands;
pub mod state;

pub use cli::{Cli, Command};
pub use commands::run;
