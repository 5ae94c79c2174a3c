/// Command execution: resolve configuration, wire the pass together and
/// report how it went.
use crate::cli::Cli;
use crate::state::{PassResult, PassState};
use anyhow::{bail, Context, Result};
use driveaudit_core::config::ReportConfig;
use driveaudit_core::listing::progress::{PassCommand, PassOutcome, PassSummary};
use driveaudit_core::listing::{
    start_pass, CheckpointStore, FileCheckpoint, NoCheckpoint, ReportPass, StopSignal,
};
use driveaudit_core::model::format::{format_count, format_timestamp};
use driveaudit_core::remote::{DriveApi, DriveClient, InMemoryDrive};
use driveaudit_core::sink::open_sink;
use std::fmt::Write as _;
use std::time::Duration;
use tracing::info;

/// Run the parsed command line.
pub fn run(cli: &Cli) -> Result<()> {
    let config = resolve_config(cli)?;
    match cli.command.pass_command() {
        Some(command) => {
            let state = run_pass(cli, config, command)?;
            match state.result {
                Some(PassResult::Finished(summary)) => {
                    print_summary(&summary, &state.share_failures);
                    Ok(())
                }
                Some(PassResult::Failed(message)) => bail!("{} failed: {message}", command.label()),
                None => bail!("{} ended without a result", command.label()),
            }
        }
        None => show_status(&config),
    }
}

/// Config file, then environment, then flags.
pub fn resolve_config(cli: &Cli) -> Result<ReportConfig> {
    let mut config = ReportConfig::load(cli.config.as_deref()).context("loading configuration")?;
    cli.apply(&mut config);
    Ok(config)
}

/// Run one pass on a worker thread and follow its progress to the end.
pub fn run_pass(cli: &Cli, config: ReportConfig, command: PassCommand) -> Result<PassState> {
    config.validate().context("invalid configuration")?;

    let api: Box<dyn DriveApi + Send> = match &cli.fixture {
        Some(path) => {
            info!("Reading files from fixture {}", path.display());
            Box::new(InMemoryDrive::from_fixture_file(path)?)
        }
        None => Box::new(DriveClient::from_config(&config)?),
    };
    let sink = open_sink(&config).context("opening report sink")?;
    let checkpoints = open_checkpoints(&config);

    let mut stop = StopSignal::new();
    if let Some(secs) = config.time_budget_secs {
        stop = stop.with_budget(Duration::from_secs(secs));
    }

    info!("Running `{}` with {}", command.label(), sink.describe());
    let pass = ReportPass::new(api, sink, checkpoints, config);
    let handle = start_pass(pass, command, stop).context("starting pass")?;

    let mut state = PassState::new();
    state.begin(command, Some(handle));
    state.wait();
    Ok(state)
}

fn open_checkpoints(config: &ReportConfig) -> Box<dyn CheckpointStore + Send> {
    match &config.checkpoint_path {
        Some(path) => Box::new(FileCheckpoint::new(path)),
        None => Box::new(NoCheckpoint),
    }
}

fn show_status(config: &ReportConfig) -> Result<()> {
    print!("{}", status_report(config)?);
    Ok(())
}

/// Human-readable description of the stored checkpoint, one field per line.
pub fn status_report(config: &ReportConfig) -> Result<String> {
    let Some(path) = &config.checkpoint_path else {
        return Ok("Checkpointing is disabled.\n".to_string());
    };
    let Some(checkpoint) = FileCheckpoint::new(path).load()? else {
        return Ok(format!("No checkpoint at {}.\n", path.display()));
    };

    let state = if checkpoint.complete {
        "complete".to_string()
    } else {
        format!(
            "in progress ({} rows into the current page)",
            checkpoint.rows_done_in_page
        )
    };
    let mut out = String::new();
    let _ = writeln!(out, "Checkpoint:      {}", path.display());
    let _ = writeln!(out, "Query:           {}", checkpoint.query);
    let _ = writeln!(
        out,
        "Window:          {} months (since {})",
        checkpoint.months_back,
        format_timestamp(checkpoint.window_boundary)
    );
    let _ = writeln!(out, "Rows written:    {}", format_count(checkpoint.rows_written));
    let _ = writeln!(out, "State:           {state}");
    let _ = writeln!(out, "Updated:         {}", format_timestamp(checkpoint.updated_at));
    Ok(out)
}

fn print_summary(summary: &PassSummary, share_failures: &[(String, String)]) {
    match summary.outcome {
        PassOutcome::AlreadyComplete => {
            println!("Nothing to continue: the last pass already finished. Run `start` for a new report.");
            return;
        }
        PassOutcome::Cancelled => {
            println!("Stopped early. Run `continue` to pick up where this pass left off.");
        }
        PassOutcome::Completed => {}
    }

    println!(
        "{} rows appended over {} pages in {:.1?}{}",
        format_count(summary.rows_appended),
        summary.pages,
        summary.elapsed,
        if summary.resumed { " (resumed)" } else { "" }
    );
    println!(
        "Window boundary: {} ({} months)",
        format_timestamp(summary.window.boundary),
        summary.window.months_back
    );
    if summary.rows_skipped > 0 {
        println!("Skipped {} records already written", summary.rows_skipped);
    }
    if summary.records_dropped > 0 {
        println!(
            "Dropped {} records that did not match the filter",
            summary.records_dropped
        );
    }
    if summary.share_failures > 0 {
        println!(
            "{} share lookups failed; those rows report the file as unshared:",
            summary.share_failures
        );
        for (file_id, reason) in share_failures.iter().take(20) {
            println!("  {file_id}: {reason}");
        }
    }
}
