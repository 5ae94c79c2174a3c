/// End-to-end tests for `PassState` and the command runner.
///
/// The state machine is fed real `PassProgress` messages, and full command
/// runs use a JSON fixture and a CSV report in a temporary directory, so no
/// network access is needed.
use clap::Parser;
use driveaudit_cli::cli::Cli;
use driveaudit_cli::commands::{resolve_config, run_pass, status_report};
use driveaudit_cli::state::{PassPhase, PassResult, PassState, MAX_SHARE_FAILURES};
use driveaudit_core::listing::progress::{PassCommand, PassOutcome, PassProgress, PassSummary};
use driveaudit_core::listing::{Checkpoint, CheckpointStore, FileCheckpoint};
use driveaudit_core::model::TimeWindow;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ── Helpers ───────────────────────────────────────────────────────────────────

const OWNER: &str = "ana@example.com";

fn summary(command: PassCommand, rows: u64) -> PassSummary {
    let window = TimeWindow::current(6).unwrap();
    let mut summary = PassSummary::new(command, window);
    summary.rows_appended = rows;
    summary.pages = 1;
    summary
}

fn row(n: u64) -> PassProgress {
    PassProgress::RowAppended {
        file_id: format!("f{n}"),
        title: format!("File {n}"),
        rows_appended: n,
    }
}

/// Five files owned by `OWNER`, one with a failing permission lookup.
fn write_fixture(dir: &Path) -> PathBuf {
    let files: Vec<_> = (1..=5)
        .map(|n| {
            serde_json::json!({
                "id": format!("f{n}"),
                "name": format!("File {n}"),
                "mimeType": "text/plain",
                "owners": [{"emailAddress": OWNER}],
                "createdTime": "2020-01-01T00:00:00Z",
                "modifiedTime": "2020-06-01T00:00:00Z",
            })
        })
        .collect();
    let fixture = serde_json::json!({
        "files": files,
        "permissions": {
            "f1": [{"role": "owner", "type": "user", "emailAddress": OWNER},
                   {"role": "writer", "type": "user", "emailAddress": "bob@example.com"}],
            "f3": {"error": "permission lookup denied"},
        },
    });
    let path = dir.join("fixture.json");
    fs::write(&path, serde_json::to_string_pretty(&fixture).unwrap()).unwrap();
    path
}

fn cli(dir: &Path, fixture: &Path, args: &[&str]) -> Cli {
    let csv = dir.join("report.csv");
    let checkpoint = dir.join("checkpoint.json");
    let mut argv: Vec<String> = vec!["driveaudit".into()];
    argv.extend(args.iter().map(|s| s.to_string()));
    argv.extend([
        "--owner".into(),
        OWNER.into(),
        "--page-size".into(),
        "2".into(),
        "--fixture".into(),
        fixture.display().to_string(),
        "--csv".into(),
        csv.display().to_string(),
        "--checkpoint".into(),
        checkpoint.display().to_string(),
    ]);
    Cli::try_parse_from(argv).unwrap()
}

fn run(cli: &Cli) -> PassState {
    let command = cli.command.pass_command().expect("pass command");
    let config = resolve_config(cli).unwrap();
    run_pass(cli, config, command).unwrap()
}

fn csv_lines(dir: &Path) -> Vec<String> {
    fs::read_to_string(dir.join("report.csv"))
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

// ── Phase transitions ─────────────────────────────────────────────────────────

#[test]
fn new_state_is_idle() {
    let state = PassState::new();
    assert_eq!(state.phase, PassPhase::Idle);
    assert!(state.result.is_none());
}

/// `start` goes through `Initializing`; `continue` and `list` go straight to `Listing`.
#[test]
fn begin_sets_phase_per_command() {
    let mut state = PassState::new();
    state.begin(PassCommand::Start, None);
    assert_eq!(state.phase, PassPhase::Initializing);

    state.begin(PassCommand::Continue, None);
    assert_eq!(state.phase, PassPhase::Listing);

    state.begin(PassCommand::List, None);
    assert_eq!(state.phase, PassPhase::Listing);
}

#[test]
fn start_messages_walk_initializing_listing_idle() {
    let mut state = PassState::new();
    state.begin(PassCommand::Start, None);

    assert!(!state.apply(PassProgress::Initializing {
        sink: "CSV file report.csv".into()
    }));
    assert_eq!(state.phase, PassPhase::Initializing);
    assert_eq!(state.sink, "CSV file report.csv");

    assert!(!state.apply(PassProgress::Listing {
        resumed: false,
        rows_already_written: 0
    }));
    assert_eq!(state.phase, PassPhase::Listing);

    assert!(!state.apply(PassProgress::PageFetched { index: 0, records: 2 }));
    assert!(!state.apply(row(1)));
    assert!(!state.apply(row(2)));
    assert_eq!(state.pages_fetched, 1);
    assert_eq!(state.rows_appended, 2);
    assert_eq!(state.last_title, "File 2");

    assert!(state.apply(PassProgress::Complete {
        summary: summary(PassCommand::Start, 2)
    }));
    assert_eq!(state.phase, PassPhase::Idle);
    assert!(!state.was_cancelled());
    assert!(matches!(state.result, Some(PassResult::Finished(_))));
}

#[test]
fn resumed_listing_records_prior_rows() {
    let mut state = PassState::new();
    state.begin(PassCommand::Continue, None);
    state.apply(PassProgress::Listing {
        resumed: true,
        rows_already_written: 40,
    });
    assert!(state.resumed);
    assert_eq!(state.rows_already_written, 40);
}

#[test]
fn cancelled_pass_is_reported_as_continuable() {
    let mut state = PassState::new();
    state.begin(PassCommand::Start, None);
    let mut s = summary(PassCommand::Start, 3);
    s.outcome = PassOutcome::Cancelled;
    assert!(state.apply(PassProgress::Cancelled { summary: s }));
    assert_eq!(state.phase, PassPhase::Idle);
    assert!(state.was_cancelled());
    assert_eq!(state.rows_appended, 3);
}

#[test]
fn failed_pass_keeps_the_message() {
    let mut state = PassState::new();
    state.begin(PassCommand::Continue, None);
    assert!(state.apply(PassProgress::Failed {
        message: "HTTP 503".into()
    }));
    assert_eq!(state.phase, PassPhase::Idle);
    match &state.result {
        Some(PassResult::Failed(message)) => assert_eq!(message, "HTTP 503"),
        other => panic!("expected failure, got {other:?}"),
    }
}

/// The failure list stops growing at `MAX_SHARE_FAILURES`; the count does not.
#[test]
fn share_failures_are_capped() {
    let mut state = PassState::new();
    state.begin(PassCommand::List, None);
    let total = MAX_SHARE_FAILURES + 25;
    for n in 0..total {
        state.apply(PassProgress::ShareLookupFailed {
            file_id: format!("f{n}"),
            reason: "denied".into(),
        });
    }
    assert_eq!(state.share_failures.len(), MAX_SHARE_FAILURES);
    assert_eq!(state.share_failure_count, total as u64);
}

#[test]
fn begin_clears_previous_counters() {
    let mut state = PassState::new();
    state.begin(PassCommand::List, None);
    state.apply(row(7));
    state.apply(PassProgress::ShareLookupFailed {
        file_id: "f1".into(),
        reason: "denied".into(),
    });
    state.begin(PassCommand::Start, None);
    assert_eq!(state.rows_appended, 0);
    assert_eq!(state.share_failure_count, 0);
    assert!(state.share_failures.is_empty());
    assert!(state.result.is_none());
}

/// Without a pass to follow, `wait` returns whatever result is already there.
#[test]
fn wait_without_a_pass_returns_immediately() {
    let mut state = PassState::new();
    assert!(state.wait().is_none());
}

// ── Command runs ──────────────────────────────────────────────────────────────

#[test]
fn start_writes_header_and_every_row() {
    let tmp = TempDir::new().unwrap();
    let fixture = write_fixture(tmp.path());
    let state = run(&cli(tmp.path(), &fixture, &["start"]));

    assert_eq!(state.phase, PassPhase::Idle);
    assert_eq!(state.rows_appended, 5);
    assert_eq!(state.pages_fetched, 3);
    assert_eq!(state.share_failure_count, 1);
    assert_eq!(state.share_failures[0].0, "f3");

    let lines = csv_lines(tmp.path());
    assert_eq!(lines.len(), 6);
    assert!(lines[0].starts_with("File Name,Queried Owner,File ID"));
    // f1 has one non-owner permission.
    assert!(lines[1].starts_with("File 1,ana@example.com,f1,"));
    assert!(lines[1].ends_with(",TRUE,1"));
    // f3's lookup failed, so it is reported as unshared.
    assert!(lines[3].ends_with(",FALSE,0"));

    let checkpoint = FileCheckpoint::new(tmp.path().join("checkpoint.json"))
        .load()
        .unwrap()
        .unwrap();
    assert!(checkpoint.complete);
    assert_eq!(checkpoint.rows_written, 5);
}

#[test]
fn reset_behaves_like_start() {
    let tmp = TempDir::new().unwrap();
    let fixture = write_fixture(tmp.path());
    run(&cli(tmp.path(), &fixture, &["list"]));
    run(&cli(tmp.path(), &fixture, &["reset"]));
    // The earlier `list` rows are gone: header plus one pass.
    assert_eq!(csv_lines(tmp.path()).len(), 6);
}

#[test]
fn continue_after_complete_pass_appends_nothing() {
    let tmp = TempDir::new().unwrap();
    let fixture = write_fixture(tmp.path());
    run(&cli(tmp.path(), &fixture, &["start"]));
    let state = run(&cli(tmp.path(), &fixture, &["continue"]));

    match &state.result {
        Some(PassResult::Finished(summary)) => {
            assert_eq!(summary.outcome, PassOutcome::AlreadyComplete);
            assert_eq!(summary.rows_appended, 0);
        }
        other => panic!("expected a finished pass, got {other:?}"),
    }
    assert_eq!(csv_lines(tmp.path()).len(), 6);
}

/// A checkpoint left mid-pass resumes on the stored page, skipping rows
/// that are already written.
#[test]
fn continue_resumes_from_a_stored_checkpoint() {
    let tmp = TempDir::new().unwrap();
    let fixture = write_fixture(tmp.path());
    let args = cli(tmp.path(), &fixture, &["start"]);
    run(&args);

    // Rewind the checkpoint to "second page, one row done" and drop the
    // rows after it from the report.
    let store = FileCheckpoint::new(tmp.path().join("checkpoint.json"));
    let done = store.load().unwrap().unwrap();
    let mut rewound = Checkpoint::begin(done.query, done.months_back, done.window_boundary);
    rewound.record_row();
    rewound.record_row();
    rewound.advance_page(Some("2".into()));
    rewound.record_row();
    store.save(&rewound).unwrap();
    let lines = csv_lines(tmp.path());
    fs::write(tmp.path().join("report.csv"), lines[..4].join("\n") + "\n").unwrap();

    let state = run(&cli(tmp.path(), &fixture, &["continue"]));
    assert!(state.resumed);
    assert_eq!(state.rows_already_written, 3);
    assert_eq!(state.rows_appended, 2);

    let lines = csv_lines(tmp.path());
    assert_eq!(lines.len(), 6);
    assert!(lines[4].contains(",f4,"));
    assert!(lines[5].contains(",f5,"));
}

#[test]
fn invalid_page_size_is_rejected_before_running() {
    let tmp = TempDir::new().unwrap();
    let fixture = write_fixture(tmp.path());
    let mut args = cli(tmp.path(), &fixture, &["start"]);
    args.page_size = Some(0);
    let config = resolve_config(&args).unwrap();
    let err = run_pass(&args, config, PassCommand::Start).unwrap_err();
    assert!(format!("{err:#}").contains("page_size"));
    assert!(!tmp.path().join("report.csv").exists());
}

#[test]
fn status_reads_the_checkpoint() {
    let tmp = TempDir::new().unwrap();
    let fixture = write_fixture(tmp.path());
    let args = cli(tmp.path(), &fixture, &["status"]);

    let before = status_report(&resolve_config(&args).unwrap()).unwrap();
    assert!(before.starts_with("No checkpoint at"));

    run(&cli(tmp.path(), &fixture, &["start"]));
    let report = status_report(&resolve_config(&args).unwrap()).unwrap();
    assert!(report.contains("Rows written:    5\n"));
    assert!(report.contains("State:           complete\n"));
    assert!(report.contains("'ana@example.com' in owners"));
    driveaudit_cli::run(&args).unwrap();
}

#[test]
fn status_with_checkpointing_disabled() {
    let tmp = TempDir::new().unwrap();
    let fixture = write_fixture(tmp.path());
    let mut args = cli(tmp.path(), &fixture, &["status"]);
    args.checkpoint = None;
    args.no_checkpoint = true;
    let report = status_report(&resolve_config(&args).unwrap()).unwrap();
    assert_eq!(report, "Checkpointing is disabled.\n");
}
