/// The report pass: drives filter, lister, share inspector, projector and
/// sink for one user command.
///
/// ```text
/// Idle ──start──▶ Initializing ──▶ Listing ──▶ Idle
/// Idle ──continue / list──────────▶ Listing ──▶ Idle
/// ```
///
/// Work is strictly sequential: one page call, then one permission call and
/// one append per record. The stop signal is checked before every page and
/// every record, so a stop never leaves a partial row. Once the last page is
/// finished the pass completes, whatever the stop signal says.
use crate::analysis::{project, ShareInspector};
use crate::config::ReportConfig;
use crate::error::{AuditError, Result};
use crate::listing::checkpoint::{Checkpoint, CheckpointStore};
use crate::listing::filter::RecordFilter;
use crate::listing::lister::{Lister, RetryPolicy};
use crate::listing::progress::{PassCommand, PassOutcome, PassProgress, PassSummary};
use crate::model::format::format_count;
use crate::model::{ShareLookup, TimeWindow, REPORT_HEADERS};
use crate::remote::DriveApi;
use crate::sink::ReportSink;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// External stop request: a shared cancel flag plus an optional deadline
/// standing in for a host-imposed execution budget.
#[derive(Debug, Clone, Default)]
pub struct StopSignal {
    flag: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl StopSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop once `budget` has elapsed from now.
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.deadline = Some(Instant::now() + budget);
        self
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub fn should_stop(&self) -> bool {
        self.is_cancelled() || self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

fn emit(progress: Option<&Sender<PassProgress>>, message: PassProgress) {
    if let Some(tx) = progress {
        let _ = tx.send(message);
    }
}

/// Everything one pass needs, owned so the pass can move to a worker thread.
pub struct ReportPass<A, S, C> {
    pub api: A,
    pub sink: S,
    pub checkpoints: C,
    pub config: ReportConfig,
}

/// Where listing begins and what it compares against.
struct StartPoint {
    window: TimeWindow,
    checkpoint: Checkpoint,
    page_token: Option<String>,
    skip_in_first_page: usize,
    resumed: bool,
}

impl<A, S, C> ReportPass<A, S, C>
where
    A: DriveApi,
    S: ReportSink,
    C: CheckpointStore,
{
    pub fn new(api: A, sink: S, checkpoints: C, config: ReportConfig) -> Self {
        Self {
            api,
            sink,
            checkpoints,
            config,
        }
    }

    /// Run one command to completion, cancellation or the first listing-level error.
    pub fn run(
        &mut self,
        command: PassCommand,
        stop: &StopSignal,
        progress: Option<&Sender<PassProgress>>,
    ) -> Result<PassSummary> {
        let started = Instant::now();
        let Self {
            api,
            sink,
            checkpoints,
            config,
        } = self;

        let lister = Lister::new(
            &*api,
            RecordFilter::new(config.owner_email.clone()),
            config.page_size,
        )
        .with_retry(RetryPolicy::new(
            config.retry_attempts,
            Duration::from_millis(config.retry_base_delay_ms),
        ));
        let query = lister.query().to_string();
        // `list` is the bare listing pass; only start/continue keep a checkpoint.
        let track = command != PassCommand::List;

        let start = match command {
            PassCommand::Start => {
                emit(progress, PassProgress::Initializing { sink: sink.describe() });
                info!("Initializing {}", sink.describe());
                checkpoints.clear()?;
                sink.initialize(&REPORT_HEADERS)?;
                fresh_start(&query, config.months_back)?
            }
            PassCommand::List => fresh_start(&query, config.months_back)?,
            PassCommand::Continue => match checkpoints.load()? {
                None => {
                    if checkpoints.is_persistent() {
                        warn!("No checkpoint found; listing from the first page");
                    } else {
                        warn!("Checkpointing is disabled; continue re-lists every record and may duplicate rows");
                    }
                    fresh_start(&query, config.months_back)?
                }
                Some(stored) if stored.query != query => {
                    return Err(AuditError::CheckpointMismatch {
                        stored: stored.query,
                        current: query,
                    });
                }
                Some(stored) if stored.complete => {
                    info!(
                        "Checkpoint is complete ({} rows); nothing to continue",
                        format_count(stored.rows_written)
                    );
                    let window = TimeWindow::with_boundary(stored.months_back, stored.window_boundary);
                    let mut summary = PassSummary::new(command, window);
                    summary.outcome = PassOutcome::AlreadyComplete;
                    summary.elapsed = started.elapsed();
                    return Ok(summary);
                }
                Some(stored) => {
                    if stored.months_back != config.months_back {
                        warn!(
                            "Resuming with the checkpoint's {}-month window (configured: {})",
                            stored.months_back, config.months_back
                        );
                    }
                    StartPoint {
                        window: TimeWindow::with_boundary(stored.months_back, stored.window_boundary),
                        page_token: stored.page_token.clone(),
                        skip_in_first_page: stored.rows_done_in_page,
                        resumed: true,
                        checkpoint: stored,
                    }
                }
            },
        };

        let StartPoint {
            window,
            mut checkpoint,
            page_token,
            mut skip_in_first_page,
            resumed,
        } = start;
        if track {
            checkpoints.save(&checkpoint)?;
        }

        let mut summary = PassSummary::new(command, window);
        summary.resumed = resumed;
        info!(
            "Listing `{query}` (window boundary {}, resumed: {resumed})",
            window.boundary
        );
        emit(
            progress,
            PassProgress::Listing {
                resumed,
                rows_already_written: checkpoint.rows_written,
            },
        );

        let inspector = ShareInspector::new(&*api);
        let queried_owner = config.queried_owner().to_string();
        let mut pages = lister.pages(page_token);

        loop {
            if stop.should_stop() {
                return Ok(stopped(summary, started));
            }
            let Some(page) = pages.next() else { break };
            let page = page?;

            summary.pages += 1;
            summary.records_dropped += page.dropped;
            emit(
                progress,
                PassProgress::PageFetched {
                    index: page.index,
                    records: page.records.len(),
                },
            );

            let last_page = page.next_token.is_none();
            let skip = std::mem::take(&mut skip_in_first_page).min(page.records.len());
            summary.rows_skipped += skip;

            for record in page.records.iter().skip(skip) {
                if stop.should_stop() {
                    return Ok(stopped(summary, started));
                }

                let share = inspector.inspect(&record.id);
                if let ShareLookup::Failed { reason } = &share {
                    summary.share_failures += 1;
                    emit(
                        progress,
                        PassProgress::ShareLookupFailed {
                            file_id: record.id.to_string(),
                            reason: reason.clone(),
                        },
                    );
                }

                let row = project(record, &share, &queried_owner, &window);
                sink.append(&row)?;
                summary.rows_appended += 1;
                if track {
                    checkpoint.record_row();
                    checkpoints.save(&checkpoint)?;
                }
                emit(
                    progress,
                    PassProgress::RowAppended {
                        file_id: row.file_id,
                        title: row.title,
                        rows_appended: summary.rows_appended,
                    },
                );
            }

            if track {
                checkpoint.advance_page(page.next_token);
                checkpoints.save(&checkpoint)?;
            }
            // A stop that arrives after the final row does not undo completion.
            if last_page {
                break;
            }
        }

        summary.elapsed = started.elapsed();
        info!(
            "Pass complete: {} rows over {} pages in {:.1?} ({} share lookups failed)",
            format_count(summary.rows_appended),
            summary.pages,
            summary.elapsed,
            summary.share_failures
        );
        Ok(summary)
    }
}

fn fresh_start(query: &str, months_back: u32) -> Result<StartPoint> {
    let window = TimeWindow::current(months_back)?;
    Ok(StartPoint {
        window,
        checkpoint: Checkpoint::begin(query, months_back, window.boundary),
        page_token: None,
        skip_in_first_page: 0,
        resumed: false,
    })
}

fn stopped(mut summary: PassSummary, started: Instant) -> PassSummary {
    summary.outcome = PassOutcome::Cancelled;
    summary.elapsed = started.elapsed();
    info!(
        "Pass stopped after {} rows; run `continue` to resume",
        format_count(summary.rows_appended)
    );
    summary
}
