/// Pass state tracked by the frontend.
///
/// The pass thread communicates via its progress channel; counters and the
/// phase are updated from messages in [`PassState::apply`], which
/// [`PassState::wait`] feeds until the pass ends.
use driveaudit_core::listing::progress::{PassCommand, PassOutcome, PassProgress, PassSummary};
use driveaudit_core::listing::PassHandle;
use driveaudit_core::model::format::format_count;
use tracing::{debug, info, warn};

/// Share lookup failures kept for the closing report. The count keeps going.
pub const MAX_SHARE_FAILURES: usize = 1_000;

/// Log a progress line every this many rows.
const PROGRESS_LOG_INTERVAL: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassPhase {
    /// No pass running, possibly showing the result of the last one.
    Idle,
    /// `start` is clearing the checkpoint and writing the header.
    Initializing,
    /// Pages are being listed and rows appended.
    Listing,
}

/// How the last pass ended.
#[derive(Debug, Clone)]
pub enum PassResult {
    Finished(PassSummary),
    Failed(String),
}

#[derive(Debug)]
pub struct PassState {
    pub phase: PassPhase,
    pub command: Option<PassCommand>,
    handle: Option<PassHandle>,

    pub sink: String,
    pub resumed: bool,
    /// Rows already in the sink from earlier invocations.
    pub rows_already_written: u64,
    pub pages_fetched: usize,
    pub rows_appended: u64,
    pub last_title: String,
    pub share_failure_count: u64,
    /// `(file id, reason)` of failed share lookups, capped at [`MAX_SHARE_FAILURES`].
    pub share_failures: Vec<(String, String)>,

    pub result: Option<PassResult>,
}

impl Default for PassState {
    fn default() -> Self {
        Self::new()
    }
}

impl PassState {
    pub fn new() -> Self {
        Self {
            phase: PassPhase::Idle,
            command: None,
            handle: None,
            sink: String::new(),
            resumed: false,
            rows_already_written: 0,
            pages_fetched: 0,
            rows_appended: 0,
            last_title: String::new(),
            share_failure_count: 0,
            share_failures: Vec::new(),
            result: None,
        }
    }

    /// Reset counters and track a freshly started pass.
    pub fn begin(&mut self, command: PassCommand, handle: Option<PassHandle>) {
        self.phase = match command {
            PassCommand::Start => PassPhase::Initializing,
            PassCommand::Continue | PassCommand::List => PassPhase::Listing,
        };
        self.command = Some(command);
        self.handle = handle;
        self.sink.clear();
        self.resumed = false;
        self.rows_already_written = 0;
        self.pages_fetched = 0;
        self.rows_appended = 0;
        self.last_title.clear();
        self.share_failure_count = 0;
        self.share_failures.clear();
        self.result = None;
    }

    /// Fold one message into the state. Returns `true` once the pass has ended.
    pub fn apply(&mut self, message: PassProgress) -> bool {
        match message {
            PassProgress::Initializing { sink } => {
                self.phase = PassPhase::Initializing;
                self.sink = sink;
            }
            PassProgress::Listing {
                resumed,
                rows_already_written,
            } => {
                self.phase = PassPhase::Listing;
                self.resumed = resumed;
                self.rows_already_written = rows_already_written;
                if resumed {
                    info!(
                        "Resuming after {} rows written earlier",
                        format_count(rows_already_written)
                    );
                }
            }
            PassProgress::PageFetched { index, records } => {
                self.pages_fetched += 1;
                debug!("Page {index}: {records} records");
            }
            PassProgress::RowAppended {
                title,
                rows_appended,
                ..
            } => {
                self.rows_appended = rows_appended;
                self.last_title = title;
                if rows_appended % PROGRESS_LOG_INTERVAL == 0 {
                    info!(
                        "{} rows appended ({} pages)",
                        format_count(rows_appended),
                        self.pages_fetched
                    );
                }
            }
            PassProgress::ShareLookupFailed { file_id, reason } => {
                self.share_failure_count += 1;
                if self.share_failures.len() < MAX_SHARE_FAILURES {
                    self.share_failures.push((file_id, reason));
                }
            }
            PassProgress::Complete { summary } | PassProgress::Cancelled { summary } => {
                self.rows_appended = summary.rows_appended;
                self.share_failure_count = summary.share_failures;
                self.finish(PassResult::Finished(summary));
                return true;
            }
            PassProgress::Failed { message } => {
                warn!("Pass failed: {message}");
                self.finish(PassResult::Failed(message));
                return true;
            }
        }
        false
    }

    fn finish(&mut self, result: PassResult) {
        self.phase = PassPhase::Idle;
        self.result = Some(result);
        if let Some(handle) = self.handle.take() {
            handle.join();
        }
    }

    /// Block until the pass reports its final message.
    pub fn wait(&mut self) -> Option<&PassResult> {
        while let Some(handle) = &self.handle {
            match handle.progress_rx.recv() {
                Ok(message) => {
                    if self.apply(message) {
                        break;
                    }
                }
                Err(_) => {
                    // Sender dropped without a final message.
                    self.finish(PassResult::Failed("pass thread exited unexpectedly".into()));
                    break;
                }
            }
        }
        self.result.as_ref()
    }

    /// `true` when the last pass stopped early and can be continued.
    pub fn was_cancelled(&self) -> bool {
        matches!(
            &self.result,
            Some(PassResult::Finished(summary)) if summary.outcome == PassOutcome::Cancelled
        )
    }
}
