/// Pass progress reporting: lightweight messages sent from the pass thread
/// to the frontend via a crossbeam channel.
use crate::model::TimeWindow;
use std::time::Duration;

/// Which user action started the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassCommand {
    /// Clear checkpoint and sink, write the header, list everything.
    Start,
    /// Resume from the stored checkpoint, or list from scratch without one.
    Continue,
    /// The bare listing pass: append every matching record, no checkpointing.
    List,
}

impl PassCommand {
    pub fn label(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Continue => "continue",
            Self::List => "list",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    /// Listing exhausted every page.
    Completed,
    /// Stopped between records by cancellation or the time budget.
    Cancelled,
    /// `continue` found a checkpoint that was already complete.
    AlreadyComplete,
}

/// Totals of one invocation.
#[derive(Debug, Clone)]
pub struct PassSummary {
    pub command: PassCommand,
    pub outcome: PassOutcome,
    pub window: TimeWindow,
    /// `true` when the pass picked up from a stored checkpoint.
    pub resumed: bool,
    pub pages: usize,
    pub rows_appended: u64,
    /// Records skipped on the resumed page because their rows already exist.
    pub rows_skipped: usize,
    /// Records dropped by the client-side filter.
    pub records_dropped: usize,
    pub share_failures: u64,
    pub elapsed: Duration,
}

impl PassSummary {
    pub fn new(command: PassCommand, window: TimeWindow) -> Self {
        Self {
            command,
            outcome: PassOutcome::Completed,
            window,
            resumed: false,
            pages: 0,
            rows_appended: 0,
            rows_skipped: 0,
            records_dropped: 0,
            share_failures: 0,
            elapsed: Duration::ZERO,
        }
    }
}

/// Progress updates sent from the pass thread.
#[derive(Debug, Clone)]
pub enum PassProgress {
    /// Checkpoint and sink are being cleared, header written.
    Initializing { sink: String },
    /// Listing has begun.
    Listing {
        resumed: bool,
        rows_already_written: u64,
    },
    PageFetched { index: usize, records: usize },
    RowAppended {
        file_id: String,
        title: String,
        rows_appended: u64,
    },
    /// A permission lookup failed; the row was written as unshared.
    ShareLookupFailed { file_id: String, reason: String },
    /// The pass finished (including "nothing left to do").
    Complete { summary: PassSummary },
    /// The pass stopped early; rows and checkpoint so far are kept.
    Cancelled { summary: PassSummary },
    /// A listing-level error aborted the pass.
    Failed { message: String },
}
