/// Listing module: the filter, the paginated lister, resume checkpoints and
/// the report pass that ties them together.
///
/// [`ReportPass::run`] executes a pass on the calling thread. [`start_pass`]
/// moves the pass onto a named worker thread and hands back a [`PassHandle`]
/// for progress messages and cancellation, so a frontend can keep reporting
/// while the pass works.
pub mod checkpoint;
pub mod filter;
pub mod lister;
pub mod pass;
pub mod progress;

use crate::error::{AuditError, Result};
use crate::remote::DriveApi;
use crate::sink::ReportSink;
use crossbeam_channel::Receiver;
use progress::{PassCommand, PassOutcome, PassProgress};
use std::thread;
use tracing::error;

pub use checkpoint::{Checkpoint, CheckpointStore, FileCheckpoint, NoCheckpoint};
pub use filter::RecordFilter;
pub use lister::{Lister, Page, RetryPolicy};
pub use pass::{ReportPass, StopSignal};
pub use progress::PassSummary;

/// Maximum number of progress messages that may queue up in the channel.
///
/// A pass emits a handful of messages per record and records arrive at the
/// pace of two remote calls each, so the frontend never falls far behind.
/// If it does, the pass blocks briefly instead of buffering without bound.
pub const PROGRESS_CHANNEL_CAPACITY: usize = 1_024;

/// Handle to a running or finished pass.
#[derive(Debug)]
pub struct PassHandle {
    /// Receiver for progress updates from the pass thread.
    pub progress_rx: Receiver<PassProgress>,
    stop: StopSignal,
    thread: Option<thread::JoinHandle<()>>,
}

impl PassHandle {
    /// Ask the pass to stop before its next record.
    pub fn cancel(&self) {
        self.stop.cancel();
    }

    /// Wait for the pass thread to exit.
    pub fn join(mut self) {
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                error!("Pass thread panicked");
            }
        }
    }
}

/// Start `command` on a background thread.
///
/// The final message on the channel is always one of `Complete`, `Cancelled`
/// or `Failed`.
pub fn start_pass<A, S, C>(
    mut pass: ReportPass<A, S, C>,
    command: PassCommand,
    stop: StopSignal,
) -> Result<PassHandle>
where
    A: DriveApi + Send + 'static,
    S: ReportSink + Send + 'static,
    C: CheckpointStore + Send + 'static,
{
    let (progress_tx, progress_rx) =
        crossbeam_channel::bounded::<PassProgress>(PROGRESS_CHANNEL_CAPACITY);
    let thread_stop = stop.clone();

    let thread = thread::Builder::new()
        .name("driveaudit-pass".into())
        .spawn(move || {
            let message = match pass.run(command, &thread_stop, Some(&progress_tx)) {
                Ok(summary) if summary.outcome == PassOutcome::Cancelled => {
                    PassProgress::Cancelled { summary }
                }
                Ok(summary) => PassProgress::Complete { summary },
                Err(e) => {
                    let message = error_chain(&e);
                    error!("Pass `{}` aborted: {message}", command.label());
                    PassProgress::Failed { message }
                }
            };
            let _ = progress_tx.send(message);
        })
        .map_err(AuditError::Thread)?;

    Ok(PassHandle {
        progress_rx,
        stop,
        thread: Some(thread),
    })
}

/// An error and all of its sources, joined with `: `.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
