/// DriveAudit Core: listing, share inspection, report sinks and resumable passes.
///
/// This crate contains all business logic with zero CLI dependencies.
///
/// # Modules
///
/// - [`model`]: File records, sharing state, report rows and the time window.
/// - [`remote`]: The storage API seam: Drive v3 over HTTPS, or an in-memory snapshot.
/// - [`listing`]: Query filter, paginated lister, checkpoints and the report pass.
/// - [`analysis`]: Per-record share inspection and row projection.
/// - [`sink`]: Google Sheets, CSV and in-memory report destinations.
/// - [`config`]: Explicit report configuration.
pub mod analysis;
pub mod config;
pub mod error;
pub mod listing;
pub mod model;
pub mod remote;
pub mod sink;

pub use error::{AuditError, Result};
