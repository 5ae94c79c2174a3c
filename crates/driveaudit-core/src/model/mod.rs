/// Data model for DriveAudit.
///
/// Remote records, derived sharing state, the report row and the time window.
pub mod format;
pub mod record;
pub mod row;
pub mod share;
pub mod window;

pub use record::{FileRecord, Owner, FOLDER_MIME_TYPE};
pub use row::{Cell, ReportRow, REPORT_HEADERS};
pub use share::{Permission, ShareInfo, ShareLookup, OWNER_ROLE};
pub use window::TimeWindow;
