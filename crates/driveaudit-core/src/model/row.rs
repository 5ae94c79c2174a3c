/// One output row of the report.
///
/// Column order is fixed by [`REPORT_HEADERS`]; [`ReportRow::cells`] emits
/// values in exactly that order so every sink lays rows out identically.
use crate::model::format::format_timestamp;
use chrono::{DateTime, Utc};

/// Header row written by `ReportSink::initialize`.
pub const REPORT_HEADERS: [&str; 11] = [
    "File Name",
    "Queried Owner",
    "File ID",
    "Last Modified",
    "Owner Email",
    "MIME Type",
    "Created",
    "Modified Within Window",
    "Created Before Window, Modified Within",
    "Shared With Others",
    "Share Count",
];

/// A single typed cell, rendered by each sink in its own format.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Timestamp(DateTime<Utc>),
    Flag(bool),
    Count(u32),
}

impl Cell {
    /// Plain-text rendering used by text sinks (CSV, logs).
    pub fn render(&self) -> String {
        match self {
            Self::Text(s) => s.clone(),
            Self::Timestamp(t) => format_timestamp(*t),
            Self::Flag(b) => if *b { "TRUE" } else { "FALSE" }.to_string(),
            Self::Count(n) => n.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub title: String,
    pub queried_owner: String,
    pub file_id: String,
    pub modified_time: DateTime<Utc>,
    pub owner_email: String,
    pub mime_type: String,
    pub created_time: DateTime<Utc>,
    pub modified_in_window: bool,
    pub stale_but_recently_modified: bool,
    pub shared_with_others: bool,
    pub share_count: u32,
}

impl ReportRow {
    /// Cells in header order.
    pub fn cells(&self) -> [Cell; 11] {
        [
            Cell::Text(self.title.clone()),
            Cell::Text(self.queried_owner.clone()),
            Cell::Text(self.file_id.clone()),
            Cell::Timestamp(self.modified_time),
            Cell::Text(self.owner_email.clone()),
            Cell::Text(self.mime_type.clone()),
            Cell::Timestamp(self.created_time),
            Cell::Flag(self.modified_in_window),
            Cell::Flag(self.stale_but_recently_modified),
            Cell::Flag(self.shared_with_others),
            Cell::Count(self.share_count),
        ]
    }

    /// Cells rendered as text, in header order.
    pub fn rendered(&self) -> Vec<String> {
        self.cells().iter().map(Cell::render).collect()
    }
}
