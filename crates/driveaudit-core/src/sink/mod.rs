/// Report sinks: where header and rows are written.
///
/// A sink never reorders or deduplicates: rows land in the order
/// [`ReportSink::append`] is called, and appending the same row twice stores
/// it twice. Each `append` is an independent write, so a pass stopped between
/// two appends leaves a well-formed report behind.
pub mod csv_file;
pub mod memory;
pub mod sheets;

use crate::config::{ReportConfig, SinkConfig};
use crate::error::{AuditError, Result};
use crate::model::ReportRow;

pub use csv_file::CsvSink;
pub use memory::{MemorySheet, MemorySink};
pub use sheets::SheetsSink;

pub trait ReportSink {
    /// Clear the destination and write the header row (bold, frozen where
    /// the format supports styling).
    fn initialize(&mut self, headers: &[&str]) -> Result<()>;

    /// Append one data row after everything written so far.
    fn append(&mut self, row: &ReportRow) -> Result<()>;

    /// Human-readable destination, for log lines.
    fn describe(&self) -> String;
}

impl<T: ReportSink + ?Sized> ReportSink for Box<T> {
    fn initialize(&mut self, headers: &[&str]) -> Result<()> {
        (**self).initialize(headers)
    }

    fn append(&mut self, row: &ReportRow) -> Result<()> {
        (**self).append(row)
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// Build the sink named by the configuration.
pub fn open_sink(config: &ReportConfig) -> Result<Box<dyn ReportSink + Send>> {
    match &config.sink {
        Some(SinkConfig::Csv { path }) => Ok(Box::new(CsvSink::new(path.clone()))),
        Some(SinkConfig::Sheets {
            spreadsheet_id,
            sheet_name,
        }) => Ok(Box::new(SheetsSink::from_config(
            config,
            spreadsheet_id,
            sheet_name,
        )?)),
        None => Err(AuditError::config("no report sink configured")),
    }
}
