/// CSV file sink.
///
/// CSV carries no styling, so the header is simply the first record. Every
/// append reopens the file in append mode and flushes before returning, so
/// an interrupted pass never leaves a half-written row behind a complete one.
use crate::error::{AuditError, Result};
use crate::model::ReportRow;
use crate::sink::ReportSink;
use std::fs::OpenOptions;
use std::path::PathBuf;

pub struct CsvSink {
    path: PathBuf,
}

impl CsvSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn write_record<I, S>(&self, truncate: bool, record: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<[u8]>,
    {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(!truncate)
            .truncate(truncate)
            .open(&self.path)
            .map_err(|e| AuditError::io(&self.path, e))?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);
        writer.write_record(record)?;
        writer.flush().map_err(|e| AuditError::io(&self.path, e))?;
        Ok(())
    }
}

impl ReportSink for CsvSink {
    fn initialize(&mut self, headers: &[&str]) -> Result<()> {
        self.write_record(true, headers)
    }

    fn append(&mut self, row: &ReportRow) -> Result<()> {
        self.write_record(false, row.rendered())
    }

    fn describe(&self) -> String {
        format!("CSV file {}", self.path.display())
    }
}
