/// In-memory sink with a shared, cloneable handle.
///
/// The pass owns one handle while another stays with the caller, so rows
/// can be inspected after a background pass finishes.
use crate::error::Result;
use crate::model::ReportRow;
use crate::sink::ReportSink;
use parking_lot::Mutex;
use std::sync::Arc;

/// Snapshot of everything written to a [`MemorySink`].
#[derive(Debug, Clone, Default)]
pub struct MemorySheet {
    pub header: Option<Vec<String>>,
    pub header_bold: bool,
    pub frozen_rows: u32,
    pub rows: Vec<ReportRow>,
    /// How many times the sheet was cleared and re-headed.
    pub initialize_count: u32,
}

impl MemorySheet {
    /// Header row (if any) plus data rows.
    pub fn total_rows(&self) -> usize {
        self.rows.len() + usize::from(self.header.is_some())
    }
}

#[derive(Clone, Default)]
pub struct MemorySink {
    sheet: Arc<Mutex<MemorySheet>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> MemorySheet {
        self.sheet.lock().clone()
    }

    pub fn rows(&self) -> Vec<ReportRow> {
        self.sheet.lock().rows.clone()
    }
}

impl ReportSink for MemorySink {
    fn initialize(&mut self, headers: &[&str]) -> Result<()> {
        let mut sheet = self.sheet.lock();
        sheet.rows.clear();
        sheet.header = Some(headers.iter().map(|h| h.to_string()).collect());
        sheet.header_bold = true;
        sheet.frozen_rows = 1;
        sheet.initialize_count += 1;
        Ok(())
    }

    fn append(&mut self, row: &ReportRow) -> Result<()> {
        self.sheet.lock().rows.push(row.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory sheet".to_string()
    }
}
