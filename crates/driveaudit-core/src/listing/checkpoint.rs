/// Resume checkpoints.
///
/// A checkpoint pins a pass to its query and window boundary and records how
/// far it got: the token of the page in progress plus how many of that
/// page's records already have rows. `continue` re-fetches that page, skips
/// the finished records and carries on.
///
/// Delivery is at-least-once: a stop between a row append and the following
/// checkpoint save repeats that one row on resume.
use crate::error::{AuditError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Listing query the pass was started with.
    pub query: String,
    pub months_back: u32,
    pub window_boundary: DateTime<Utc>,
    /// Token that fetches the page in progress; `None` for the first page.
    pub page_token: Option<String>,
    /// Records of that page whose rows are already in the sink.
    pub rows_done_in_page: usize,
    /// Data rows written by this pass across all invocations.
    pub rows_written: u64,
    pub complete: bool,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn begin(query: impl Into<String>, months_back: u32, window_boundary: DateTime<Utc>) -> Self {
        Self {
            query: query.into(),
            months_back,
            window_boundary,
            page_token: None,
            rows_done_in_page: 0,
            rows_written: 0,
            complete: false,
            updated_at: Utc::now(),
        }
    }

    /// One more row of the current page is in the sink.
    pub fn record_row(&mut self) {
        self.rows_done_in_page += 1;
        self.rows_written += 1;
        self.updated_at = Utc::now();
    }

    /// The current page is finished; the next one starts at `next_token`.
    pub fn advance_page(&mut self, next_token: Option<String>) {
        match next_token {
            Some(token) => {
                self.page_token = Some(token);
                self.rows_done_in_page = 0;
            }
            None => self.complete = true,
        }
        self.updated_at = Utc::now();
    }
}

/// Persistence for checkpoints.
pub trait CheckpointStore {
    fn load(&self) -> Result<Option<Checkpoint>>;
    fn save(&self, checkpoint: &Checkpoint) -> Result<()>;
    fn clear(&self) -> Result<()>;

    /// `false` for stores that never keep anything.
    fn is_persistent(&self) -> bool {
        true
    }
}

impl<T: CheckpointStore + ?Sized> CheckpointStore for Box<T> {
    fn load(&self) -> Result<Option<Checkpoint>> {
        (**self).load()
    }

    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        (**self).save(checkpoint)
    }

    fn clear(&self) -> Result<()> {
        (**self).clear()
    }

    fn is_persistent(&self) -> bool {
        (**self).is_persistent()
    }
}

/// Checkpointing disabled: every `continue` re-lists from the first page.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCheckpoint;

impl CheckpointStore for NoCheckpoint {
    fn load(&self) -> Result<Option<Checkpoint>> {
        Ok(None)
    }

    fn save(&self, _checkpoint: &Checkpoint) -> Result<()> {
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        Ok(())
    }

    fn is_persistent(&self) -> bool {
        false
    }
}

/// JSON checkpoint file, replaced atomically on every save.
#[derive(Debug, Clone)]
pub struct FileCheckpoint {
    path: PathBuf,
}

impl FileCheckpoint {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl CheckpointStore for FileCheckpoint {
    fn load(&self) -> Result<Option<Checkpoint>> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(AuditError::io(&self.path, e)),
        };
        let checkpoint = serde_json::from_str(&text)
            .map_err(|e| AuditError::decode(format!("checkpoint {}", self.path.display()), e))?;
        Ok(Some(checkpoint))
    }

    fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let json = serde_json::to_string_pretty(checkpoint)
            .map_err(|e| AuditError::decode("checkpoint", e))?;
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(|e| AuditError::io(dir, e))?;
        }
        let tmp = self.temp_path();
        std::fs::write(&tmp, json).map_err(|e| AuditError::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| AuditError::io(&self.path, e))?;
        debug!(
            "Checkpoint saved: page {:?}, {} done in page, {} total",
            checkpoint.page_token, checkpoint.rows_done_in_page, checkpoint.rows_written
        );
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AuditError::io(&self.path, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::TempDir;

    fn sample() -> Checkpoint {
        let boundary = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Checkpoint::begin("trashed = false", 6, boundary)
    }

    #[test]
    fn progress_bookkeeping() {
        let mut cp = sample();
        cp.record_row();
        cp.record_row();
        assert_eq!(cp.rows_done_in_page, 2);
        cp.advance_page(Some("next".into()));
        assert_eq!(cp.page_token.as_deref(), Some("next"));
        assert_eq!(cp.rows_done_in_page, 0);
        assert_eq!(cp.rows_written, 2);
        assert!(!cp.complete);
        cp.advance_page(None);
        assert!(cp.complete);
    }

    #[test]
    fn file_store_round_trip_and_clear() {
        let tmp = TempDir::new().unwrap();
        let store = FileCheckpoint::new(tmp.path().join("state").join("checkpoint.json"));
        assert_eq!(store.load().unwrap(), None);

        let mut cp = sample();
        cp.record_row();
        store.save(&cp).unwrap();
        assert_eq!(store.load().unwrap(), Some(cp));
        assert!(!store.temp_path().exists(), "temp file must be renamed away");

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn corrupt_file_is_an_error_not_a_fresh_start() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("checkpoint.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(FileCheckpoint::new(path).load().is_err());
    }

    #[test]
    fn disabled_store_keeps_nothing() {
        let store = NoCheckpoint;
        store.save(&sample()).unwrap();
        assert_eq!(store.load().unwrap(), None);
        assert!(!store.is_persistent());
    }
}
