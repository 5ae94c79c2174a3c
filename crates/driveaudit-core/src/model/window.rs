/// The "recent" time window of a listing pass.
///
/// The boundary is computed once, when the pass begins, so every row of the
/// pass is compared against the same instant. A resumed pass rebuilds the
/// window from the boundary stored in its checkpoint.
use crate::error::{AuditError, Result};
use chrono::{DateTime, Months, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub months_back: u32,
    pub boundary: DateTime<Utc>,
}

impl TimeWindow {
    /// Window ending at `now` and reaching `months_back` calendar months into the past.
    ///
    /// Month arithmetic clamps to the last valid day, so 31 March minus one
    /// month is 28/29 February.
    pub fn ending_at(now: DateTime<Utc>, months_back: u32) -> Result<Self> {
        let boundary = now.checked_sub_months(Months::new(months_back)).ok_or_else(|| {
            AuditError::config(format!("months_back {months_back} reaches before the supported date range"))
        })?;
        Ok(Self {
            months_back,
            boundary,
        })
    }

    /// Window ending now.
    pub fn current(months_back: u32) -> Result<Self> {
        Self::ending_at(Utc::now(), months_back)
    }

    /// Rebuild a window from a boundary recorded earlier.
    pub fn with_boundary(months_back: u32, boundary: DateTime<Utc>) -> Self {
        Self {
            months_back,
            boundary,
        }
    }

    /// `true` when `instant` is at or after the boundary.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.boundary
    }
}
