/// Paginated lister: follows the listing API's continuation token.
///
/// [`Lister::pages`] is lazy: it fetches one page per `next()` call, so the
/// report pass only ever holds a single page in memory. [`Lister::list_all`]
/// is the eager form, concatenating every page in the order received.
///
/// # Failure policy
///
/// A failed page call ends the iteration: the error is yielded once and the
/// iterator is exhausted afterwards. With the default [`RetryPolicy`] no call
/// is retried. A non-zero policy retries transient failures (429, 5xx,
/// transport) with exponential backoff before giving up.
use crate::error::Result;
use crate::listing::filter::RecordFilter;
use crate::model::FileRecord;
use crate::remote::{DriveApi, FilePage, ListRequest, LIST_FIELDS};
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub const NONE: Self = Self {
        attempts: 0,
        base_delay: Duration::ZERO,
    };

    pub fn new(attempts: u32, base_delay: Duration) -> Self {
        Self {
            attempts,
            base_delay,
        }
    }

    /// Delay before retry number `retry` (0-based): `base * 2^retry`, capped at one minute.
    pub fn delay(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.base_delay
            .saturating_mul(factor)
            .min(Duration::from_secs(60))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::NONE
    }
}

/// One page of matching records.
#[derive(Debug, Clone)]
pub struct Page {
    /// 0-based position of this page within the iteration.
    pub index: usize,
    /// Token that fetched this page; `None` for the first page of a query.
    pub token: Option<String>,
    pub records: Vec<FileRecord>,
    /// Token of the following page; `None` on the last page.
    pub next_token: Option<String>,
    /// Records the backend returned that failed the client-side filter.
    pub dropped: usize,
}

pub struct Lister<A> {
    api: A,
    filter: RecordFilter,
    query: String,
    page_size: u32,
    retry: RetryPolicy,
}

impl<A: DriveApi> Lister<A> {
    pub fn new(api: A, filter: RecordFilter, page_size: u32) -> Self {
        let query = filter.query();
        Self {
            api,
            filter,
            query,
            page_size,
            retry: RetryPolicy::NONE,
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Lazily iterate pages, starting at `start_token` (`None` = first page).
    pub fn pages(&self, start_token: Option<String>) -> Pages<'_, A> {
        Pages {
            lister: self,
            next: Some(start_token),
            index: 0,
        }
    }

    /// Every matching record, pages concatenated in received order.
    pub fn list_all(&self) -> Result<Vec<FileRecord>> {
        let mut all = Vec::new();
        for page in self.pages(None) {
            all.extend(page?.records);
        }
        Ok(all)
    }

    fn fetch(&self, token: Option<&str>) -> Result<FilePage> {
        let request = ListRequest {
            query: &self.query,
            page_size: self.page_size,
            page_token: token,
            fields: LIST_FIELDS,
        };
        let mut retry = 0;
        loop {
            match self.api.list_files(&request) {
                Ok(page) => return Ok(page),
                Err(e) if e.is_transient() && retry < self.retry.attempts => {
                    let delay = self.retry.delay(retry);
                    warn!(
                        "Listing page failed ({e}); retry {}/{} in {delay:?}",
                        retry + 1,
                        self.retry.attempts
                    );
                    std::thread::sleep(delay);
                    retry += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Lazy page iterator returned by [`Lister::pages`].
pub struct Pages<'a, A> {
    lister: &'a Lister<A>,
    /// `Some(token)` while another page is due; `None` once exhausted.
    next: Option<Option<String>>,
    index: usize,
}

impl<A: DriveApi> Iterator for Pages<'_, A> {
    type Item = Result<Page>;

    fn next(&mut self) -> Option<Self::Item> {
        let token = self.next.take()?;
        let page = match self.lister.fetch(token.as_deref()) {
            Ok(page) => page,
            Err(e) => return Some(Err(e)),
        };

        let fetched = page.files.len();
        let records: Vec<FileRecord> = page
            .files
            .into_iter()
            .filter(|r| self.lister.filter.matches(r))
            .collect();
        let dropped = fetched - records.len();
        if dropped > 0 {
            warn!("Dropped {dropped} record(s) outside the listing filter");
        }

        let index = self.index;
        self.index += 1;
        self.next = page.next_page_token.clone().map(Some);
        debug!("Page {index}: {} records", records.len());

        Some(Ok(Page {
            index,
            token,
            records,
            next_token: page.next_page_token,
            dropped,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Owner;
    use crate::remote::InMemoryDrive;
    use chrono::{TimeZone, Utc};

    fn records(n: usize, owner: &str) -> Vec<FileRecord> {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| FileRecord {
                id: format!("f{i}").into(),
                name: format!("File {i}"),
                mime_type: "text/plain".into(),
                owners: vec![Owner::new(owner)],
                created_time: t,
                modified_time: t,
            })
            .collect()
    }

    fn ids(records: &[FileRecord]) -> Vec<String> {
        records.iter().map(|r| r.id.to_string()).collect()
    }

    /// Pages must be concatenated in order and every token consumed.
    #[test]
    fn list_all_concatenates_pages_in_order() {
        let drive = InMemoryDrive::new(records(7, "ana@example.com"));
        let lister = Lister::new(&drive, RecordFilter::new(None), 3);

        let all = lister.list_all().unwrap();
        assert_eq!(ids(&all), ids(&records(7, "ana@example.com")));
        assert_eq!(
            drive.list_calls(),
            vec![None, Some("3".to_string()), Some("6".to_string())]
        );
    }

    #[test]
    fn pages_carry_their_tokens() {
        let drive = InMemoryDrive::new(records(4, "ana@example.com"));
        let lister = Lister::new(&drive, RecordFilter::new(None), 2);

        let pages: Vec<Page> = lister.pages(None).collect::<Result<_>>().unwrap();
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].token, None);
        assert_eq!(pages[0].next_token.as_deref(), Some("2"));
        assert_eq!(pages[1].token.as_deref(), Some("2"));
        assert_eq!(pages[1].next_token, None);
    }

    #[test]
    fn pages_can_start_mid_stream() {
        let drive = InMemoryDrive::new(records(5, "ana@example.com"));
        let lister = Lister::new(&drive, RecordFilter::new(None), 2);

        let rest: Vec<Page> = lister
            .pages(Some("2".to_string()))
            .collect::<Result<_>>()
            .unwrap();
        let seen: Vec<String> = rest.iter().flat_map(|p| ids(&p.records)).collect();
        assert_eq!(seen, vec!["f2", "f3", "f4"]);
    }

    /// A failing page ends the iteration after yielding the error once.
    #[test]
    fn page_failure_is_yielded_then_iteration_stops() {
        let drive = InMemoryDrive::new(records(6, "ana@example.com")).with_failing_page(1);
        let lister = Lister::new(&drive, RecordFilter::new(None), 2);

        let mut pages = lister.pages(None);
        assert!(pages.next().unwrap().is_ok());
        assert!(pages.next().unwrap().is_err());
        assert!(pages.next().is_none());
        assert!(lister.list_all().is_err());
    }

    #[test]
    fn no_retry_by_default() {
        let drive = InMemoryDrive::new(records(2, "ana@example.com")).with_flaky_page(0, 1);
        let lister = Lister::new(&drive, RecordFilter::new(None), 10);
        assert!(lister.list_all().is_err());
        assert_eq!(drive.list_calls().len(), 1);
    }

    #[test]
    fn transient_failures_are_retried_when_enabled() {
        let drive = InMemoryDrive::new(records(2, "ana@example.com")).with_flaky_page(0, 2);
        let lister = Lister::new(&drive, RecordFilter::new(None), 10)
            .with_retry(RetryPolicy::new(2, Duration::ZERO));
        assert_eq!(lister.list_all().unwrap().len(), 2);
        assert_eq!(drive.list_calls().len(), 3);
    }

    /// Every record returned for an owner query must list that owner.
    #[test]
    fn owner_filter_holds_even_against_a_lax_backend() {
        let mut mixed = records(3, "ana@example.com");
        mixed.extend(records(2, "bob@example.com"));
        let drive = InMemoryDrive::new(mixed);
        let lister = Lister::new(&drive, RecordFilter::new(Some("ana@example.com".into())), 2);

        let all = lister.list_all().unwrap();
        assert_eq!(all.len(), 3);
        assert!(all.iter().all(|r| r.is_owned_by("ana@example.com")));
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::new(5, Duration::from_millis(500));
        assert_eq!(policy.delay(0), Duration::from_millis(500));
        assert_eq!(policy.delay(1), Duration::from_millis(1_000));
        assert_eq!(policy.delay(3), Duration::from_millis(4_000));
        assert_eq!(policy.delay(40), Duration::from_secs(60));
    }
}
