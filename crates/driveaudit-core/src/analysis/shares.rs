/// Share inspector: reduces a record's permission list to `ShareInfo`.
///
/// Any failure of the permissions call (denied, not found, rate limited,
/// network, undecodable) is caught here and reported as
/// [`ShareLookup::Failed`]; one inaccessible record never aborts a report.
use crate::model::{ShareInfo, ShareLookup};
use crate::remote::DriveApi;
use crate::error::{AuditError, Result};
use tracing::warn;

/// Guard against a backend that keeps returning a continuation token.
const MAX_PERMISSION_PAGES: usize = 50;

pub struct ShareInspector<A> {
    api: A,
}

impl<A: DriveApi> ShareInspector<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// Look up and reduce the permissions of `record_id`.
    pub fn inspect(&self, record_id: &str) -> ShareLookup {
        match self.count_shares(record_id) {
            Ok(info) => ShareLookup::Confirmed(info),
            Err(e) => {
                warn!("Permission lookup for {record_id} failed, reporting as unshared: {e}");
                ShareLookup::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    fn count_shares(&self, record_id: &str) -> Result<ShareInfo> {
        let mut total = ShareInfo::default();
        let mut token: Option<String> = None;
        for _ in 0..MAX_PERMISSION_PAGES {
            let page = self.api.list_permissions(record_id, token.as_deref())?;
            let info = ShareInfo::from_permissions(&page.permissions);
            total.share_count += info.share_count;
            total.shared_with_others |= info.shared_with_others;
            token = page.next_page_token;
            if token.is_none() {
                return Ok(total);
            }
        }
        // A partial count is not a confirmed one.
        Err(AuditError::Remote(format!(
            "permission list exceeds {MAX_PERMISSION_PAGES} pages"
        )))
    }
}
