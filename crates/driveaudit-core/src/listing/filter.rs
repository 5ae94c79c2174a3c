/// Record filter: the listing query predicate.
///
/// Selects non-folder, non-trashed records, optionally restricted to one
/// owner. The same predicate is available client-side through
/// [`RecordFilter::matches`] so the lister can drop anything a backend
/// returns outside it.
use crate::model::{FileRecord, FOLDER_MIME_TYPE};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordFilter {
    owner: Option<String>,
}

impl RecordFilter {
    /// Blank owners are treated as "no owner restriction".
    pub fn new(owner: Option<String>) -> Self {
        let owner = owner
            .map(|o| o.trim().to_string())
            .filter(|o| !o.is_empty());
        Self { owner }
    }

    /// Query string in the listing API's search syntax.
    pub fn query(&self) -> String {
        let mut q = format!("mimeType != '{FOLDER_MIME_TYPE}' and trashed = false");
        if let Some(owner) = &self.owner {
            q.push_str(&format!(" and '{}' in owners", escape_literal(owner)));
        }
        q
    }

    /// Client-side re-check of the folder and owner conditions.
    ///
    /// Trashed state is not part of the requested fields, so it is left to
    /// the remote side.
    pub fn matches(&self, record: &FileRecord) -> bool {
        if record.is_folder() {
            return false;
        }
        match &self.owner {
            Some(owner) => record.is_owned_by(owner),
            None => true,
        }
    }
}

/// Escape `\` and `'` for use inside a single-quoted query literal.
fn escape_literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '\\' || ch == '\'' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Owner;
    use chrono::{TimeZone, Utc};

    fn record(mime: &str, owner: &str) -> FileRecord {
        let t = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        FileRecord {
            id: "id".into(),
            name: "name".into(),
            mime_type: mime.into(),
            owners: vec![Owner::new(owner)],
            created_time: t,
            modified_time: t,
        }
    }

    #[test]
    fn query_without_owner() {
        let filter = RecordFilter::new(None);
        assert_eq!(
            filter.query(),
            "mimeType != 'application/vnd.google-apps.folder' and trashed = false"
        );
    }

    #[test]
    fn query_with_owner() {
        let filter = RecordFilter::new(Some("ana@example.com".into()));
        assert_eq!(
            filter.query(),
            "mimeType != 'application/vnd.google-apps.folder' and trashed = false and 'ana@example.com' in owners"
        );
    }

    #[test]
    fn owner_literal_is_escaped() {
        let filter = RecordFilter::new(Some(r"o'brien\x@example.com".into()));
        assert!(filter.query().ends_with(r"'o\'brien\\x@example.com' in owners"));
    }

    #[test]
    fn blank_owner_means_no_restriction() {
        assert_eq!(RecordFilter::new(Some("  ".into())), RecordFilter::new(None));
    }

    #[test]
    fn matches_rejects_folders_and_foreign_owners() {
        let filter = RecordFilter::new(Some("ana@example.com".into()));
        assert!(filter.matches(&record("text/plain", "ana@example.com")));
        assert!(!filter.matches(&record(FOLDER_MIME_TYPE, "ana@example.com")));
        assert!(!filter.matches(&record("text/plain", "bob@example.com")));
        assert!(RecordFilter::new(None).matches(&record("text/plain", "bob@example.com")));
    }
}
