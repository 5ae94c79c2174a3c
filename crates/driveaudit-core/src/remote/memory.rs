/// In-memory backend serving a fixed snapshot of records and permissions.
///
/// Used for offline runs against a JSON fixture (`--fixture`) and as the
/// test double for the lister, the share inspector and the report pass.
/// Page tokens are decimal offsets into the record list, so a stored token
/// stays valid for as long as the snapshot is unchanged.
use crate::error::{AuditError, Result};
use crate::model::{FileRecord, Permission};
use crate::remote::{DriveApi, FilePage, ListRequest, PermissionPage, PERMISSION_PAGE_SIZE};
use parking_lot::Mutex;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

/// Permission list of one file, or the error its lookup produces.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PermissionEntry {
    List(Vec<Permission>),
    Error { error: String },
}

/// On-disk snapshot format.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub permissions: HashMap<String, PermissionEntry>,
}

#[derive(Default)]
pub struct InMemoryDrive {
    records: Vec<FileRecord>,
    permissions: HashMap<String, PermissionEntry>,
    failing_pages: Mutex<HashMap<usize, usize>>,
    permission_page_size: usize,
    list_calls: Mutex<Vec<Option<String>>>,
    permission_calls: Mutex<Vec<String>>,
}

impl InMemoryDrive {
    pub fn new(records: Vec<FileRecord>) -> Self {
        Self {
            records,
            permission_page_size: PERMISSION_PAGE_SIZE as usize,
            ..Self::default()
        }
    }

    pub fn from_fixture(fixture: Fixture) -> Self {
        let mut drive = Self::new(fixture.files);
        drive.permissions = fixture.permissions;
        drive
    }

    pub fn from_fixture_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| AuditError::io(path, e))?;
        let fixture: Fixture = serde_json::from_str(&text)
            .map_err(|e| AuditError::decode(format!("fixture {}", path.display()), e))?;
        Ok(Self::from_fixture(fixture))
    }

    pub fn with_permissions(mut self, file_id: &str, permissions: Vec<Permission>) -> Self {
        self.permissions
            .insert(file_id.to_string(), PermissionEntry::List(permissions));
        self
    }

    pub fn with_permission_error(mut self, file_id: &str, message: &str) -> Self {
        self.permissions.insert(
            file_id.to_string(),
            PermissionEntry::Error {
                error: message.to_string(),
            },
        );
        self
    }

    /// Make the `page_index`-th page (0-based) fail with a 503 on every call.
    pub fn with_failing_page(self, page_index: usize) -> Self {
        self.with_flaky_page(page_index, usize::MAX)
    }

    /// Make the `page_index`-th page fail with a 503 for the next `failures` calls.
    pub fn with_flaky_page(self, page_index: usize, failures: usize) -> Self {
        self.failing_pages.lock().insert(page_index, failures);
        self
    }

    pub fn with_permission_page_size(mut self, size: usize) -> Self {
        self.permission_page_size = size.max(1);
        self
    }

    /// Page tokens of every listing call so far (`None` for the first page).
    pub fn list_calls(&self) -> Vec<Option<String>> {
        self.list_calls.lock().clone()
    }

    /// File ids of every permission call so far, one entry per page fetched.
    pub fn permission_calls(&self) -> Vec<String> {
        self.permission_calls.lock().clone()
    }
}

fn parse_offset(token: Option<&str>) -> Result<usize> {
    match token {
        None => Ok(0),
        Some(t) => t
            .parse()
            .map_err(|_| AuditError::Remote(format!("invalid page token '{t}'"))),
    }
}

impl DriveApi for InMemoryDrive {
    fn list_files(&self, request: &ListRequest<'_>) -> Result<FilePage> {
        self.list_calls
            .lock()
            .push(request.page_token.map(str::to_string));

        let offset = parse_offset(request.page_token)?;
        let page_size = request.page_size.max(1) as usize;
        if let Some(remaining) = self.failing_pages.lock().get_mut(&(offset / page_size)).filter(|n| **n > 0) {
            *remaining -= 1;
            return Err(AuditError::Http {
                method: "GET",
                url: "memory://files".to_string(),
                status: 503,
                body: "backend unavailable".to_string(),
            });
        }

        let end = (offset + page_size).min(self.records.len());
        let files = self.records.get(offset..end).unwrap_or_default().to_vec();
        let next_page_token = (end < self.records.len()).then(|| end.to_string());
        Ok(FilePage {
            files,
            next_page_token,
        })
    }

    fn list_permissions(&self, file_id: &str, page_token: Option<&str>) -> Result<PermissionPage> {
        self.permission_calls.lock().push(file_id.to_string());

        let all = match self.permissions.get(file_id) {
            None => return Ok(PermissionPage::default()),
            Some(PermissionEntry::Error { error }) => return Err(AuditError::Remote(error.clone())),
            Some(PermissionEntry::List(list)) => list,
        };
        let offset = parse_offset(page_token)?;
        let end = (offset + self.permission_page_size).min(all.len());
        Ok(PermissionPage {
            permissions: all.get(offset..end).unwrap_or_default().to_vec(),
            next_page_token: (end < all.len()).then(|| end.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::LIST_FIELDS;

    fn request(token: Option<&str>, page_size: u32) -> ListRequest<'_> {
        ListRequest {
            query: "",
            page_size,
            page_token: token,
            fields: LIST_FIELDS,
        }
    }

    #[test]
    fn fixture_json_decodes_both_permission_shapes() {
        let fixture: Fixture = serde_json::from_str(
            r#"{
                "files": [{"id": "a", "name": "A", "mimeType": "text/plain",
                           "owners": [{"emailAddress": "ana@example.com"}],
                           "createdTime": "2023-01-01T00:00:00Z",
                           "modifiedTime": "2024-06-01T00:00:00Z"}],
                "permissions": {
                    "a": [{"role": "owner"}, {"role": "reader", "type": "user"}],
                    "b": {"error": "insufficientFilePermissions"}
                }
            }"#,
        )
        .unwrap();
        assert_eq!(fixture.files.len(), 1);
        assert!(matches!(fixture.permissions["a"], PermissionEntry::List(ref l) if l.len() == 2));
        assert!(matches!(fixture.permissions["b"], PermissionEntry::Error { .. }));
    }

    #[test]
    fn empty_store_returns_single_empty_page() {
        let drive = InMemoryDrive::new(Vec::new());
        let page = drive.list_files(&request(None, 10)).unwrap();
        assert!(page.files.is_empty());
        assert!(page.next_page_token.is_none());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let drive = InMemoryDrive::new(Vec::new());
        assert!(drive.list_files(&request(Some("zzz"), 10)).is_err());
    }
}
