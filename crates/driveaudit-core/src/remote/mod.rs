/// Remote storage API: the seam between the report pass and the service.
///
/// Two backends implement [`DriveApi`]:
/// - [`drive::DriveClient`] talks to the Drive v3 REST API over HTTPS.
/// - [`memory::InMemoryDrive`] serves a fixed snapshot (fixture files, tests).
///
/// Both are called strictly sequentially by the pass; neither needs to be `Sync`.
pub mod drive;
pub mod http;
pub mod memory;

use crate::error::Result;
use crate::model::{FileRecord, Permission};
use serde::Deserialize;

pub use drive::DriveClient;
pub use memory::InMemoryDrive;

/// Partial-response field mask for the listing call.
pub const LIST_FIELDS: &str =
    "nextPageToken,files(id,name,mimeType,owners(emailAddress,displayName),createdTime,modifiedTime)";

/// Partial-response field mask for the permissions call.
pub const PERMISSION_FIELDS: &str = "nextPageToken,permissions(role,type,emailAddress,domain)";

/// Page size requested when following permission-list pagination.
pub const PERMISSION_PAGE_SIZE: u32 = 100;

/// Parameters of one listing call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListRequest<'a> {
    pub query: &'a str,
    pub page_size: u32,
    pub page_token: Option<&'a str>,
    pub fields: &'a str,
}

/// One page of the listing response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilePage {
    #[serde(default)]
    pub files: Vec<FileRecord>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// One page of the permissions response.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionPage {
    #[serde(default)]
    pub permissions: Vec<Permission>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// Read-only access to the file store.
pub trait DriveApi {
    /// Fetch one page of files matching `request.query`.
    fn list_files(&self, request: &ListRequest<'_>) -> Result<FilePage>;

    /// Fetch one page of the permission list of `file_id`.
    fn list_permissions(&self, file_id: &str, page_token: Option<&str>) -> Result<PermissionPage>;
}

impl<T: DriveApi + ?Sized> DriveApi for Box<T> {
    fn list_files(&self, request: &ListRequest<'_>) -> Result<FilePage> {
        (**self).list_files(request)
    }

    fn list_permissions(&self, file_id: &str, page_token: Option<&str>) -> Result<PermissionPage> {
        (**self).list_permissions(file_id, page_token)
    }
}

impl<T: DriveApi + ?Sized> DriveApi for &T {
    fn list_files(&self, request: &ListRequest<'_>) -> Result<FilePage> {
        (**self).list_files(request)
    }

    fn list_permissions(&self, file_id: &str, page_token: Option<&str>) -> Result<PermissionPage> {
        (**self).list_permissions(file_id, page_token)
    }
}
