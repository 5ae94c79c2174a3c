/// Drive v3 REST backend.
use crate::config::{ReportConfig, ENV_ACCESS_TOKEN};
use crate::error::{AuditError, Result};
use crate::remote::http::ApiClient;
use crate::remote::{DriveApi, FilePage, ListRequest, PermissionPage, PERMISSION_FIELDS, PERMISSION_PAGE_SIZE};
use std::time::Duration;
use tracing::debug;

pub struct DriveClient {
    api: ApiClient,
    base_url: String,
}

impl DriveClient {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        Ok(Self {
            api: ApiClient::new(token, timeout)?,
            base_url: base_url.into(),
        })
    }

    /// Build from configuration. Authentication is delegated to the host
    /// environment, so a missing token is a configuration error.
    pub fn from_config(config: &ReportConfig) -> Result<Self> {
        let token = config.access_token.clone().ok_or_else(|| {
            AuditError::config(format!("no access token; set {ENV_ACCESS_TOKEN}"))
        })?;
        Self::new(
            config.drive_api_base.clone(),
            token,
            config.request_timeout_secs.map(Duration::from_secs),
        )
    }
}

impl DriveApi for DriveClient {
    fn list_files(&self, request: &ListRequest<'_>) -> Result<FilePage> {
        let url = ApiClient::endpoint(&self.base_url, &["files"])?;
        let mut query = vec![
            ("q", request.query.to_string()),
            ("pageSize", request.page_size.to_string()),
            ("fields", request.fields.to_string()),
            ("supportsAllDrives", "true".to_string()),
            ("includeItemsFromAllDrives", "true".to_string()),
        ];
        if let Some(token) = request.page_token {
            query.push(("pageToken", token.to_string()));
        }
        let page: FilePage = self.api.get_json(url, &query)?;
        debug!(
            "files.list returned {} records (more: {})",
            page.files.len(),
            page.next_page_token.is_some()
        );
        Ok(page)
    }

    fn list_permissions(&self, file_id: &str, page_token: Option<&str>) -> Result<PermissionPage> {
        let url = ApiClient::endpoint(&self.base_url, &["files", file_id, "permissions"])?;
        let mut query = vec![
            ("fields", PERMISSION_FIELDS.to_string()),
            ("pageSize", PERMISSION_PAGE_SIZE.to_string()),
            ("supportsAllDrives", "true".to_string()),
        ];
        if let Some(token) = page_token {
            query.push(("pageToken", token.to_string()));
        }
        self.api.get_json(url, &query)
    }
}
