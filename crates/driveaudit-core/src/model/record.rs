/// A single file's metadata as returned by the listing API.
///
/// Records are read-only snapshots: the remote store owns them, this crate
/// only reads, projects and reports them. Field names follow the Drive v3
/// JSON representation so a page response deserialises straight into
/// `Vec<FileRecord>`.
use chrono::{DateTime, Utc};
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// MIME type the storage service uses for folders.
pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";

/// An owner entry on a file record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Owner {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email_address: Some(email.into()),
            display_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    /// Opaque identifier, unique per record.
    pub id: CompactString,
    /// Title as shown to users.
    pub name: String,
    #[serde(default)]
    pub mime_type: CompactString,
    #[serde(default)]
    pub owners: Vec<Owner>,
    pub created_time: DateTime<Utc>,
    pub modified_time: DateTime<Utc>,
}

impl FileRecord {
    /// Email of the first listed owner, or `""` when the service returned none
    /// (shared-drive items have no owners).
    pub fn owner_email(&self) -> &str {
        self.owners
            .iter()
            .find_map(|o| o.email_address.as_deref())
            .unwrap_or("")
    }

    /// Case-insensitive membership test against the owner list.
    pub fn is_owned_by(&self, email: &str) -> bool {
        self.owners.iter().any(|o| {
            o.email_address
                .as_deref()
                .is_some_and(|addr| addr.eq_ignore_ascii_case(email))
        })
    }

    pub fn is_folder(&self) -> bool {
        self.mime_type == FOLDER_MIME_TYPE
    }
}
