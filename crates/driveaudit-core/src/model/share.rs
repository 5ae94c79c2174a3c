/// Sharing state derived from a record's permission list.
use serde::{Deserialize, Serialize};

/// Role the permissions API assigns to the file owner.
pub const OWNER_ROLE: &str = "owner";

/// One entry of a permission list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    pub role: String,
    /// `user`, `group`, `domain` or `anyone`.
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl Permission {
    pub fn with_role(role: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            kind: None,
            email_address: None,
            domain: None,
        }
    }

    pub fn is_owner(&self) -> bool {
        self.role == OWNER_ROLE
    }
}

/// Reduced sharing state of one record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShareInfo {
    pub shared_with_others: bool,
    pub share_count: u32,
}

impl ShareInfo {
    /// Count every non-owner permission.
    pub fn from_permissions<'a>(permissions: impl IntoIterator<Item = &'a Permission>) -> Self {
        let share_count = permissions.into_iter().filter(|p| !p.is_owner()).count() as u32;
        Self {
            shared_with_others: share_count > 0,
            share_count,
        }
    }
}

/// Outcome of a permission lookup.
///
/// `Failed` is a best-effort result: the report still gets a row, with the
/// default `ShareInfo`, but callers can tell "confirmed unshared" apart from
/// "could not look it up".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShareLookup {
    Confirmed(ShareInfo),
    Failed { reason: String },
}

impl ShareLookup {
    /// The share info to report; `{false, 0}` for a failed lookup.
    pub fn info(&self) -> ShareInfo {
        match self {
            Self::Confirmed(info) => *info,
            Self::Failed { .. } => ShareInfo::default(),
        }
    }

    pub fn is_confirmed(&self) -> bool {
        matches!(self, Self::Confirmed(_))
    }
}
