/// Error type shared by every component of the core crate.
///
/// Only listing-level failures travel through this type. Per-record
/// permission failures are converted into `ShareLookup::Failed` at the
/// share-inspector boundary and never surface here.
use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum AuditError {
    /// The remote API answered with a non-success status.
    #[error("{method} {url} returned HTTP {status}: {body}")]
    Http {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    /// The request never produced a response (DNS, TLS, connection reset, timeout).
    #[error("request to {url} failed")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A response or stored document could not be decoded.
    /// Malformed timestamps on file records end up here.
    #[error("could not decode {what}")]
    Decode {
        what: String,
        #[source]
        source: serde_json::Error,
    },

    /// Backend or paging failure that carries no HTTP status.
    #[error("remote error: {0}")]
    Remote(String),

    #[error("CSV write failed")]
    Csv(#[from] csv::Error),

    #[error("I/O error while accessing {0}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("could not spawn the pass thread")]
    Thread(#[source] std::io::Error),

    /// A stored checkpoint belongs to a different listing query.
    #[error(
        "checkpoint was recorded for query `{stored}` but the current query is `{current}`; run `start` to begin a fresh report"
    )]
    CheckpointMismatch { stored: String, current: String },
}

impl AuditError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn io(path: impl Into<PathBuf>, error: std::io::Error) -> Self {
        Self::Io(path.into(), error)
    }

    pub fn decode(what: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Decode {
            what: what.into(),
            source,
        }
    }

    /// Whether retrying the same request could plausibly succeed.
    ///
    /// Rate limiting (429), server errors (5xx) and transport failures are
    /// transient; everything else is a property of the request itself.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { status, .. } => *status == 429 || (500..600).contains(status),
            Self::Transport { .. } => true,
            _ => false,
        }
    }
}

/// Shared result alias for the core crate.
pub type Result<T> = std::result::Result<T, AuditError>;
