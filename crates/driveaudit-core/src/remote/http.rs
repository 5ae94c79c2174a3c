/// Authenticated JSON-over-HTTPS client shared by the Drive backend and the
/// Sheets sink.
use crate::error::{AuditError, Result};
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::trace;

pub struct ApiClient {
    client: Client,
    token: String,
}

impl ApiClient {
    /// Build a client sending `token` as a bearer credential.
    ///
    /// `timeout` of `None` disables the per-request timeout entirely.
    pub fn new(token: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("driveaudit/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AuditError::config(format!("could not build HTTP client: {e}")))?;
        Ok(Self {
            client,
            token: token.into(),
        })
    }

    /// `base` with `segments` appended, each percent-encoded.
    pub fn endpoint(base: &str, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(base)
            .map_err(|e| AuditError::config(format!("invalid API base URL '{base}': {e}")))?;
        url.path_segments_mut()
            .map_err(|_| AuditError::config(format!("API base URL '{base}' cannot take a path")))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub fn get_json<T: DeserializeOwned>(&self, url: Url, query: &[(&str, String)]) -> Result<T> {
        let request = self.client.get(url.clone()).query(query);
        self.execute("GET", url, request)
    }

    pub fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        url: Url,
        query: &[(&str, String)],
        body: &B,
    ) -> Result<T> {
        let request = self.client.post(url.clone()).query(query).json(body);
        self.execute("POST", url, request)
    }

    fn execute<T: DeserializeOwned>(
        &self,
        method: &'static str,
        url: Url,
        request: RequestBuilder,
    ) -> Result<T> {
        trace!("{method} {url}");
        let url_text = url.to_string();
        let response = request
            .bearer_auth(&self.token)
            .send()
            .map_err(|source| AuditError::Transport {
                url: url_text.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.text().map_err(|source| AuditError::Transport {
            url: url_text.clone(),
            source,
        })?;

        if !status.is_success() {
            return Err(AuditError::Http {
                method,
                url: url_text,
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        // Some endpoints (values:clear on an empty range) answer with an empty body.
        let body = if body.trim().is_empty() { "{}" } else { body.as_str() };
        serde_json::from_str(body).map_err(|e| AuditError::decode(format!("response from {url_text}"), e))
    }
}

/// Keep error bodies short enough for a log line.
fn truncate_body(body: &str) -> String {
    const MAX: usize = 512;
    if body.len() <= MAX {
        return body.to_string();
    }
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &body[..end])
}
