//! Agreements UI pass-through

use crate::error::{AppError, AppResult};
use crate::http::HttpBackend;
use bytes::Bytes;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Method;

/// Header carrying the applicant's business to the agreements service
pub const SBI_HEADER: &str = "x-sbi";

static PATH_SEGMENT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[A-Za-z0-9\-._~!$&'()*+,;=:@]|%[0-9A-Fa-f]{2})+$")
        .expect("path segment pattern is valid")
});

fn is_dot_segment(segment: &str) -> bool {
    matches!(
        segment.to_ascii_lowercase().replace("%2e", ".").as_str(),
        "." | ".."
    )
}

/// Check a path below `/agreements` stays below it
///
/// Each segment must be non-empty, plain or percent-encoded URL text, and not
/// a dot segment. A single trailing `/` is kept.
pub fn checked_path(path: &str) -> AppResult<&str> {
    let trimmed = path.strip_suffix('/').unwrap_or(path);
    let valid = trimmed.is_empty()
        || trimmed
            .split('/')
            .all(|segment| PATH_SEGMENT.is_match(segment) && !is_dot_segment(segment));
    if valid {
        Ok(path)
    } else {
        Err(
            AppError::payload_validation("INVALID_AGREEMENTS_PATH", "agreements path is not allowed")
                .with_context("path", path),
        )
    }
}

/// Request forwarded to the agreements service
#[derive(Debug, Clone)]
pub struct ProxyRequest {
    /// HTTP method
    pub method: Method,
    /// Path below `/agreements`
    pub path: String,
    /// Raw query string, without `?`
    pub query: Option<String>,
    /// Request content type
    pub content_type: Option<String>,
    /// Request body
    pub body: Bytes,
    /// Business the session is acting for
    pub sbi: Option<String>,
}

/// Response relayed back to the browser
#[derive(Debug, Clone)]
pub struct ProxyResponse {
    /// HTTP status
    pub status: u16,
    /// Response content type
    pub content_type: Option<String>,
    /// Redirect target, if any
    pub location: Option<String>,
    /// Response body
    pub body: Bytes,
}

/// Forwards `/agreements/*` traffic to the agreements UI
#[derive(Debug, Clone)]
pub struct AgreementsProxy {
    backend: HttpBackend,
}

impl AgreementsProxy {
    /// Create proxy over a configured backend
    #[inline]
    #[must_use]
    pub fn new(backend: HttpBackend) -> Self {
        Self { backend }
    }

    /// Forward a request and relay the response, error statuses included
    pub async fn forward(&self, request: ProxyRequest) -> AppResult<ProxyResponse> {
        let path = checked_path(&request.path)?;
        let mut url = self.backend.url(&format!("agreements/{path}"));
        if let Some(query) = request.query.as_deref().filter(|q| !q.is_empty()) {
            url.push('?');
            url.push_str(query);
        }

        let mut builder = self
            .backend
            .request(request.method.clone(), &url)
            .body(request.body);
        if let Some(content_type) = &request.content_type {
            builder = builder.header(reqwest::header::CONTENT_TYPE, content_type);
        }
        if let Some(sbi) = &request.sbi {
            builder = builder.header(SBI_HEADER, sbi);
        }

        tracing::debug!(method = %request.method, endpoint = %url, "proxying agreements request");
        let response = builder.send().await.map_err(|source| {
            let err = AppError::backend("AGREEMENTS_UNAVAILABLE", "agreements service unavailable")
                .with_context("endpoint", url.clone())
                .with_source(source);
            err.log_once();
            err
        })?;

        let status = response.status().as_u16();
        let header = |name: reqwest::header::HeaderName| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let content_type = header(reqwest::header::CONTENT_TYPE);
        let location = header(reqwest::header::LOCATION);

        let body = response.bytes().await.map_err(|source| {
            AppError::backend("AGREEMENTS_INVALID_RESPONSE", "could not read agreements response")
                .with_context("endpoint", url.clone())
                .with_source(source)
        })?;

        Ok(ProxyResponse {
            status,
            content_type,
            location,
            body,
        })
    }
}
