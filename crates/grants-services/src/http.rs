//! Shared HTTP plumbing for backend clients

use crate::error::BackendError;
use grants_config::{BackendAuth, BackendConfig};
use reqwest::redirect::Policy;
use reqwest::{Client, IntoUrl, RequestBuilder, Response, Url};
use std::time::Duration;

const MAX_ERROR_BODY: usize = 512;

/// A configured backend: base URL, credentials and a pooled client
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    config: BackendConfig,
}

impl HttpBackend {
    /// Build a backend with a request timeout
    pub fn new(config: BackendConfig, timeout: Duration) -> Result<Self, BackendError> {
        Self::build(config, timeout, Policy::default())
    }

    /// Build a backend that hands redirects back to the caller
    pub fn without_redirects(config: BackendConfig, timeout: Duration) -> Result<Self, BackendError> {
        Self::build(config, timeout, Policy::none())
    }

    fn build(config: BackendConfig, timeout: Duration, redirects: Policy) -> Result<Self, BackendError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10).min(timeout))
            .timeout(timeout)
            .redirect(redirects)
            .build()
            .map_err(BackendError::Client)?;
        Ok(Self { client, config })
    }

    /// Absolute URL for a path under the base URL
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path.trim_start_matches('/'))
    }

    /// Absolute URL with each segment appended percent-encoded
    ///
    /// A segment can never contribute a `/`, `?` or `#` of its own.
    pub fn segments_url(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let invalid = |reason: String| BackendError::Url {
            base_url: self.config.base_url.clone(),
            reason,
        };
        let mut url = Url::parse(&self.config.base_url).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("base url cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Base URL
    #[inline]
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Start a request with credentials applied
    pub fn request(&self, method: reqwest::Method, url: impl IntoUrl) -> RequestBuilder {
        apply_auth(self.client.request(method, url), &self.config.auth)
    }

    /// Send a request, turning transport failures and error statuses into
    /// [`BackendError`]
    pub async fn send(&self, endpoint: &str, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await.map_err(|source| BackendError::Request {
            endpoint: endpoint.to_string(),
            source,
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let mut cut = MAX_ERROR_BODY;
            while !body.is_char_boundary(cut) {
                cut -= 1;
            }
            body.truncate(cut);
        }
        Err(BackendError::Status {
            endpoint: endpoint.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}

/// Apply configured credentials to a request
pub fn apply_auth(request: RequestBuilder, auth: &BackendAuth) -> RequestBuilder {
    match auth {
        BackendAuth::None => request,
        BackendAuth::Bearer(token) => request.bearer_auth(token),
        BackendAuth::Basic { username, password } => request.basic_auth(username, Some(password)),
    }
}
