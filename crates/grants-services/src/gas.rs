//! Grant Application Service submission

use crate::error::{AppError, AppResult};
use crate::http::HttpBackend;
use async_trait::async_trait;
use grants_state::GasPayload;
use serde_json::Value;

/// Path of the land application submission endpoint
pub const SUBMIT_LAND_APPLICATION_PATH: &str = "grants/actions/submit-land-application/invoke";

/// Outcome of an accepted submission
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionReceipt {
    /// Reference shown to the applicant
    pub reference: String,
    /// HTTP status returned by GAS
    pub status: u16,
    /// Response body, when GAS returned JSON
    pub response: Option<Value>,
}

/// Accepts finalized grant applications
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait GrantApplicationService: Send + Sync {
    /// Submit a mapped payload
    async fn submit(&self, payload: &GasPayload) -> AppResult<SubmissionReceipt>;
}

/// HTTP client for the Grant Application Service
#[derive(Debug, Clone)]
pub struct GasClient {
    backend: HttpBackend,
}

impl GasClient {
    /// Create client over a configured backend
    #[inline]
    #[must_use]
    pub fn new(backend: HttpBackend) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl GrantApplicationService for GasClient {
    async fn submit(&self, payload: &GasPayload) -> AppResult<SubmissionReceipt> {
        let url = self.backend.url(SUBMIT_LAND_APPLICATION_PATH);
        tracing::debug!(endpoint = %url, "submitting application to GAS");

        let request = self
            .backend
            .request(reqwest::Method::POST, &url)
            .json(payload);

        let response = match self.backend.send(&url, request).await {
            Ok(response) => response,
            Err(err) => {
                let err = AppError::from(err).with_context("sbi", payload.sbi.clone().unwrap_or(Value::Null));
                err.log_once();
                return Err(err);
            }
        };

        let status = response.status().as_u16();
        let body: Option<Value> = response.json().await.ok();
        let reference = body
            .as_ref()
            .and_then(reference_from_response)
            .unwrap_or_else(generate_reference);

        tracing::info!(reference = %reference, status, "application submitted to GAS");
        Ok(SubmissionReceipt {
            reference,
            status,
            response: body,
        })
    }
}

fn reference_from_response(body: &Value) -> Option<String> {
    ["clientRef", "reference", "referenceNumber"]
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
        .map(str::to_string)
}

/// Generate a reference in the `XXX-XXX-XXX` style
#[must_use]
pub fn generate_reference() -> String {
    let id = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
    format!("{}-{}-{}", &id[0..3], &id[3..6], &id[6..9])
}
