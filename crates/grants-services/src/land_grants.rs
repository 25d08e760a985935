//! Land Grants API parcel lookups

use crate::error::{AppError, AppResult, BackendError};
use crate::http::HttpBackend;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A quantity with its unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measurement {
    /// Unit of measure
    #[serde(default)]
    pub unit: String,
    /// Amount
    pub value: f64,
}

/// An action available on a parcel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelAction {
    /// Action code
    pub code: String,
    /// Description shown to the applicant
    #[serde(default)]
    pub description: String,
    /// Area the action may cover
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_area: Option<Measurement>,
}

/// Parcel details returned by the Land Grants API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParcelDetails {
    /// Parcel identifier
    pub parcel_id: String,
    /// Sheet identifier
    pub sheet_id: String,
    /// Parcel area
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Measurement>,
    /// Actions available on the parcel
    #[serde(default)]
    pub actions: Vec<ParcelAction>,
}

#[derive(Debug, Deserialize)]
struct ParcelResponse {
    parcel: ParcelDetails,
}

/// Source of parcel information
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait LandGrantsApi: Send + Sync {
    /// Fetch details for one parcel
    async fn fetch_parcel(&self, sheet_id: &str, parcel_id: &str) -> AppResult<ParcelDetails>;
}

/// HTTP client for the Land Grants API
#[derive(Debug, Clone)]
pub struct LandGrantsClient {
    backend: HttpBackend,
}

impl LandGrantsClient {
    /// Create client over a configured backend
    #[inline]
    #[must_use]
    pub fn new(backend: HttpBackend) -> Self {
        Self { backend }
    }

    async fn fetch(&self, parcel: &str) -> Result<ParcelDetails, BackendError> {
        let url = self.backend.segments_url(&["parcel", parcel])?;
        let endpoint = url.to_string();
        let request = self.backend.request(reqwest::Method::GET, url);
        let response = self.backend.send(&endpoint, request).await?;
        let body: ParcelResponse = response.json().await.map_err(|source| BackendError::Decode {
            endpoint,
            source,
        })?;
        Ok(body.parcel)
    }
}

#[async_trait]
impl LandGrantsApi for LandGrantsClient {
    async fn fetch_parcel(&self, sheet_id: &str, parcel_id: &str) -> AppResult<ParcelDetails> {
        let parcel = format!("{sheet_id}-{parcel_id}");
        tracing::debug!(%parcel, "fetching parcel from Land Grants API");

        self.fetch(&parcel).await.map_err(|err| {
            let err = AppError::from(err).with_context("parcelId", parcel);
            err.log_once();
            err
        })
    }
}
