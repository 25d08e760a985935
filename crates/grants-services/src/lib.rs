//! Grants Services - everything that leaves the process
//!
//! - [`GasClient`]: submits applications to the Grant Application Service
//! - [`LandGrantsClient`]: looks up parcels in the Land Grants API
//! - [`AgreementsProxy`]: relays `/agreements` traffic
//! - [`SessionStore`]: per-browser journey state with a TTL
//! - [`AppError`]: the error type every layer propagates
//!
//! Backends sit behind the [`GrantApplicationService`] and [`LandGrantsApi`]
//! traits so page handlers can be exercised without a network.

#![warn(unreachable_pub)]
#![warn(missing_docs)]

pub mod agreements;
pub mod error;
pub mod gas;
pub mod http;
pub mod land_grants;
pub mod session;

pub use agreements::{AgreementsProxy, ProxyRequest, ProxyResponse};
pub use error::{AppError, AppResult, BackendError, ErrorKind};
pub use gas::{GasClient, GrantApplicationService, SubmissionReceipt};
pub use http::HttpBackend;
pub use land_grants::{LandGrantsApi, LandGrantsClient, Measurement, ParcelAction, ParcelDetails};
pub use session::{
    Identity, JourneyState, Session, SessionId, SessionStore, SubmissionRecord, SESSION_COOKIE,
};

#[cfg(any(test, feature = "mocks"))]
pub use gas::MockGrantApplicationService;
#[cfg(any(test, feature = "mocks"))]
pub use land_grants::MockLandGrantsApi;

use grants_config::BackendsConfig;
use std::sync::Arc;
use std::time::Duration;

/// Backend clients built from configuration
#[derive(Clone)]
pub struct Backends {
    /// Grant Application Service
    pub gas: Arc<dyn GrantApplicationService>,
    /// Land Grants API
    pub land_grants: Arc<dyn LandGrantsApi>,
    /// Agreements UI
    pub agreements: AgreementsProxy,
}

impl Backends {
    /// Build HTTP clients for every configured backend
    pub fn from_config(config: &BackendsConfig) -> AppResult<Self> {
        let timeout = Duration::from_millis(config.timeout_ms);
        Ok(Self {
            gas: Arc::new(GasClient::new(HttpBackend::new(config.gas.clone(), timeout)?)),
            land_grants: Arc::new(LandGrantsClient::new(HttpBackend::new(
                config.land_grants.clone(),
                timeout,
            )?)),
            agreements: AgreementsProxy::new(HttpBackend::without_redirects(
                config.agreements.clone(),
                timeout,
            )?),
        })
    }
}

impl std::fmt::Debug for Backends {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backends")
            .field("agreements", &self.agreements)
            .finish_non_exhaustive()
    }
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
