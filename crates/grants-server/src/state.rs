//! Shared request state

use grants_config::AppConfig;
use grants_forms::{FormRegistry, FormsEngine, PageServices};
use grants_services::{AgreementsProxy, AppResult, Backends, Identity, SessionStore};
use std::sync::Arc;

/// Everything a request handler needs, cheap to clone
#[derive(Debug, Clone)]
pub struct AppState {
    /// Startup configuration
    pub config: Arc<AppConfig>,
    /// Browser sessions
    pub sessions: SessionStore,
    /// Form journeys
    pub engine: Arc<FormsEngine>,
    /// Agreements pass-through
    pub agreements: AgreementsProxy,
}

impl AppState {
    /// Load forms and build backend clients from configuration
    pub fn from_config(config: AppConfig) -> AppResult<Self> {
        let registry = FormRegistry::from_dir(&config.server.forms_dir)?;
        let backends = Backends::from_config(&config.backends)?;
        Ok(Self::new(config, registry, backends))
    }

    /// Assemble state from parts
    #[must_use]
    pub fn new(config: AppConfig, registry: FormRegistry, backends: Backends) -> Self {
        let services = PageServices {
            gas: backends.gas,
            land_grants: backends.land_grants,
        };
        Self {
            sessions: SessionStore::new(&config.session),
            engine: Arc::new(FormsEngine::new(registry, services)),
            agreements: backends.agreements,
            config: Arc::new(config),
        }
    }

    /// Identity given to a new session
    #[must_use]
    pub fn default_identity(&self) -> Identity {
        if self.config.dev_tools.enabled {
            Identity::demo(&self.config.dev_tools)
        } else {
            Identity::default()
        }
    }
}
