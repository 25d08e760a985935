//! Top-level application configuration

use crate::env::EnvReader;
use crate::error::ConfigResult;
use crate::sections::{
    validate_sections, BackendsConfig, DevToolsConfig, LogConfig, RateLimitConfig, RedisConfig,
    ServerConfig, SessionConfig,
};
use crate::ttl::format_ttl_to_readable;
use serde::Serialize;

/// Complete configuration, built once at startup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AppConfig {
    /// Listener and file locations
    pub server: ServerConfig,
    /// Session cache
    pub session: SessionConfig,
    /// Redis connection
    pub redis: RedisConfig,
    /// Rate limits
    pub rate_limit: RateLimitConfig,
    /// Development helpers
    pub dev_tools: DevToolsConfig,
    /// Backend endpoints
    pub backends: BackendsConfig,
    /// Logging
    pub log: LogConfig,
    /// Allow users to switch business through `/api/update-sbi`
    pub sbi_selector_enabled: bool,
}

impl AppConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read and validate configuration from the process environment
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read and validate configuration through a variable lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let mut config = Self::default();
        config.merge_with_env(&EnvReader::new(lookup))?;
        config.validate()?;
        Ok(config)
    }

    fn merge_with_env(&mut self, env: &EnvReader<'_>) -> ConfigResult<()> {
        self.server.merge_with_env(env)?;
        self.session.merge_with_env(env)?;
        self.redis.merge_with_env(env)?;
        self.rate_limit.merge_with_env(env)?;
        self.dev_tools.merge_with_env(env)?;
        self.backends.merge_with_env(env)?;
        self.log.merge_with_env(env)?;
        self.sbi_selector_enabled = env.bool_or("SBI_SELECTOR_ENABLED", self.sbi_selector_enabled)?;
        Ok(())
    }

    /// Check cross-field consistency
    pub fn validate(&self) -> ConfigResult<()> {
        validate_sections(&self.session, &self.redis, &self.rate_limit, &self.backends)
    }

    /// With server section
    #[inline]
    #[must_use]
    pub fn with_server(mut self, server: ServerConfig) -> Self {
        self.server = server;
        self
    }

    /// With session section
    #[inline]
    #[must_use]
    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }

    /// With dev tools section
    #[inline]
    #[must_use]
    pub fn with_dev_tools(mut self, dev_tools: DevToolsConfig) -> Self {
        self.dev_tools = dev_tools;
        self
    }

    /// With backends section
    #[inline]
    #[must_use]
    pub fn with_backends(mut self, backends: BackendsConfig) -> Self {
        self.backends = backends;
        self
    }

    /// With the SBI selector switched on or off
    #[inline]
    #[must_use]
    pub fn with_sbi_selector(mut self, enabled: bool) -> Self {
        self.sbi_selector_enabled = enabled;
        self
    }

    /// Emit the effective settings at startup
    pub fn log_summary(&self) {
        tracing::info!(
            bind = %self.server.bind_address(),
            forms_dir = %self.server.forms_dir.display(),
            session_ttl = %format_ttl_to_readable(self.session.ttl_ms),
            single_instance_cache = self.redis.use_single_instance_cache,
            dev_tools = self.dev_tools.enabled,
            sbi_selector = self.sbi_selector_enabled,
            "configuration loaded"
        );
        if self.rate_limit.enabled {
            tracing::info!(
                points = self.rate_limit.points,
                window = %format_ttl_to_readable(self.rate_limit.duration_ms),
                "rate limits configured"
            );
        }
        if !self.redis.use_single_instance_cache {
            tracing::warn!(
                host = %self.redis.host,
                "Redis session cache requested; sessions are held in process by this build"
            );
        }
    }
}
