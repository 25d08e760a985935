//! Configuration sections
//!
//! Each section has a `Default` matching the documented environment
//! defaults, `with_*` builders for tests, and reads its own variables.

use crate::env::EnvReader;
use crate::error::{ConfigError, ConfigResult};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::PathBuf;

/// HTTP listener and file locations
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Directory holding form definition YAML files
    pub forms_dir: PathBuf,
    /// Directory holding `javascripts/` and `assets/`
    pub static_dir: PathBuf,
}

impl ServerConfig {
    /// With port
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// With forms directory
    #[inline]
    #[must_use]
    pub fn with_forms_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.forms_dir = dir.into();
        self
    }

    /// `host:port`
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub(crate) fn merge_with_env(&mut self, env: &EnvReader<'_>) -> ConfigResult<()> {
        self.host = env.string_or("HOST", &self.host);
        self.port = env.parse_or("PORT", self.port, "port number")?;
        if let Some(dir) = env.string("FORMS_DIR") {
            self.forms_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env.string("STATIC_DIR") {
            self.static_dir = PathBuf::from(dir);
        }
        Ok(())
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            forms_dir: PathBuf::from("forms"),
            static_dir: PathBuf::from("public"),
        }
    }
}

/// Session cache settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SessionConfig {
    /// Session time-to-live in milliseconds
    pub ttl_ms: u64,
    /// Maximum number of cached sessions
    pub max_capacity: u64,
}

impl SessionConfig {
    /// With TTL in milliseconds
    #[inline]
    #[must_use]
    pub fn with_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.ttl_ms = ttl_ms;
        self
    }

    pub(crate) fn merge_with_env(&mut self, env: &EnvReader<'_>) -> ConfigResult<()> {
        self.ttl_ms = env.parse_or("SESSION_CACHE_TTL", self.ttl_ms, "milliseconds")?;
        self.max_capacity = env.parse_or(
            "SESSION_CACHE_MAX_CAPACITY",
            self.max_capacity,
            "positive integer",
        )?;
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_ms: 4 * 60 * 60 * 1000,
            max_capacity: 10_000,
        }
    }
}

/// Redis connection settings
///
/// Only consulted when the single-instance cache is disabled.
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct RedisConfig {
    /// Host name
    pub host: String,
    /// Port
    pub port: u16,
    /// Username, empty for none
    pub username: String,
    /// Password, never serialized
    #[serde(skip)]
    pub password: String,
    /// Prefix applied to every key
    pub key_prefix: String,
    /// Connect over TLS
    pub tls: bool,
    /// Keep sessions in process instead of Redis
    pub use_single_instance_cache: bool,
}

impl RedisConfig {
    pub(crate) fn merge_with_env(&mut self, env: &EnvReader<'_>) -> ConfigResult<()> {
        self.host = env.string_or("REDIS_HOST", &self.host);
        self.port = env.parse_or("REDIS_PORT", self.port, "port number")?;
        self.username = env.string_or("REDIS_USERNAME", &self.username);
        self.password = env.string_or("REDIS_PASSWORD", &self.password);
        self.key_prefix = env.string_or("REDIS_KEY_PREFIX", &self.key_prefix);
        self.tls = env.bool_or("REDIS_TLS", self.tls)?;
        self.use_single_instance_cache =
            env.bool_or("USE_SINGLE_INSTANCE_CACHE", self.use_single_instance_cache)?;
        Ok(())
    }
}

impl fmt::Debug for RedisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("key_prefix", &self.key_prefix)
            .field("tls", &self.tls)
            .field("use_single_instance_cache", &self.use_single_instance_cache)
            .finish()
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            username: String::new(),
            password: String::new(),
            key_prefix: "grants-ui:".to_string(),
            tls: false,
            use_single_instance_cache: true,
        }
    }
}

/// Request rate limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitConfig {
    /// Whether limits apply
    pub enabled: bool,
    /// Trust `X-Forwarded-For` when identifying clients
    pub trust_proxy: bool,
    /// Requests allowed per window
    pub points: u32,
    /// Window length in milliseconds
    pub duration_ms: u64,
    /// Requests allowed per window on auth routes
    pub auth_points: u32,
    /// Submissions allowed per window
    pub submission_points: u32,
}

impl RateLimitConfig {
    pub(crate) fn merge_with_env(&mut self, env: &EnvReader<'_>) -> ConfigResult<()> {
        self.enabled = env.bool_or("RATE_LIMIT_ENABLED", self.enabled)?;
        self.trust_proxy = env.bool_or("RATE_LIMIT_TRUST_PROXY", self.trust_proxy)?;
        self.points = env.parse_or("RATE_LIMIT_POINTS", self.points, "positive integer")?;
        self.duration_ms = env.parse_or("RATE_LIMIT_DURATION", self.duration_ms, "milliseconds")?;
        self.auth_points =
            env.parse_or("RATE_LIMIT_AUTH_POINTS", self.auth_points, "positive integer")?;
        self.submission_points = env.parse_or(
            "RATE_LIMIT_SUBMISSION_POINTS",
            self.submission_points,
            "positive integer",
        )?;
        Ok(())
    }

    fn validate(&self) -> ConfigResult<()> {
        if !self.enabled {
            return Ok(());
        }
        if self.duration_ms == 0 {
            return Err(ConfigError::Invalid(
                "RATE_LIMIT_DURATION must be greater than zero".to_string(),
            ));
        }
        if self.points == 0 || self.auth_points == 0 || self.submission_points == 0 {
            return Err(ConfigError::Invalid(
                "rate limit points must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            trust_proxy: true,
            points: 100,
            duration_ms: 60_000,
            auth_points: 10,
            submission_points: 5,
        }
    }
}

/// Local development helpers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DevToolsConfig {
    /// Expose `/dev` routes and seed demo identity
    pub enabled: bool,
    /// Reference number shown on the demo confirmation page
    pub demo_ref_number: String,
    /// Business name shown on the demo confirmation page
    pub demo_business_name: String,
    /// SBI used for the demo identity
    pub demo_sbi: String,
    /// Contact name shown on the demo confirmation page
    pub demo_contact_name: String,
}

impl DevToolsConfig {
    /// Enable dev tools
    #[inline]
    #[must_use]
    pub fn enabled(mut self) -> Self {
        self.enabled = true;
        self
    }

    pub(crate) fn merge_with_env(&mut self, env: &EnvReader<'_>) -> ConfigResult<()> {
        self.enabled = env.bool_or("DEV_TOOLS_ENABLED", self.enabled)?;
        self.demo_ref_number = env.string_or("DEV_DEMO_REF_NUMBER", &self.demo_ref_number);
        self.demo_business_name = env.string_or("DEV_DEMO_BUSINESS_NAME", &self.demo_business_name);
        self.demo_sbi = env.string_or("DEV_DEMO_SBI", &self.demo_sbi);
        self.demo_contact_name = env.string_or("DEV_DEMO_CONTACT_NAME", &self.demo_contact_name);
        Ok(())
    }
}

impl Default for DevToolsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            demo_ref_number: "DEV2024001".to_string(),
            demo_business_name: "Demo Farm Ltd".to_string(),
            demo_sbi: "106284736".to_string(),
            demo_contact_name: "John Smith".to_string(),
        }
    }
}

/// Credentials sent to a backend
#[derive(Clone, PartialEq, Eq, Default)]
pub enum BackendAuth {
    /// No credentials
    #[default]
    None,
    /// `Authorization: Bearer <token>`
    Bearer(String),
    /// HTTP basic auth
    Basic {
        /// User name
        username: String,
        /// Password
        password: String,
    },
}

impl BackendAuth {
    fn from_env(env: &EnvReader<'_>, prefix: &str) -> Self {
        if let Some(token) = env.string(&format!("{prefix}_AUTH_TOKEN")) {
            return Self::Bearer(token);
        }
        match (
            env.string(&format!("{prefix}_AUTH_USER")),
            env.string(&format!("{prefix}_AUTH_PASSWORD")),
        ) {
            (Some(username), Some(password)) => Self::Basic { username, password },
            _ => Self::None,
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Bearer(_) => "bearer",
            Self::Basic { .. } => "basic",
        }
    }
}

impl fmt::Debug for BackendAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BackendAuth({})", self.kind())
    }
}

impl Serialize for BackendAuth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.kind())
    }
}

/// One backend endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    /// Credentials
    pub auth: BackendAuth,
}

impl BackendConfig {
    /// Create backend config without credentials
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth: BackendAuth::None,
        }
    }

    /// With credentials
    #[inline]
    #[must_use]
    pub fn with_auth(mut self, auth: BackendAuth) -> Self {
        self.auth = auth;
        self
    }

    fn merge_with_env(&mut self, env: &EnvReader<'_>, url_key: &str, auth_prefix: &str) {
        if let Some(url) = env.string(url_key) {
            self.base_url = url.trim_end_matches('/').to_string();
        }
        let auth = BackendAuth::from_env(env, auth_prefix);
        if auth != BackendAuth::None {
            self.auth = auth;
        }
    }

    fn validate(&self, name: &str) -> ConfigResult<()> {
        if self.base_url.starts_with("http://") || self.base_url.starts_with("https://") {
            Ok(())
        } else {
            Err(ConfigError::Invalid(format!(
                "{name} must be an http(s) URL, got '{}'",
                self.base_url
            )))
        }
    }
}

/// Backend services the frontend calls
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BackendsConfig {
    /// Grant Application Service
    pub gas: BackendConfig,
    /// Land Grants API
    pub land_grants: BackendConfig,
    /// Agreements UI reached through `/agreements`
    pub agreements: BackendConfig,
    /// Per-request timeout in milliseconds
    pub timeout_ms: u64,
}

impl BackendsConfig {
    pub(crate) fn merge_with_env(&mut self, env: &EnvReader<'_>) -> ConfigResult<()> {
        self.gas.merge_with_env(env, "GAS_API_URL", "GAS_API");
        self.land_grants
            .merge_with_env(env, "LAND_GRANTS_API_URL", "LAND_GRANTS_API");
        self.agreements.merge_with_env(env, "AGREEMENTS_UI_URL", "AGREEMENTS_API");
        if let Some(token) = env.string("AGREEMENTS_API_TOKEN") {
            self.agreements.auth = BackendAuth::Bearer(token);
        }
        self.timeout_ms = env.parse_or("BACKEND_TIMEOUT_MS", self.timeout_ms, "milliseconds")?;
        Ok(())
    }

    fn validate(&self) -> ConfigResult<()> {
        self.gas.validate("GAS_API_URL")?;
        self.land_grants.validate("LAND_GRANTS_API_URL")?;
        self.agreements.validate("AGREEMENTS_UI_URL")?;
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "BACKEND_TIMEOUT_MS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BackendsConfig {
    fn default() -> Self {
        Self {
            gas: BackendConfig::new("http://localhost:3001"),
            land_grants: BackendConfig::new("http://localhost:3002"),
            agreements: BackendConfig::new("http://localhost:3555"),
            timeout_ms: 30_000,
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines
    #[default]
    Pretty,
    /// One JSON object per event
    Json,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogConfig {
    /// `tracing` filter directive
    pub level: String,
    /// Output format
    pub format: LogFormat,
}

impl LogConfig {
    pub(crate) fn merge_with_env(&mut self, env: &EnvReader<'_>) -> ConfigResult<()> {
        if let Some(level) = env.string("RUST_LOG").or_else(|| env.string("LOG_LEVEL")) {
            self.level = level;
        }
        if let Some(format) = env.string("LOG_FORMAT") {
            self.format = match format.to_ascii_lowercase().as_str() {
                "json" | "ecs" => LogFormat::Json,
                "pretty" | "text" => LogFormat::Pretty,
                _ => return Err(ConfigError::invalid_value("LOG_FORMAT", format, "json or pretty")),
            };
        }
        Ok(())
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

pub(crate) fn validate_sections(
    session: &SessionConfig,
    redis: &RedisConfig,
    rate_limit: &RateLimitConfig,
    backends: &BackendsConfig,
) -> ConfigResult<()> {
    if session.ttl_ms == 0 {
        return Err(ConfigError::Invalid(
            "SESSION_CACHE_TTL must be greater than zero".to_string(),
        ));
    }
    if session.max_capacity == 0 {
        return Err(ConfigError::Invalid(
            "SESSION_CACHE_MAX_CAPACITY must be greater than zero".to_string(),
        ));
    }
    if !redis.use_single_instance_cache && redis.host.is_empty() {
        return Err(ConfigError::Invalid(
            "REDIS_HOST is required when USE_SINGLE_INSTANCE_CACHE is false".to_string(),
        ));
    }
    rate_limit.validate()?;
    backends.validate()
}
