//! Grants Config - startup configuration
//!
//! Every setting is read from the environment once at startup into an
//! [`AppConfig`], validated, and then passed explicitly to the parts of the
//! application that need it.
//!
//! # Example
//!
//! ```rust
//! use grants_config::{AppConfig, format_ttl_to_readable};
//!
//! let config = AppConfig::from_lookup(|key| match key {
//!     "PORT" => Some("8080".to_string()),
//!     _ => None,
//! })
//! .unwrap();
//!
//! assert_eq!(config.server.port, 8080);
//! assert_eq!(format_ttl_to_readable(config.session.ttl_ms), "4 hours");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod app;
mod env;
mod error;
mod sections;
mod ttl;

pub use app::AppConfig;
pub use error::{ConfigError, ConfigResult};
pub use sections::{
    BackendAuth, BackendConfig, BackendsConfig, DevToolsConfig, LogConfig, LogFormat,
    RateLimitConfig, RedisConfig, ServerConfig, SessionConfig,
};
pub use ttl::format_ttl_to_readable;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
