//! Environment variable access
//!
//! Lookups go through a closure so configuration can be built from the
//! process environment or from a fixed map in tests.

use crate::error::{ConfigError, ConfigResult};
use std::str::FromStr;

pub(crate) struct EnvReader<'a> {
    lookup: Box<dyn Fn(&str) -> Option<String> + 'a>,
}

impl<'a> EnvReader<'a> {
    pub(crate) fn new(lookup: impl Fn(&str) -> Option<String> + 'a) -> Self {
        Self {
            lookup: Box::new(lookup),
        }
    }

    /// Trimmed value, with empty strings treated as unset
    pub(crate) fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    pub(crate) fn string_or(&self, key: &str, default: &str) -> String {
        self.string(key).unwrap_or_else(|| default.to_string())
    }

    pub(crate) fn bool_or(&self, key: &str, default: bool) -> ConfigResult<bool> {
        match self.string(key) {
            None => Ok(default),
            Some(raw) => parse_bool(&raw)
                .ok_or_else(|| ConfigError::invalid_value(key, raw, "boolean")),
        }
    }

    pub(crate) fn parse_or<T: FromStr>(
        &self,
        key: &str,
        default: T,
        expected: &'static str,
    ) -> ConfigResult<T> {
        match self.string(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse()
                .map_err(|_| ConfigError::invalid_value(key, raw, expected)),
        }
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}
