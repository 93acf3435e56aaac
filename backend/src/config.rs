//! Server configuration.
//!
//! Values come from the environment (a `.env` file is loaded first by the
//! binary). Unparseable values fall back to their defaults with a warning.

use std::path::PathBuf;

use crate::api::logs::log_warning;

pub const DEFAULT_PORT: u16 = 3000;

/// Upload size cap in megabytes.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 200;

pub const DEFAULT_SESSION_TTL_MINUTES: i64 = 60;

/// Runtime configuration for the HTTP server.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    pub max_upload_mb: usize,
    pub session_ttl_minutes: i64,
    /// Directory with the built frontend, served at `/` when set
    pub static_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            max_upload_mb: DEFAULT_MAX_UPLOAD_MB,
            session_ttl_minutes: DEFAULT_SESSION_TTL_MINUTES,
            static_dir: None,
        }
    }
}

impl Config {
    /// Read `DATASWEEP_*` variables from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            port: parse_or(&lookup, "DATASWEEP_PORT", defaults.port),
            max_upload_mb: parse_or(&lookup, "DATASWEEP_MAX_UPLOAD_MB", defaults.max_upload_mb),
            session_ttl_minutes: parse_or(
                &lookup,
                "DATASWEEP_SESSION_TTL_MINUTES",
                defaults.session_ttl_minutes,
            ),
            static_dir: lookup("DATASWEEP_STATIC_DIR")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from),
        }
    }

    /// Upload cap in bytes.
    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }

    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.session_ttl_minutes.max(1))
    }
}

fn parse_or<T: std::str::FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                log_warning(format!("Ignoring invalid {}={:?}, using default", key, raw));
                default
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[]));
        assert_eq!(config, Config::default());
        assert_eq!(config.max_upload_bytes(), 200 * 1024 * 1024);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("DATASWEEP_PORT", "8080"),
            ("DATASWEEP_MAX_UPLOAD_MB", "5"),
            ("DATASWEEP_SESSION_TTL_MINUTES", "15"),
            ("DATASWEEP_STATIC_DIR", "frontend/dist"),
        ]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_upload_bytes(), 5 * 1024 * 1024);
        assert_eq!(config.session_ttl(), chrono::Duration::minutes(15));
        assert_eq!(config.static_dir, Some(PathBuf::from("frontend/dist")));
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = Config::from_lookup(lookup(&[("DATASWEEP_PORT", "not-a-port")]));
        assert_eq!(config.port, DEFAULT_PORT);
    }
}
