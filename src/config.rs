//! Runtime configuration for the exporters and the render service, read
//! from `GUIA_*` environment variables.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use url::Url;

use crate::error::ConfigError;

/// Client-side export settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    /// Render service base; may be relative (`/api`), in which case it is
    /// resolved against `origin`.
    pub api_base: String,
    pub origin: String,
    pub timeout: Duration,
    pub download_dir: PathBuf,
    /// Used when a 429 carries no `Retry-After`.
    pub rate_limit_cooldown: Duration,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            api_base: "/api".to_string(),
            origin: "http://localhost:8001".to_string(),
            timeout: Duration::from_secs(60),
            download_dir: PathBuf::from("."),
            rate_limit_cooldown: Duration::from_secs(60),
        }
    }
}

impl ExportConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key → value source; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(base) = lookup("GUIA_API_URL").filter(|v| !v.trim().is_empty()) {
            config.api_base = base.trim().to_string();
        }
        if let Some(origin) = lookup("GUIA_ORIGIN").filter(|v| !v.trim().is_empty()) {
            config.origin = origin.trim().to_string();
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "GUIA_TIMEOUT_SECS")? {
            config.timeout = Duration::from_secs(secs);
        }
        if let Some(dir) = lookup("GUIA_DOWNLOAD_DIR").filter(|v| !v.is_empty()) {
            config.download_dir = PathBuf::from(dir);
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "GUIA_RATE_LIMIT_COOLDOWN_SECS")? {
            config.rate_limit_cooldown = Duration::from_secs(secs);
        }
        config.endpoint()?;
        Ok(config)
    }

    /// Absolute URL of the export endpoint: `{base}/export`.
    pub fn endpoint(&self) -> Result<Url, ConfigError> {
        let base = self.api_base.trim_end_matches('/');
        let absolute = if base.starts_with("http://") || base.starts_with("https://") {
            format!("{base}/export")
        } else {
            let origin = self.origin.trim_end_matches('/');
            let base = base.trim_start_matches('/');
            if base.is_empty() {
                format!("{origin}/export")
            } else {
                format!("{origin}/{base}/export")
            }
        };
        Ok(Url::parse(&absolute)?)
    }
}

/// Render service settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub bind: SocketAddr,
    /// Requests allowed per client per window.
    pub rate_limit_max: u32,
    pub rate_limit_window: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8001)),
            rate_limit_max: 5,
            rate_limit_window: Duration::from_secs(60),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(bind) = parse_var::<SocketAddr>(&lookup, "GUIA_BIND")? {
            config.bind = bind;
        }
        if let Some(max) = parse_var::<u32>(&lookup, "GUIA_RATE_LIMIT_MAX")? {
            if max == 0 {
                return Err(ConfigError::InvalidValue {
                    key: "GUIA_RATE_LIMIT_MAX",
                    value: max.to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
            config.rate_limit_max = max;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "GUIA_RATE_LIMIT_WINDOW_SECS")? {
            config.rate_limit_window = Duration::from_secs(secs.max(1));
        }
        Ok(config)
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) if raw.trim().is_empty() => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::InvalidValue {
                key,
                value: raw.clone(),
                reason: e.to_string(),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_resolve_relative_base_against_origin() {
        let config = ExportConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.endpoint().unwrap().as_str(), "http://localhost:8001/api/export");
        assert_eq!(config.rate_limit_cooldown, Duration::from_secs(60));
    }

    #[test]
    fn absolute_base_is_used_as_is() {
        let config = ExportConfig::from_lookup(lookup(&[("GUIA_API_URL", "https://render.example.com/v1/")])).unwrap();
        assert_eq!(config.endpoint().unwrap().as_str(), "https://render.example.com/v1/export");
    }

    #[test]
    fn invalid_numbers_are_config_errors() {
        let err = ExportConfig::from_lookup(lookup(&[("GUIA_TIMEOUT_SECS", "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "GUIA_TIMEOUT_SECS", .. }));
        let err = ServerConfig::from_lookup(lookup(&[("GUIA_RATE_LIMIT_MAX", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { key: "GUIA_RATE_LIMIT_MAX", .. }));
    }

    #[test]
    fn server_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("GUIA_BIND", "127.0.0.1:9000"),
            ("GUIA_RATE_LIMIT_MAX", "2"),
        ]))
        .unwrap();
        assert_eq!(config.bind, "127.0.0.1:9000".parse().unwrap());
        assert_eq!(config.rate_limit_max, 2);
        assert_eq!(config.rate_limit_window, Duration::from_secs(60));
    }

    #[test]
    fn unparseable_origin_is_rejected() {
        let err = ExportConfig::from_lookup(lookup(&[("GUIA_ORIGIN", "not a url")])).unwrap_err();
        assert!(matches!(err, ConfigError::Endpoint(_)));
    }
}
