// Connection-level configuration shared by both builders.
// Loaded from code, from a serde source, or from MONTHLY_* environment variables.

use serde::{Deserialize, Serialize};

use crate::error::{Result, SdkError};

/// Default cache TTL in seconds.
pub const DEFAULT_CACHE_TTL: u64 = 60;

/// Settings that outlive a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Bearer credential sent in the Authorization header.
    pub access_token: String,
    /// Base path for the request builder.
    pub api_url: String,
    /// Base path for the storage builder.
    pub storage_url: String,
    /// Seconds a cached response remains valid.
    pub cache_ttl: u64,
    /// Suppresses mutating calls.
    pub read_only: bool,
    /// Enables the cache lookaround for GET calls.
    pub use_cache: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            api_url: String::new(),
            storage_url: String::new(),
            cache_ttl: DEFAULT_CACHE_TTL,
            read_only: false,
            use_cache: false,
        }
    }
}

impl Config {
    /// Load configuration from MONTHLY_* environment variables.
    ///
    /// `MONTHLY_ACCESS_TOKEN` is required; everything else falls back to defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_token = lookup("MONTHLY_ACCESS_TOKEN")
            .ok_or_else(|| SdkError::MissingConfig("MONTHLY_ACCESS_TOKEN".to_string()))?;

        let mut config = Self {
            access_token,
            ..Self::default()
        };

        if let Some(url) = lookup("MONTHLY_API_URL") {
            config.api_url = url;
        }
        if let Some(url) = lookup("MONTHLY_STORAGE_URL") {
            config.storage_url = url;
        }
        if let Some(ttl) = lookup("MONTHLY_CACHE_TTL") {
            config.cache_ttl = ttl
                .trim()
                .parse::<u64>()
                .map_err(|_| SdkError::InvalidConfig(format!("MONTHLY_CACHE_TTL={}", ttl)))?;
        }
        if let Some(flag) = lookup("MONTHLY_READ_ONLY") {
            config.read_only = parse_flag("MONTHLY_READ_ONLY", &flag)?;
        }
        if let Some(flag) = lookup("MONTHLY_USE_CACHE") {
            config.use_cache = parse_flag("MONTHLY_USE_CACHE", &flag)?;
        }

        Ok(config)
    }
}

fn parse_flag(name: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(SdkError::InvalidConfig(format!("{}={}", name, value))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.cache_ttl, 60);
        assert!(!config.read_only);
        assert!(!config.use_cache);
    }

    #[test]
    fn test_from_lookup_requires_token() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, SdkError::MissingConfig(_)));
    }

    #[test]
    fn test_from_lookup_reads_all_fields() {
        let config = Config::from_lookup(lookup_from(&[
            ("MONTHLY_ACCESS_TOKEN", "secret"),
            ("MONTHLY_API_URL", "https://api.test/"),
            ("MONTHLY_STORAGE_URL", "https://storage.test"),
            ("MONTHLY_CACHE_TTL", "120"),
            ("MONTHLY_READ_ONLY", "true"),
            ("MONTHLY_USE_CACHE", "1"),
        ]))
        .unwrap();

        assert_eq!(config.access_token, "secret");
        assert_eq!(config.api_url, "https://api.test/");
        assert_eq!(config.storage_url, "https://storage.test");
        assert_eq!(config.cache_ttl, 120);
        assert!(config.read_only);
        assert!(config.use_cache);
    }

    #[test]
    fn test_invalid_ttl() {
        let err = Config::from_lookup(lookup_from(&[
            ("MONTHLY_ACCESS_TOKEN", "secret"),
            ("MONTHLY_CACHE_TTL", "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, SdkError::InvalidConfig(_)));
    }

    #[test]
    fn test_deserialize_partial() {
        let config: Config =
            serde_json::from_str(r#"{"access_token":"t","read_only":true}"#).unwrap();
        assert_eq!(config.access_token, "t");
        assert!(config.read_only);
        assert_eq!(config.cache_ttl, DEFAULT_CACHE_TTL);
    }
}
