//! Configuration module for depotline.
//!
//! Loads configuration from environment variables.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use url::Url;

/// Base URLs and fetch bound for the external systems.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    /// HR/ERP user-profile service (companies).
    pub hr_api_url: Url,
    /// Driver-management service.
    pub driver_api_url: Url,
    /// Location registry.
    pub location_api_url: Url,
    /// Bounded wait for a single upstream fetch.
    pub timeout: Duration,
}

/// Freshness window per entity family.
#[derive(Debug, Clone)]
pub struct CacheTtls {
    pub company: Duration,
    pub driver: Duration,
    pub location: Duration,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // HTTP
    pub bind_addr: SocketAddr,

    // MongoDB
    pub mongodb_uri: String,
    pub mongodb_database: String,

    // External systems
    pub upstream: UpstreamConfig,
    pub ttls: CacheTtls,
}

impl Config {
    /// Load configuration from environment variables (after `.env`).
    ///
    /// # Errors
    /// Returns error if a required variable is missing or a value does not parse.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |name: &str| var(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let required = |name: &str| var(name).with_context(|| format!("{name} must be set"));

        let url = |name: &str| -> Result<Url> {
            let raw = required(name)?;
            let url = Url::parse(&raw).with_context(|| format!("{name} is not a valid URL: {raw}"))?;
            if !matches!(url.scheme(), "http" | "https") {
                bail!("{name} must be an http(s) URL, got {raw}");
            }
            Ok(url)
        };

        let secs = |name: &str, default: u64| -> Result<Duration> {
            let secs = match var(name) {
                Some(raw) => raw
                    .parse::<u64>()
                    .with_context(|| format!("{name} must be a number of seconds, got {raw}"))?,
                None => default,
            };
            if secs == 0 {
                bail!("{name} must be greater than zero");
            }
            Ok(Duration::from_secs(secs))
        };

        let bind_addr = var("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be a socket address such as 0.0.0.0:8080")?;

        Ok(Self {
            bind_addr,
            mongodb_uri: required("MONGODB_URI")?,
            mongodb_database: var("MONGODB_DATABASE").unwrap_or_else(|| "depotline".to_string()),
            upstream: UpstreamConfig {
                hr_api_url: url("HR_API_URL")?,
                driver_api_url: url("DRIVER_API_URL")?,
                location_api_url: url("LOCATION_API_URL")?,
                timeout: secs("UPSTREAM_TIMEOUT_SECS", 15)?,
            },
            ttls: CacheTtls {
                company: secs("COMPANY_CACHE_TTL_SECS", 900)?,
                driver: secs("DRIVER_CACHE_TTL_SECS", 300)?,
                location: secs("LOCATION_CACHE_TTL_SECS", 900)?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("MONGODB_URI", "mongodb://localhost:27017"),
        ("HR_API_URL", "https://hr.example.com/api"),
        ("DRIVER_API_URL", "https://drivers.example.com"),
        ("LOCATION_API_URL", "http://locations.internal:9000/v1/"),
    ];

    #[test]
    fn test_defaults() {
        let config = load(REQUIRED).unwrap();
        assert_eq!(config.bind_addr.to_string(), "0.0.0.0:8080");
        assert_eq!(config.mongodb_database, "depotline");
        assert_eq!(config.upstream.timeout, Duration::from_secs(15));
        assert_eq!(config.ttls.company, Duration::from_secs(900));
        assert_eq!(config.ttls.driver, Duration::from_secs(300));
        assert_eq!(config.ttls.location, Duration::from_secs(900));
        assert_eq!(config.upstream.hr_api_url.host_str(), Some("hr.example.com"));
    }

    #[test]
    fn test_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("DRIVER_CACHE_TTL_SECS", "60"));
        pairs.push(("BIND_ADDR", "127.0.0.1:3000"));
        pairs.push(("MONGODB_DATABASE", " yard "));

        let config = load(&pairs).unwrap();
        assert_eq!(config.ttls.driver, Duration::from_secs(60));
        assert_eq!(config.bind_addr.port(), 3000);
        assert_eq!(config.mongodb_database, "yard");
    }

    #[test]
    fn test_missing_required() {
        let pairs: Vec<_> = REQUIRED
            .iter()
            .copied()
            .filter(|(k, _)| *k != "DRIVER_API_URL")
            .collect();
        let err = load(&pairs).unwrap_err();
        assert!(err.to_string().contains("DRIVER_API_URL"));
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("COMPANY_CACHE_TTL_SECS", "0"));
        assert!(load(&pairs).is_err());

        let mut pairs = REQUIRED.to_vec();
        pairs[1] = ("HR_API_URL", "ftp://hr.example.com");
        assert!(load(&pairs).is_err());

        let mut pairs = REQUIRED.to_vec();
        pairs.push(("UPSTREAM_TIMEOUT_SECS", "soon"));
        assert!(load(&pairs).is_err());
    }
}
