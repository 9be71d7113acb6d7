//! Resolved runtime settings: CLI flags over profile over environment over defaults.

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::api::HttpApiConfig;
use crate::error::ConfigError;
use crate::monitor::{PollSettings, DEFAULT_HISTORY_LIMIT, DEFAULT_POLL_INTERVAL};
use crate::profiles::ProfileEntry;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub const API_URL_ENV: &str = "ECOPULSE_API_URL";

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub base_url: Url,
    pub chat_url: Option<Url>,
    pub tls_ca: Option<PathBuf>,
    pub poll: PollSettings,
    pub request_timeout: Option<Duration>,
}

/// Base URL used when neither the command line nor a profile names one.
pub fn fallback_url() -> String {
    std::env::var(API_URL_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

fn parse_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|source| ConfigError::Url {
        url: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Scheme(other.to_string())),
    }
}

impl Settings {
    pub fn from_entry(entry: &ProfileEntry) -> Result<Self, ConfigError> {
        let base_url = parse_url(&entry.url)?;
        let chat_url = entry.chat_url.as_deref().map(parse_url).transpose()?;

        let interval = entry
            .interval_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_POLL_INTERVAL);
        if interval.is_zero() {
            return Err(ConfigError::Zero {
                name: "poll interval",
            });
        }
        let history_limit = entry.history_limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
        if history_limit == 0 {
            return Err(ConfigError::Zero {
                name: "history limit",
            });
        }
        // 0 disables the timeout
        let request_timeout = match entry.timeout_secs {
            Some(0) => None,
            Some(s) => Some(Duration::from_secs(s)),
            None => Some(DEFAULT_REQUEST_TIMEOUT),
        };

        Ok(Self {
            base_url,
            chat_url,
            tls_ca: entry.tls_ca.as_ref().map(PathBuf::from),
            poll: PollSettings {
                interval,
                history_limit,
            },
            request_timeout,
        })
    }

    /// Reads the CA file, if any, and builds the HTTP client configuration.
    pub fn http_config(&self) -> std::io::Result<HttpApiConfig> {
        let ca_pem = self.tls_ca.as_ref().map(std::fs::read).transpose()?;
        Ok(HttpApiConfig {
            base_url: self.base_url.clone(),
            chat_url: self.chat_url.clone(),
            request_timeout: self.request_timeout,
            ca_pem,
        })
    }
}
