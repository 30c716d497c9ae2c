use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_STATE_PATH: &str = ".clinic-portal/state.json";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:4200";
pub const DEFAULT_TOAST_TTL_SECS: u64 = 3;

#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Base URL of the remote clinic API, without a trailing slash.
    pub api_url: String,
    /// File holding the client-persisted key-value pairs (session, preferences).
    pub state_path: PathBuf,
    pub bind_addr: String,
    pub toast_ttl_secs: u64,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            state_path: PathBuf::from(DEFAULT_STATE_PATH),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            toast_ttl_secs: DEFAULT_TOAST_TTL_SECS,
        }
    }
}

impl PortalConfig {
    pub fn from_env() -> Self {
        let config = Self {
            api_url: env::var("CLINIC_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| {
                    warn!("CLINIC_API_URL not set, using {}", DEFAULT_API_URL);
                    DEFAULT_API_URL.to_string()
                }),
            state_path: env::var("PORTAL_STATE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    warn!("PORTAL_STATE_PATH not set, using {}", DEFAULT_STATE_PATH);
                    PathBuf::from(DEFAULT_STATE_PATH)
                }),
            bind_addr: env::var("PORTAL_BIND_ADDR")
                .unwrap_or_else(|_| {
                    warn!("PORTAL_BIND_ADDR not set, using {}", DEFAULT_BIND_ADDR);
                    DEFAULT_BIND_ADDR.to_string()
                }),
            toast_ttl_secs: match env::var("PORTAL_TOAST_TTL_SECS") {
                Ok(raw) => raw.parse().unwrap_or_else(|_| {
                    warn!("PORTAL_TOAST_TTL_SECS is not a number ({}), using default", raw);
                    DEFAULT_TOAST_TTL_SECS
                }),
                Err(_) => DEFAULT_TOAST_TTL_SECS,
            },
        };

        if !config.is_configured() {
            warn!("Portal not fully configured - check CLINIC_API_URL and PORTAL_BIND_ADDR");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.api_url.is_empty() && self.socket_addr().is_some()
    }

    pub fn socket_addr(&self) -> Option<SocketAddr> {
        self.bind_addr.parse().ok()
    }

    pub fn toast_ttl(&self) -> Duration {
        Duration::from_secs(self.toast_ttl_secs)
    }

    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_usable() {
        let config = PortalConfig::default();
        assert!(config.is_configured());
        assert_eq!(config.toast_ttl(), Duration::from_secs(3));
    }

    #[test]
    fn bad_bind_address_is_not_configured() {
        let config = PortalConfig {
            bind_addr: "not-an-address".to_string(),
            ..PortalConfig::default()
        };
        assert!(!config.is_configured());
    }
}
