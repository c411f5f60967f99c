use std::env;
use std::time::Duration;

use crate::session::SESSION_DURATION;

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/bms-reports/v1";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Runtime settings of the console server
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsoleConfig {
    /// Base URL of the reporting REST API, without trailing slash
    pub api_base_url: String,
    pub bind_addr: String,
    pub session_ttl: Duration,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        ConsoleConfig {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            session_ttl: SESSION_DURATION,
        }
    }
}

impl ConsoleConfig {
    /// Read `REPORT_API_BASE_URL`, `CONSOLE_BIND` and `CONSOLE_SESSION_TTL`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from any key lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ConsoleConfig::default();

        if let Some(url) = lookup("REPORT_API_BASE_URL").filter(|v| !v.trim().is_empty()) {
            config.api_base_url = normalize_base_url(&url);
        }
        if let Some(addr) = lookup("CONSOLE_BIND").filter(|v| !v.trim().is_empty()) {
            config.bind_addr = addr.trim().to_string();
        }
        if let Some(secs) = lookup("CONSOLE_SESSION_TTL").and_then(|v| v.trim().parse::<u64>().ok()) {
            config.session_ttl = Duration::from_secs(secs);
        }

        config
    }

    /// Apply positional arguments: `[bind_addr] [api_base_url]`
    pub fn with_args(mut self, args: &[String]) -> Self {
        if let Some(addr) = args.first() {
            self.bind_addr = addr.clone();
        }
        if let Some(url) = args.get(1) {
            self.api_base_url = normalize_base_url(url);
        }
        self
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
