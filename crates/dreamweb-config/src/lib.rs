//! DreamWeb runtime configuration
//!
//! Settings are read from `dreamweb.toml` and may be overridden per process
//! with `DREAMWEB_*` environment variables.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default file name looked up in the working directory.
pub const CONFIG_FILE: &str = "dreamweb.toml";

/// Errors raised while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct DreamwebConfig {
    /// Mount point and page identity
    pub runtime: RuntimeConfig,
    /// Development channel settings
    pub dev: DevConfig,
    /// Outbound HTTP settings for the API widget
    pub http: HttpConfig,
    /// Toast stack settings
    pub toast: ToastConfig,
    /// Log filter settings
    pub log: LogConfig,
}

/// Mount point and page identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RuntimeConfig {
    /// `id` of the element the tree is rendered into
    pub root_id: String,
    /// Address the page is served from; drives dev host detection
    pub page_url: Option<String>,
}

/// Development channel settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DevConfig {
    /// Connect to the dev server when the page is on a loopback host
    pub live_reload: bool,
    /// Delay before reconnecting after the channel closes
    pub reconnect_delay_ms: u64,
}

/// Outbound HTTP settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout; unset leaves the transport default in place
    pub timeout_ms: Option<u64>,
    /// User agent sent with every request
    pub user_agent: String,
}

/// Toast stack settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ToastConfig {
    /// Corner the stack is pinned to (top-right, top-left, bottom-right, ...)
    pub position: String,
    /// Display time used when a caller gives none
    pub duration_ms: u64,
}

/// Log filter settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LogConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub filter: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            root_id: "app".to_string(),
            page_url: None,
        }
    }
}

impl Default for DevConfig {
    fn default() -> Self {
        Self {
            live_reload: true,
            reconnect_delay_ms: 1000,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: None,
            user_agent: "DreamWeb/0.1".to_string(),
        }
    }
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            position: "top-right".to_string(),
            duration_ms: 3000,
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

fn env_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

impl DreamwebConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Load `dreamweb.toml` from the working directory, or defaults when it
    /// is missing or unreadable
    pub fn load_or_default() -> Self {
        Self::load_from_file(CONFIG_FILE).unwrap_or_default()
    }

    /// Apply `DREAMWEB_*` environment overrides on top of file values
    pub fn merge_with_env(&mut self) {
        self.merge_from(|key| std::env::var(key).ok());
    }

    /// Apply overrides from an arbitrary key lookup
    pub fn merge_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(root) = lookup("DREAMWEB_ROOT_ID") {
            self.runtime.root_id = root;
        }
        if let Some(url) = lookup("DREAMWEB_PAGE_URL") {
            self.runtime.page_url = Some(url);
        }
        if let Some(val) = lookup("DREAMWEB_LIVE_RELOAD") {
            self.dev.live_reload = env_flag(&val);
        }
        if let Some(val) = lookup("DREAMWEB_RECONNECT_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                self.dev.reconnect_delay_ms = ms;
            }
        }
        if let Some(val) = lookup("DREAMWEB_HTTP_TIMEOUT_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                self.http.timeout_ms = Some(ms);
            }
        }
        if let Some(agent) = lookup("DREAMWEB_USER_AGENT") {
            self.http.user_agent = agent;
        }
        if let Some(position) = lookup("DREAMWEB_TOAST_POSITION") {
            self.toast.position = position;
        }
        if let Some(filter) = lookup("DREAMWEB_LOG") {
            self.log.filter = filter;
        }
    }

    /// File (or defaults) with environment overrides applied
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = DreamwebConfig::default();
        assert_eq!(config.runtime.root_id, "app");
        assert!(config.dev.live_reload);
        assert_eq!(config.dev.reconnect_delay_ms, 1000);
        assert_eq!(config.toast.duration_ms, 3000);
        assert_eq!(config.http.timeout_ms, None);
    }

    #[test]
    fn test_toml_serialization() {
        let config = DreamwebConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: DreamwebConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[runtime]\nroot_id = \"root\"\n\n[toast]\nposition = \"bottom-left\""
        )
        .unwrap();

        let config = DreamwebConfig::load_from_file(file.path()).unwrap();
        assert_eq!(config.runtime.root_id, "root");
        assert_eq!(config.toast.position, "bottom-left");
        assert_eq!(config.toast.duration_ms, 3000);
        assert_eq!(config.dev.reconnect_delay_ms, 1000);
    }

    #[test]
    fn test_invalid_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[runtime\nroot_id = 1").unwrap();
        assert!(matches!(
            DreamwebConfig::load_from_file(file.path()),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            DreamwebConfig::load_from_file("/definitely/not/here.toml"),
            Err(ConfigError::Read(_))
        ));
    }

    #[test]
    fn test_merge_overrides() {
        let env: HashMap<&str, &str> = [
            ("DREAMWEB_PAGE_URL", "http://localhost:8000/"),
            ("DREAMWEB_LIVE_RELOAD", "false"),
            ("DREAMWEB_RECONNECT_MS", "250"),
            ("DREAMWEB_HTTP_TIMEOUT_MS", "not-a-number"),
        ]
        .into_iter()
        .collect();

        let mut config = DreamwebConfig::default();
        config.merge_from(|key| env.get(key).map(|v| v.to_string()));

        assert_eq!(config.runtime.page_url.as_deref(), Some("http://localhost:8000/"));
        assert!(!config.dev.live_reload);
        assert_eq!(config.dev.reconnect_delay_ms, 250);
        assert_eq!(config.http.timeout_ms, None);
    }
}
