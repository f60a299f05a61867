//! Global configuration model for the dashboard.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::DockboardError;

/// Which runtime gateway implementation to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Talk to the Docker Engine API over its local socket.
    #[default]
    Api,
    /// Shell out to the `docker` CLI and parse its JSON output.
    Cli,
}

impl FromStr for BackendKind {
    type Err = DockboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "api" => Ok(Self::Api),
            "cli" => Ok(Self::Cli),
            other => Err(DockboardError::Config {
                message: format!("unknown runtime backend '{other}' (expected 'api' or 'cli')"),
            }),
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Api => write!(f, "api"),
            Self::Cli => write!(f, "cli"),
        }
    }
}

/// Settings for the description generation capability.
#[derive(Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    /// Key sent with every generation request.
    pub api_key: String,
    /// Model identifier.
    pub model: String,
    /// Messages endpoint URL.
    pub endpoint: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl GenerationConfig {
    /// Creates a configuration with default model, endpoint, and timeout.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: constants::DEFAULT_GENERATION_MODEL.to_string(),
            endpoint: constants::DEFAULT_GENERATION_ENDPOINT.to_string(),
            timeout: Duration::from_secs(constants::DEFAULT_GENERATION_TIMEOUT_SECS),
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("endpoint", &self.endpoint)
            .field("timeout", &self.timeout)
            .finish()
    }
}

/// Root configuration for the dashboard.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    /// Address the HTTP server binds to.
    pub listen_addr: String,
    /// Host placed in primary URLs.
    pub lan_host: String,
    /// Runtime gateway implementation.
    pub backend: BackendKind,
    /// Bound on ordinary runtime calls.
    pub runtime_timeout: Duration,
    /// Bound on image pulls.
    pub pull_timeout: Duration,
    /// Whether the HTML index lists stopped containers too.
    pub index_includes_stopped: bool,
    /// Verbose logging.
    pub debug: bool,
    /// Description generation; `None` disables it.
    pub generation: Option<GenerationConfig>,
}

impl DashboardConfig {
    /// Checks values that cannot be expressed in the type system.
    ///
    /// # Errors
    ///
    /// Returns an error if a timeout is zero or the LAN host is empty.
    pub fn validate(&self) -> crate::error::Result<()> {
        if self.lan_host.trim().is_empty() {
            return Err(DockboardError::Config {
                message: "LAN host must not be empty".into(),
            });
        }
        if self.runtime_timeout.is_zero() || self.pull_timeout.is_zero() {
            return Err(DockboardError::Config {
                message: "runtime timeouts must be greater than zero".into(),
            });
        }
        if self
            .generation
            .as_ref()
            .is_some_and(|g| g.api_key.trim().is_empty())
        {
            return Err(DockboardError::Config {
                message: "generation API key must not be empty".into(),
            });
        }
        Ok(())
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            listen_addr: constants::DEFAULT_LISTEN_ADDR.to_string(),
            lan_host: constants::DEFAULT_LAN_HOST.to_string(),
            backend: BackendKind::default(),
            runtime_timeout: Duration::from_secs(constants::DEFAULT_RUNTIME_TIMEOUT_SECS),
            pull_timeout: Duration::from_secs(constants::DEFAULT_PULL_TIMEOUT_SECS),
            index_includes_stopped: false,
            debug: false,
            generation: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        DashboardConfig::default().validate().expect("default must validate");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cfg = DashboardConfig {
            runtime_timeout: Duration::ZERO,
            ..DashboardConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn backend_kind_parses_case_insensitively() {
        assert_eq!("CLI".parse::<BackendKind>().unwrap(), BackendKind::Cli);
        assert!("podman".parse::<BackendKind>().is_err());
    }

    #[test]
    fn generation_debug_hides_key() {
        let cfg = GenerationConfig::new("sk-secret");
        assert!(!format!("{cfg:?}").contains("sk-secret"));
    }
}
