//! YAML configuration for the Safeguard console.
//!
//! # Example configuration file:
//! ```yaml
//! server:
//!   base_url: http://localhost:5678/webhook/wibot
//!   token: null
//!   timeout_secs: 30
//! session:
//!   user: admin@example.com
//!   role: admin
//! polling:
//!   enabled: true
//!   interval_secs: 30
//! demo:
//!   fallback: true
//!   tick_secs: 30
//! limits:
//!   history: 50
//!   deferred: 50
//! ```
//!
//! Lookup order: an explicit path, then `.safeguard.yaml` walking up from the
//! current directory, then `<config dir>/safeguard/config.yaml`, then defaults.

pub mod defaults;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const PROJECT_FILE_NAME: &str = ".safeguard.yaml";

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub session: Session,
    pub polling: PollingConfig,
    pub demo: DemoConfig,
    pub limits: Limits,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Endpoint paths are appended to this URL
    pub base_url: String,
    /// Bearer token of the admin session
    pub token: Option<String>,
    pub timeout_secs: u64,
}

/// The operator using the console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: String,
    pub role: Role,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Identity recorded as the canceller of a deferred action.
    pub fn actor(&self) -> &str {
        let user = self.user.trim();
        if user.is_empty() {
            "unknown"
        } else {
            user
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Technician,
    Viewer,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => write!(f, "admin"),
            Role::Technician => write!(f, "technician"),
            Role::Viewer => write!(f, "viewer"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollingConfig {
    pub enabled: bool,
    /// 0 disables polling
    pub interval_secs: u64,
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DemoConfig {
    /// Switch to placeholder data when the backend is unreachable at startup
    pub fallback: bool,
    pub tick_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Limits {
    pub history: u32,
    pub deferred: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                base_url: defaults::BASE_URL.to_string(),
                token: None,
                timeout_secs: defaults::TIMEOUT_SECS,
            },
            session: Session {
                user: String::new(),
                role: Role::Admin,
            },
            polling: PollingConfig {
                enabled: true,
                interval_secs: defaults::POLL_INTERVAL_SECS,
            },
            demo: DemoConfig {
                fallback: true,
                tick_secs: defaults::DEMO_TICK_SECS,
            },
            limits: Limits {
                history: defaults::LIST_LIMIT,
                deferred: defaults::LIST_LIMIT,
            },
        }
    }
}

/// Raw YAML representation: every field optional, filled from defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    server: RawServer,
    #[serde(default)]
    session: RawSession,
    #[serde(default)]
    polling: RawPolling,
    #[serde(default)]
    demo: RawDemo,
    #[serde(default)]
    limits: RawLimits,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawServer {
    base_url: Option<String>,
    token: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawSession {
    user: Option<String>,
    role: Option<Role>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPolling {
    enabled: Option<bool>,
    interval_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDemo {
    fallback: Option<bool>,
    tick_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawLimits {
    history: Option<u32>,
    deferred: Option<u32>,
}

/// Values given on the command line or through the environment.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub token: Option<String>,
    pub user: Option<String>,
}

impl Config {
    /// Parse a YAML configuration string. Missing fields take their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let raw: RawConfig = if yaml.trim().is_empty() {
            RawConfig::default()
        } else {
            serde_yaml::from_str(yaml).context("Invalid YAML syntax in configuration file")?
        };

        let d = Config::default();
        let config = Config {
            server: ServerConfig {
                base_url: raw.server.base_url.unwrap_or(d.server.base_url),
                token: raw.server.token.or(d.server.token),
                timeout_secs: raw.server.timeout_secs.unwrap_or(d.server.timeout_secs),
            },
            session: Session {
                user: raw.session.user.unwrap_or(d.session.user),
                role: raw.session.role.unwrap_or(d.session.role),
            },
            polling: PollingConfig {
                enabled: raw.polling.enabled.unwrap_or(d.polling.enabled),
                interval_secs: raw.polling.interval_secs.unwrap_or(d.polling.interval_secs),
            },
            demo: DemoConfig {
                fallback: raw.demo.fallback.unwrap_or(d.demo.fallback),
                tick_secs: raw.demo.tick_secs.unwrap_or(d.demo.tick_secs),
            },
            limits: Limits {
                history: raw.limits.history.unwrap_or(d.limits.history),
                deferred: raw.limits.deferred.unwrap_or(d.limits.deferred),
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file: {}", path.display()))?;
        Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse configuration file: {}", path.display()))
    }

    /// Resolve the configuration: explicit path first, then discovery, then defaults.
    /// Returns the file that was used, if any.
    pub fn load(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>)> {
        if let Some(path) = explicit {
            return Ok((Self::from_file(path)?, Some(path.to_path_buf())));
        }

        let cwd = std::env::current_dir().context("Failed to get current directory")?;
        let discovered =
            find_project_config(&cwd).or_else(|| user_config_path().filter(|p| p.exists()));

        match discovered {
            Some(path) => Ok((Self::from_file(&path)?, Some(path))),
            None => Ok((Self::default(), None)),
        }
    }

    /// Apply command-line / environment overrides, then re-validate.
    pub fn apply(mut self, overrides: &Overrides) -> Result<Self> {
        if let Some(ref url) = overrides.base_url {
            self.server.base_url = url.clone();
        }
        if let Some(ref token) = overrides.token {
            self.server.token = Some(token.clone());
        }
        if let Some(ref user) = overrides.user {
            self.session.user = user.clone();
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        let url = reqwest::Url::parse(&self.server.base_url)
            .with_context(|| format!("server.base_url is not a valid URL: {}", self.server.base_url))?;
        if !matches!(url.scheme(), "http" | "https") {
            bail!(
                "server.base_url must use http or https, got '{}'",
                url.scheme()
            );
        }
        if self.server.timeout_secs == 0 {
            bail!("server.timeout_secs must be greater than 0");
        }
        if self.demo.tick_secs == 0 {
            bail!("demo.tick_secs must be greater than 0");
        }
        Ok(())
    }

    /// Printable copy with the token masked.
    pub fn redacted(&self) -> Config {
        let mut copy = self.clone();
        if copy.server.token.is_some() {
            copy.server.token = Some("********".to_string());
        }
        copy
    }
}

/// Find `.safeguard.yaml` walking up the directory tree.
pub fn find_project_config(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        let candidate = dir.join(PROJECT_FILE_NAME);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            return None;
        }
    }
}

/// Per-user configuration file location.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("safeguard").join("config.yaml"))
}
