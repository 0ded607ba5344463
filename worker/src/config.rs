//! Configuration for the worker.

use std::path::Path;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use taskgate_common::WorkerAddress;

use crate::heartbeat::ClientFilter;

/// Main configuration structure for the worker.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub worker: WorkerConfig,
    #[serde(default)]
    pub heartbeat: HeartbeatConfig,
    #[serde(default)]
    pub executor: ExecutorConfig,
    #[serde(default)]
    pub supervisor: SupervisorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    /// Human-readable name reported in heartbeats.
    #[serde(default = "default_name")]
    pub name: String,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self { name: default_name() }
    }
}

/// Heartbeat listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct HeartbeatConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_heartbeat_port")]
    pub port: u16,
    /// Host reported in the `location` field. Falls back to `host`.
    #[serde(default)]
    pub advertise_host: Option<String>,
    /// Client IPs allowed to read the heartbeat, or `"*"`.
    #[serde(default = "default_allow")]
    pub allow: Vec<String>,
    /// Client IPs always refused.
    #[serde(default)]
    pub disallow: Vec<String>,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_heartbeat_port(),
            advertise_host: None,
            allow: default_allow(),
            disallow: Vec::new(),
        }
    }
}

impl HeartbeatConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The address this worker reports as its own heartbeat location.
    pub fn location(&self) -> WorkerAddress {
        let host = self.advertise_host.as_deref().unwrap_or(&self.host);
        WorkerAddress::http(host, self.port)
    }

    pub fn client_filter(&self) -> ClientFilter {
        ClientFilter::new(self.allow.clone(), self.disallow.clone())
    }
}

/// Which sanity gate the executor runs before invoking a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SanityCheckKind {
    /// Only callables registered in the task catalog pass.
    #[default]
    Catalog,
    /// Every task passes; unknown callables fail at invocation.
    AllowAll,
}

/// Execution listener configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutorConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_executor_port")]
    pub port: u16,
    #[serde(default)]
    pub sanity_check: SanityCheckKind,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_executor_port(),
            sanity_check: SanityCheckKind::default(),
        }
    }
}

impl ExecutorConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorConfig {
    /// Delay before restarting a listener that crashed.
    #[serde(default = "default_restart_delay")]
    pub restart_delay_ms: u64,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            restart_delay_ms: default_restart_delay(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

// Default values
fn default_name() -> String {
    "Untitled Node".to_string()
}
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_allow() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_heartbeat_port() -> u16 {
    6666
}
fn default_executor_port() -> u16 {
    9000
}
fn default_restart_delay() -> u64 {
    1000
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (WORKER__SECTION__KEY format)
    /// 2. worker.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("worker")
    }

    /// Same as [`Config::load`] but reads the given file (extension optional).
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_string_lossy().into_owned();
        let config = ConfigLoader::builder()
            .add_source(File::with_name(&path).required(false))
            .add_source(
                Environment::with_prefix("WORKER")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("heartbeat.allow")
                    .with_list_parse_key("heartbeat.disallow")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.worker.name, "Untitled Node");
        assert_eq!(config.heartbeat.bind_addr(), "0.0.0.0:6666");
        assert_eq!(config.executor.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.executor.sanity_check, SanityCheckKind::Catalog);
        assert_eq!(config.supervisor.restart_delay_ms, 1000);
        assert_eq!(config.heartbeat.allow, vec!["*".to_string()]);
        assert!(config.heartbeat.disallow.is_empty());
        assert_eq!(config.heartbeat.client_filter(), ClientFilter::allow_all());
    }

    #[test]
    fn test_location_prefers_advertise_host() {
        let mut heartbeat = HeartbeatConfig::default();
        assert_eq!(heartbeat.location().to_string(), "http://0.0.0.0:6666");

        heartbeat.advertise_host = Some("10.0.0.5".to_string());
        assert_eq!(heartbeat.location().to_string(), "http://10.0.0.5:6666");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[worker]
name = "gpu-box"

[heartbeat]
port = 5001
allow = ["10.0.0.1", "10.0.0.2"]
disallow = ["10.0.0.2"]

[executor]
port = 9100
sanity_check = "allow_all"
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.worker.name, "gpu-box");
        assert_eq!(config.heartbeat.port, 5001);
        assert_eq!(config.heartbeat.host, "0.0.0.0");
        let filter = config.heartbeat.client_filter();
        assert!(filter.permits(Some("10.0.0.1".parse().unwrap())));
        assert!(!filter.permits(Some("10.0.0.2".parse().unwrap())));
        assert_eq!(config.executor.port, 9100);
        assert_eq!(config.executor.sanity_check, SanityCheckKind::AllowAll);
    }
}
