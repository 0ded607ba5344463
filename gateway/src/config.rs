//! Configuration for the gateway.

use std::path::Path;
use std::time::Duration;

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use serde_json::Value;
use taskgate_common::{Kwargs, Task};

use crate::gateway::GatewaySettings;
use crate::pool::WorkerNode;

/// Main configuration structure for the gateway.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    #[serde(default)]
    pub dispatch: DispatchConfig,
    #[serde(default)]
    pub allocation: AllocationConfig,
    #[serde(default)]
    pub task: TaskConfig,
    /// Initial worker pool.
    #[serde(default)]
    pub workers: Vec<WorkerNode>,
    #[serde(default)]
    pub monitor: MonitorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    /// Per-worker heartbeat timeout.
    #[serde(default = "default_probe_timeout")]
    pub timeout_ms: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_probe_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchConfig {
    #[serde(default = "default_dispatch_timeout")]
    pub timeout_secs: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_dispatch_timeout(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AllocationConfig {
    /// fcfs, round_robin or fair_share.
    #[serde(default = "default_strategy")]
    pub strategy: String,
    /// Criteria used when a call does not name one.
    #[serde(default = "default_criteria")]
    pub criteria: String,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            strategy: default_strategy(),
            criteria: default_criteria(),
        }
    }
}

/// The task bound at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskConfig {
    #[serde(default = "default_task")]
    pub name: String,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub kwargs: Kwargs,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            name: default_task(),
            args: Vec::new(),
            kwargs: Kwargs::new(),
        }
    }
}

impl TaskConfig {
    pub fn to_task(&self) -> Task {
        Task::new(self.name.clone())
            .with_args(self.args.clone())
            .with_kwargs(self.kwargs.clone())
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct MonitorConfig {
    /// Seconds between pool monitor rounds; 0 disables the monitor.
    #[serde(default)]
    pub interval_secs: u64,
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
fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8000
}
fn default_probe_timeout() -> u64 {
    1000
}
fn default_dispatch_timeout() -> u64 {
    300
}
fn default_strategy() -> String {
    "fcfs".to_string()
}
fn default_criteria() -> String {
    "cpu".to_string()
}
fn default_task() -> String {
    "identity".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Configuration sources (in order of precedence):
    /// 1. Environment variables (GATEWAY__SECTION__KEY format)
    /// 2. gateway.toml file (if present)
    /// 3. Built-in defaults
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("gateway")
    }

    /// Same as [`Config::load`] but reads the given file (extension optional).
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_string_lossy().into_owned();
        let config = ConfigLoader::builder()
            .add_source(File::with_name(&path).required(false))
            .add_source(
                Environment::with_prefix("GATEWAY")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn settings(&self) -> GatewaySettings {
        GatewaySettings {
            probe_timeout: Duration::from_millis(self.probe.timeout_ms),
            dispatch_timeout: Duration::from_secs(self.dispatch.timeout_secs),
        }
    }
}
