//! Worker endpoint addresses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from parsing a worker address.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Missing scheme in address '{0}' (expected protocol://host:port)")]
    MissingScheme(String),
    #[error("Missing host in address '{0}'")]
    MissingHost(String),
    #[error("Missing port in address '{0}'")]
    MissingPort(String),
    #[error("Invalid port in address '{0}'")]
    InvalidPort(String),
    #[error("Unexpected path in address '{0}'")]
    UnexpectedPath(String),
}

/// A worker endpoint, identified by `(protocol, host, port)`.
///
/// Ordering is lexicographic over protocol, host, then port.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct WorkerAddress {
    protocol: String,
    host: String,
    port: u16,
}

impl WorkerAddress {
    pub fn new(protocol: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            protocol: protocol.into(),
            host: host.into(),
            port,
        }
    }

    /// Plain HTTP address.
    pub fn http(host: impl Into<String>, port: u16) -> Self {
        Self::new("http", host, port)
    }

    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Base URL for requests against this endpoint.
    pub fn url(&self) -> String {
        format!("{}/", self)
    }

    /// URL for a path under this endpoint (path must start with `/`).
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", self, path)
    }
}

impl fmt::Display for WorkerAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.protocol, self.host, self.port)
    }
}

impl FromStr for WorkerAddress {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (protocol, rest) = trimmed
            .split_once("://")
            .filter(|(p, _)| !p.is_empty())
            .ok_or_else(|| AddressError::MissingScheme(s.to_string()))?;

        let authority = match rest.split_once('/') {
            Some((authority, "")) => authority,
            Some(_) => return Err(AddressError::UnexpectedPath(s.to_string())),
            None => rest,
        };

        let (host, port) = authority
            .rsplit_once(':')
            .ok_or_else(|| AddressError::MissingPort(s.to_string()))?;
        if host.is_empty() {
            return Err(AddressError::MissingHost(s.to_string()));
        }
        if port.is_empty() {
            return Err(AddressError::MissingPort(s.to_string()));
        }
        let port = port
            .parse::<u16>()
            .map_err(|_| AddressError::InvalidPort(s.to_string()))?;

        Ok(Self::new(protocol.to_ascii_lowercase(), host, port))
    }
}

impl TryFrom<String> for WorkerAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<WorkerAddress> for String {
    fn from(address: WorkerAddress) -> Self {
        address.to_string()
    }
}
