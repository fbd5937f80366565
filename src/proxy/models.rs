//! Proxy data models

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Proxy scheme enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Scheme {
    #[default]
    Http,
    Https,
    Socks4,
    Socks5,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Http => write!(f, "http"),
            Scheme::Https => write!(f, "https"),
            Scheme::Socks4 => write!(f, "socks4"),
            Scheme::Socks5 => write!(f, "socks5"),
        }
    }
}

/// A proxy address in canonical `scheme://host:port` form.
///
/// Endpoints read from an input file are kept verbatim; the checker does not
/// reject lines it cannot interpret, a bad address simply probes as
/// unreachable. Cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Endpoint(Arc<str>);

impl Endpoint {
    /// Build a canonical endpoint from its parts
    pub fn new(scheme: Scheme, host: &str, port: u16) -> Self {
        Self(Arc::from(format!("{}://{}:{}", scheme, host, port)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Endpoint {
    fn from(raw: &str) -> Self {
        Self(Arc::from(raw))
    }
}

impl From<String> for Endpoint {
    fn from(raw: String) -> Self {
        Self(Arc::from(raw))
    }
}

impl AsRef<str> for Endpoint {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classification produced by one probe
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProbeResult {
    Reachable,
    /// Carries a human-readable reason for logs
    Unreachable(String),
}

impl ProbeResult {
    pub fn unreachable(reason: impl Into<String>) -> Self {
        ProbeResult::Unreachable(reason.into())
    }

    pub fn is_reachable(&self) -> bool {
        matches!(self, ProbeResult::Reachable)
    }
}

/// The result of probing one endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub endpoint: Endpoint,
    pub result: ProbeResult,
}

impl Outcome {
    pub fn new(endpoint: Endpoint, result: ProbeResult) -> Self {
        Self { endpoint, result }
    }

    pub fn reachable(endpoint: Endpoint) -> Self {
        Self::new(endpoint, ProbeResult::Reachable)
    }

    pub fn unreachable(endpoint: Endpoint, reason: impl Into<String>) -> Self {
        Self::new(endpoint, ProbeResult::unreachable(reason))
    }

    pub fn is_reachable(&self) -> bool {
        self.result.is_reachable()
    }
}
