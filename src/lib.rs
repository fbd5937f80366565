//! Proxy Sift - Proxy List Normalizer and Reachability Checker
//!
//! Normalizes proxy records scraped from several listing sites into
//! canonical `scheme://host:port` endpoints, then probes every endpoint
//! through a bounded pool of workers and keeps the reachable ones.

pub mod config;
pub mod error;
pub mod logging;
pub mod proxy;

pub use config::{PipelineConfig, ValidatorConfig};
pub use error::SiftError;
pub use proxy::*;

/// Application result type
pub type Result<T> = anyhow::Result<T>;
