//! Proxy module for normalizing and validating proxies
//!
//! This module provides functionality for:
//! - Normalizing scraped listings into canonical endpoints
//! - Probing endpoints through a bounded pool of workers
//! - Saving the reachable endpoints

pub mod models;
pub mod normalizer;
pub mod pool;
pub mod probe;
pub mod queue;
pub mod results;
pub mod store;
pub mod validator;

pub use models::{Endpoint, Outcome, ProbeResult, Scheme};
pub use normalizer::SourceFormat;
pub use pool::ProbePool;
pub use probe::{HttpProbe, Probe};
pub use queue::{DrainLatch, QueueClosed, WorkQueue};
pub use results::ResultSet;
pub use validator::{ProxyValidator, RunReport};
