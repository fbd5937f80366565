//! Runs a full validation batch: queue, workers, drain, persist

use crate::config::ValidatorConfig;
use crate::error::SiftError;
use crate::proxy::models::Endpoint;
use crate::proxy::pool::ProbePool;
use crate::proxy::probe::{HttpProbe, Probe};
use crate::proxy::queue::{QueueClosed, WorkQueue};
use crate::proxy::results::ResultSet;
use crate::proxy::store;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// What one batch produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub good: Vec<Endpoint>,
    pub bad: Vec<Endpoint>,
    pub elapsed: Duration,
}

impl RunReport {
    pub fn total(&self) -> usize {
        self.good.len() + self.bad.len()
    }
}

/// Validates endpoint batches with a pool of probe workers
pub struct ProxyValidator {
    config: ValidatorConfig,
    probe: Arc<dyn Probe>,
}

impl ProxyValidator {
    /// Validator that probes through real HTTP requests
    pub fn new(config: ValidatorConfig) -> Result<Self, SiftError> {
        let probe = Arc::new(HttpProbe::from_config(&config));
        Self::with_probe(config, probe)
    }

    /// Validator using a caller-supplied probe
    pub fn with_probe(config: ValidatorConfig, probe: Arc<dyn Probe>) -> Result<Self, SiftError> {
        config.validate()?;
        Ok(Self { config, probe })
    }

    /// Probe every endpoint once and partition them.
    ///
    /// Returns after the last outcome is recorded and every worker has
    /// exited.
    pub async fn validate(&self, endpoints: Vec<Endpoint>) -> RunReport {
        let queue = Arc::new(WorkQueue::new());
        let results = Arc::new(ResultSet::new());
        let pool = ProbePool::start(
            self.config.worker_count,
            Arc::clone(&queue),
            Arc::clone(&self.probe),
            Arc::clone(&results),
        );

        let start = Instant::now();
        info!(
            endpoints = endpoints.len(),
            workers = self.config.worker_count,
            timeout = ?self.config.timeout,
            url = %self.config.reference_url,
            "validating endpoints"
        );

        for endpoint in endpoints {
            if let Err(QueueClosed(endpoint)) = queue.enqueue(endpoint) {
                warn!(endpoint = %endpoint, "queue closed before endpoint was queued");
            }
        }

        queue.wait_drained().await;
        let (good, bad) = results.snapshot();
        let elapsed = start.elapsed();
        pool.shutdown().await;

        info!(good = good.len(), bad = bad.len(), ?elapsed, "validation finished");
        RunReport { good, bad, elapsed }
    }

    /// Load `input`, validate it, and write reachable endpoints to `output`.
    ///
    /// A missing input aborts before any worker starts. A write failure is
    /// reported after all probing has finished.
    pub async fn run(&self, input: &Path, output: &Path) -> Result<RunReport, SiftError> {
        let endpoints = store::load_endpoints(input)?;
        info!(path = ?input, count = endpoints.len(), "loaded endpoints");

        let report = self.validate(endpoints).await;
        store::save_results(&report.good, output)?;
        info!(path = ?output, count = report.good.len(), "saved reachable endpoints");
        Ok(report)
    }
}
