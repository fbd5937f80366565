//! Run configuration for the checker and the whole normalize-then-check pipeline

use crate::error::SiftError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default per-probe timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: f64 = 1.0;

/// Default number of concurrent probe workers
pub const DEFAULT_WORKER_COUNT: usize = 16;

/// Some reference targets reject the HTTP client's default identifier
pub const DEFAULT_USER_AGENT: &str = "Proxy Tester";

/// Default file the reachable endpoints are written to
pub const DEFAULT_OUTPUT_FILE: &str = "result.txt";

/// Per-probe timeout used when the whole pipeline is wired together
pub const PIPELINE_TIMEOUT_SECS: f64 = 5.0;

/// Reference URL used when the whole pipeline is wired together
pub const PIPELINE_REFERENCE_URL: &str = "http://stackoverflow.com/questions";

/// Convert a user-supplied number of seconds into a probe timeout
pub fn timeout_from_secs(secs: f64) -> Result<Duration, SiftError> {
    if !secs.is_finite() || secs <= 0.0 {
        return Err(SiftError::Config(format!(
            "timeout must be a positive number of seconds, got {}",
            secs
        )));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| SiftError::Config(e.to_string()))
}

/// Configuration for one validation run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorConfig {
    /// URL every probe fetches through the candidate proxy
    pub reference_url: String,
    /// Wall-clock bound on one probe, connect through full response
    pub timeout: Duration,
    /// Number of concurrent probe workers
    pub worker_count: usize,
    /// User-Agent header attached to every probe
    pub user_agent: String,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            reference_url: String::new(),
            timeout: Duration::from_secs_f64(DEFAULT_TIMEOUT_SECS),
            worker_count: DEFAULT_WORKER_COUNT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ValidatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reference_url(mut self, url: impl Into<String>) -> Self {
        self.reference_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_worker_count(mut self, worker_count: usize) -> Self {
        self.worker_count = worker_count;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Reject configurations a run cannot start with
    pub fn validate(&self) -> Result<(), SiftError> {
        if self.reference_url.trim().is_empty() {
            return Err(SiftError::Config("reference URL is required".to_string()));
        }
        if self.worker_count == 0 {
            return Err(SiftError::Config(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.timeout.is_zero() {
            return Err(SiftError::Config(
                "timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Layout and settings of the normalize-then-check pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory holding the raw per-source listing files
    pub data_dir: PathBuf,
    /// Directory the merged endpoint list is written to
    pub storage_dir: PathBuf,
    /// File name of the merged endpoint list inside `storage_dir`
    pub merged_file: String,
    pub free_proxy_list_net_file: String,
    pub freeproxylists_net_file: String,
    pub hidemy_name_file: String,
    pub proxylist_hidemyass_com_file: String,
    /// Where reachable endpoints end up
    pub output_file: PathBuf,
    pub validator: ValidatorConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            storage_dir: PathBuf::from("./storage"),
            merged_file: "all_proxies.txt".to_string(),
            free_proxy_list_net_file: "new_proxies.free-proxy-list.net.txt".to_string(),
            freeproxylists_net_file: "new_proxies.freeproxylists.net.txt".to_string(),
            hidemy_name_file: "new_proxies.hidemy.name.txt".to_string(),
            proxylist_hidemyass_com_file: "new_proxies.proxylist.hidemyass.com.txt".to_string(),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            validator: ValidatorConfig::new()
                .with_reference_url(PIPELINE_REFERENCE_URL)
                .with_timeout(Duration::from_secs_f64(PIPELINE_TIMEOUT_SECS))
                .with_worker_count(DEFAULT_WORKER_COUNT),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    pub fn with_output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = path.into();
        self
    }

    pub fn merged_path(&self) -> PathBuf {
        self.storage_dir.join(&self.merged_file)
    }

    /// Path of the raw listing file for a source inside `data_dir`
    pub fn source_path(&self, file_name: &str) -> PathBuf {
        Path::new(&self.data_dir).join(file_name)
    }
}
