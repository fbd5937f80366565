//! Single timed connectivity check through a candidate proxy

use crate::config::ValidatorConfig;
use crate::proxy::models::{Endpoint, ProbeResult};
use futures::future::BoxFuture;
use reqwest::{Client, Proxy as ReqwestProxy};
use std::time::Duration;
use tracing::debug;

/// Something that can classify an endpoint as reachable or not.
///
/// Implementations must not fail: every fault becomes
/// [`ProbeResult::Unreachable`].
pub trait Probe: Send + Sync {
    fn probe<'a>(&'a self, endpoint: &'a Endpoint) -> BoxFuture<'a, ProbeResult>;
}

/// Fetches a reference URL through the endpoint acting as a forward proxy
#[derive(Debug, Clone)]
pub struct HttpProbe {
    reference_url: String,
    timeout: Duration,
    user_agent: String,
}

impl HttpProbe {
    pub fn new(reference_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            reference_url: reference_url.into(),
            timeout,
            user_agent: crate::config::DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn from_config(config: &ValidatorConfig) -> Self {
        Self::new(config.reference_url.clone(), config.timeout)
            .with_user_agent(config.user_agent.clone())
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Probe one endpoint. One attempt, no retry.
    pub async fn check(&self, endpoint: &Endpoint) -> ProbeResult {
        let client = match self.create_client(endpoint) {
            Ok(client) => client,
            Err(e) => return ProbeResult::unreachable(format!("invalid proxy: {}", e)),
        };

        // The client timeout bounds the socket; this outer one bounds the
        // whole attempt including reading the body.
        let result = match tokio::time::timeout(self.timeout, self.fetch(&client)).await {
            Ok(result) => result,
            Err(_) => ProbeResult::unreachable(format!("timed out after {:?}", self.timeout)),
        };

        debug!(endpoint = %endpoint, ?result, "probe finished");
        result
    }

    async fn fetch(&self, client: &Client) -> ProbeResult {
        let response = match client.get(&self.reference_url).send().await {
            Ok(response) => response,
            Err(e) => return ProbeResult::unreachable(describe(&e)),
        };

        let status = response.status();
        if !status.is_success() {
            return ProbeResult::unreachable(format!("HTTP status: {}", status));
        }

        match response.bytes().await {
            Ok(_) => ProbeResult::Reachable,
            Err(e) => ProbeResult::unreachable(describe(&e)),
        }
    }

    /// Create a reqwest client routed through the endpoint
    fn create_client(&self, endpoint: &Endpoint) -> reqwest::Result<Client> {
        // Route every reference scheme through the endpoint, not just http.
        let proxy = ReqwestProxy::all(endpoint.as_str())?;

        Client::builder()
            .proxy(proxy)
            .timeout(self.timeout)
            .connect_timeout(self.timeout)
            .user_agent(&self.user_agent)
            .pool_max_idle_per_host(0)
            .build()
    }
}

impl Probe for HttpProbe {
    fn probe<'a>(&'a self, endpoint: &'a Endpoint) -> BoxFuture<'a, ProbeResult> {
        Box::pin(self.check(endpoint))
    }
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "timed out".to_string()
    } else if error.is_connect() {
        format!("connect failed: {}", error)
    } else {
        error.to_string()
    }
}
