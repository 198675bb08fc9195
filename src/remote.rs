use crate::error::ScanError;
use crate::types::LinkRiskVerdict;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

pub const DEFAULT_ENDPOINT: &str = "http://localhost:80/api/scan-link";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

const USER_AGENT: &str = concat!("scamguard/", env!("CARGO_PKG_VERSION"));

/// What a failed deep scan resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Treat the link as safe.
    #[default]
    Open,
    /// Treat the link as unsafe, for higher-risk deployments.
    Closed,
}

impl FailurePolicy {
    pub fn fallback(self, url: &str) -> LinkRiskVerdict {
        match self {
            FailurePolicy::Open => LinkRiskVerdict::fail_open(url),
            FailurePolicy::Closed => LinkRiskVerdict::fail_closed(url),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RemoteScanConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub failure_policy: FailurePolicy,
}

impl Default for RemoteScanConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
            failure_policy: FailurePolicy::Open,
        }
    }
}

/// One deep-scan round trip for a URL.
pub trait LinkScanTransport: Send + Sync {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<LinkRiskVerdict, ScanError>> + Send;
}

#[derive(Serialize)]
struct ScanRequest<'a> {
    url: &'a str,
}

/// POSTs `{url}` to the link-scan service.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

impl LinkScanTransport for HttpTransport {
    async fn fetch(&self, url: &str) -> Result<LinkRiskVerdict, ScanError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ScanRequest { url })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ScanError::Status(response.status().as_u16()));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| ScanError::Decode(e.to_string()))
    }
}

/// Deep link scanner with single-flight, a resolved-verdict cache and a
/// bounded, fail-open fallback. It never returns an error.
pub struct RemoteLinkScanner<T> {
    transport: T,
    timeout: Duration,
    policy: FailurePolicy,
    flights: Mutex<HashMap<String, Arc<OnceCell<LinkRiskVerdict>>>>,
    issued: AtomicUsize,
}

pub type HttpLinkScanner = RemoteLinkScanner<HttpTransport>;

impl RemoteLinkScanner<HttpTransport> {
    pub fn http(config: &RemoteScanConfig) -> Result<Self, ScanError> {
        let transport = HttpTransport::new(&config.endpoint, config.timeout)?;
        Ok(Self::new(transport, config.timeout, config.failure_policy))
    }
}

impl<T: LinkScanTransport> RemoteLinkScanner<T> {
    pub fn new(transport: T, timeout: Duration, policy: FailurePolicy) -> Self {
        Self {
            transport,
            timeout,
            policy,
            flights: Mutex::new(HashMap::new()),
            issued: AtomicUsize::new(0),
        }
    }

    /// Concurrent callers for the same URL share one request; later callers
    /// get the cached verdict. Fallback verdicts are handed to the waiters of
    /// that flight and then forgotten, so the next call asks again.
    pub async fn scan_link(&self, url: &str) -> LinkRiskVerdict {
        let cell = {
            let mut flights = self.flights.lock();
            Arc::clone(flights.entry(url.to_string()).or_default())
        };

        let mut fell_back = false;
        let flag = &mut fell_back;
        let verdict = cell
            .get_or_init(move || async move {
                let (verdict, resolved) = self.resolve(url).await;
                *flag = !resolved;
                verdict
            })
            .await
            .clone();

        if fell_back {
            self.forget(url, &cell);
        }
        verdict
    }

    fn forget(&self, url: &str, cell: &Arc<OnceCell<LinkRiskVerdict>>) {
        let mut flights = self.flights.lock();
        if flights.get(url).is_some_and(|current| Arc::ptr_eq(current, cell)) {
            flights.remove(url);
            debug!(url = %url, "Dropped fallback verdict");
        }
    }

    /// Returns the verdict and whether the service actually answered.
    async fn resolve(&self, url: &str) -> (LinkRiskVerdict, bool) {
        self.issued.fetch_add(1, Ordering::Relaxed);
        debug!(url = %url, "Issuing deep link scan");

        match tokio::time::timeout(self.timeout, self.transport.fetch(url)).await {
            Ok(Ok(mut verdict)) => {
                if verdict.url.is_empty() {
                    verdict.url = url.to_string();
                }
                info!(
                    url = %url,
                    is_safe = verdict.is_safe,
                    threat_level = %verdict.threat_level,
                    "Deep link scan complete"
                );
                (verdict, true)
            }
            Ok(Err(err)) => {
                warn!(url = %url, error = %err, policy = ?self.policy, "Deep link scan failed; using fallback verdict");
                (self.policy.fallback(url), false)
            }
            Err(_) => {
                let err = ScanError::Timeout(self.timeout);
                warn!(url = %url, error = %err, policy = ?self.policy, "Deep link scan failed; using fallback verdict");
                (self.policy.fallback(url), false)
            }
        }
    }

    pub fn cached(&self, url: &str) -> Option<LinkRiskVerdict> {
        self.flights.lock().get(url).and_then(|cell| cell.get().cloned())
    }

    /// Number of requests actually handed to the transport.
    pub fn issued_requests(&self) -> usize {
        self.issued.load(Ordering::Relaxed)
    }

    /// Drops resolved verdicts. In-flight requests keep running and their
    /// waiters still receive the result. Called when the displayed page changes.
    pub fn clear_cache(&self) {
        self.flights.lock().retain(|_, cell| !cell.initialized());
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }
}
