#![allow(dead_code)]

use scamguard::error::ScanError;
use scamguard::link::LinkRiskClassifier;
use scamguard::remote::{FailurePolicy, LinkScanTransport, RemoteLinkScanner};
use scamguard::reports::MemorySink;
use scamguard::scanner::{ContentScanner, ScanThresholds};
use scamguard::session::Engine;
use scamguard::types::{LinkRiskVerdict, ThreatLevel, VerdictDetails};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Link-scan service stand-in. Unknown URLs answer HTTP 503, as do the
/// first `outages` calls.
#[derive(Default)]
pub struct MockTransport {
    pub verdicts: HashMap<String, LinkRiskVerdict>,
    pub delay: Duration,
    pub hang: bool,
    pub outages: usize,
    pub calls: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, verdict: LinkRiskVerdict) -> Self {
        self.verdicts.insert(verdict.url.clone(), verdict);
        self
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn hanging(mut self) -> Self {
        self.hang = true;
        self
    }

    pub fn down_for(mut self, calls: usize) -> Self {
        self.outages = calls;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LinkScanTransport for MockTransport {
    async fn fetch(&self, url: &str) -> Result<LinkRiskVerdict, ScanError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            tokio::time::sleep(Duration::from_secs(3600)).await;
        } else if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if call < self.outages {
            return Err(ScanError::Status(503));
        }
        self.verdicts
            .get(url)
            .cloned()
            .ok_or(ScanError::Status(503))
    }
}

pub fn verdict(url: &str, is_safe: bool, level: ThreatLevel) -> LinkRiskVerdict {
    LinkRiskVerdict {
        url: url.to_string(),
        is_safe,
        threat_level: level,
        threats: if is_safe {
            Vec::new()
        } else {
            vec!["Flagged by 3 security vendors".to_string()]
        },
        recommendations: vec!["Delete the message containing this link immediately".to_string()],
        details: VerdictDetails::default(),
        timestamp: None,
    }
}

pub fn remote(transport: MockTransport) -> RemoteLinkScanner<MockTransport> {
    RemoteLinkScanner::new(transport, Duration::from_secs(5), FailurePolicy::Open)
}

pub fn engine(
    remote: Arc<RemoteLinkScanner<MockTransport>>,
    sink: Arc<MemorySink>,
) -> Engine<MockTransport> {
    Engine {
        scanner: Arc::new(ContentScanner::builtin().unwrap()),
        classifier: LinkRiskClassifier::new(),
        remote,
        reports: sink,
        thresholds: ScanThresholds::default(),
    }
}
