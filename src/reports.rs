use crate::types::{LinkRiskVerdict, ScanResult};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration as Age, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const DEFAULT_MAX_ENTRIES: usize = 100;
pub const DEFAULT_MAX_AGE_DAYS: i64 = 30;
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);
pub const FLUSH_INTERVAL: Duration = Duration::from_secs(1);

const REPORT_ACTION: &str = "report_scam";

/// What the user was looking at when they reported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReportEvidence {
    Content(ScanResult),
    Link(LinkRiskVerdict),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScamReport {
    pub action: String,
    pub url: String,
    pub patterns: ReportEvidence,
    pub timestamp: DateTime<Utc>,
}

impl ScamReport {
    pub fn new(url: &str, patterns: ReportEvidence) -> Self {
        Self {
            action: REPORT_ACTION.to_string(),
            url: url.to_string(),
            patterns,
            timestamp: Utc::now(),
        }
    }
}

/// Fire-and-forget destination for user reports. Must not block or fail
/// visibly.
pub trait ReportSink: Send + Sync {
    fn submit(&self, report: ScamReport);
}

/// Keeps submitted reports in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<ScamReport>>,
}

impl MemorySink {
    pub fn reports(&self) -> Vec<ScamReport> {
        self.reports.lock().clone()
    }
}

impl ReportSink for MemorySink {
    fn submit(&self, report: ScamReport) {
        self.reports.lock().push(report);
    }
}

/// Bounded report history, optionally persisted as a JSON array.
///
/// Holds at most `max_entries` reports, evicting the oldest first, and drops
/// anything older than `max_age` on each sweep. `submit` only touches memory;
/// the file is written by [`ReportStore::flush`], which [`run_flusher`] calls
/// off the event loop and `Drop` calls one last time.
#[derive(Debug)]
pub struct ReportStore {
    path: Option<PathBuf>,
    max_entries: usize,
    max_age: Age,
    entries: Mutex<VecDeque<ScamReport>>,
    dirty: AtomicBool,
    writer: Mutex<()>,
}

impl ReportStore {
    pub fn in_memory(max_entries: usize, max_age_days: i64) -> Self {
        Self {
            path: None,
            max_entries: max_entries.max(1),
            max_age: Age::days(max_age_days),
            entries: Mutex::new(VecDeque::new()),
            dirty: AtomicBool::new(false),
            writer: Mutex::new(()),
        }
    }

    /// Loads existing reports from `path`; a missing file starts empty.
    pub fn open(path: &Path, max_entries: usize, max_age_days: i64) -> Result<Self> {
        let mut store = Self::in_memory(max_entries, max_age_days);
        store.path = Some(path.to_path_buf());

        if path.exists() {
            let raw = fs::read(path)
                .with_context(|| format!("Failed to read report store {}", path.display()))?;
            if !raw.is_empty() {
                let mut loaded: VecDeque<ScamReport> = serde_json::from_slice(&raw)
                    .with_context(|| format!("Invalid report store {}", path.display()))?;
                while loaded.len() > store.max_entries {
                    loaded.pop_front();
                }
                debug!(path = %path.display(), count = loaded.len(), "Loaded report store");
                *store.entries.get_mut() = loaded;
            }
        }
        Ok(store)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Newest first.
    pub fn recent(&self, n: usize) -> Vec<ScamReport> {
        self.entries.lock().iter().rev().take(n).cloned().collect()
    }

    /// Purges reports older than the retention window; returns how many were removed.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.max_age;
        let removed = {
            let mut entries = self.entries.lock();
            let before = entries.len();
            entries.retain(|r| r.timestamp >= cutoff);
            before - entries.len()
        };
        if removed > 0 {
            info!(removed, "Purged expired scam reports");
            self.dirty.store(true, Ordering::Release);
            self.flush();
        }
        removed
    }

    /// Writes pending changes to disk. Returns whether a write happened.
    pub fn flush(&self) -> bool {
        let Some(path) = &self.path else {
            return false;
        };
        let _guard = self.writer.lock();
        if !self.dirty.swap(false, Ordering::AcqRel) {
            return false;
        }

        let snapshot: Vec<ScamReport> = self.entries.lock().iter().cloned().collect();
        let result = serde_json::to_vec_pretty(&snapshot)
            .map_err(anyhow::Error::from)
            .and_then(|bytes| fs::write(path, bytes).map_err(anyhow::Error::from));
        match result {
            Ok(()) => {
                debug!(path = %path.display(), count = snapshot.len(), "Persisted scam reports");
                true
            }
            Err(err) => {
                self.dirty.store(true, Ordering::Release);
                warn!(path = %path.display(), error = %err, "Failed to persist scam reports");
                false
            }
        }
    }
}

impl Drop for ReportStore {
    fn drop(&mut self) {
        self.flush();
    }
}

impl ReportSink for ReportStore {
    fn submit(&self, report: ScamReport) {
        {
            let mut entries = self.entries.lock();
            entries.push_back(report);
            while entries.len() > self.max_entries {
                entries.pop_front();
            }
        }
        self.dirty.store(true, Ordering::Release);
    }
}

/// Flushes `store` every `period` on the blocking pool until the task is dropped.
pub async fn run_flusher(store: Arc<ReportStore>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        let store = Arc::clone(&store);
        if let Err(err) = tokio::task::spawn_blocking(move || store.flush()).await {
            warn!(error = %err, "Report flush task failed");
        }
    }
}

/// Sweeps `store` every `period` until the task is dropped.
pub async fn run_sweeper(store: Arc<ReportStore>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    loop {
        ticker.tick().await;
        store.sweep(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ThreatLevel;

    fn report_at(url: &str, timestamp: DateTime<Utc>) -> ScamReport {
        ScamReport {
            timestamp,
            ..ScamReport::new(url, ReportEvidence::Link(LinkRiskVerdict::fail_closed(url)))
        }
    }

    #[test]
    fn evidence_round_trips_untagged() {
        let content = ReportEvidence::Content(ScanResult {
            score: 1,
            threat_level: ThreatLevel::Medium,
            matches: Vec::new(),
        });
        let json = serde_json::to_string(&content).unwrap();
        assert!(matches!(
            serde_json::from_str::<ReportEvidence>(&json).unwrap(),
            ReportEvidence::Content(_)
        ));

        let link = ReportEvidence::Link(LinkRiskVerdict::fail_open("http://a.test"));
        let json = serde_json::to_string(&link).unwrap();
        assert!(matches!(
            serde_json::from_str::<ReportEvidence>(&json).unwrap(),
            ReportEvidence::Link(_)
        ));
    }

    #[test]
    fn cap_evicts_oldest() {
        let store = ReportStore::in_memory(3, DEFAULT_MAX_AGE_DAYS);
        for i in 0..5 {
            store.submit(report_at(&format!("http://r{}.test", i), Utc::now()));
        }
        let urls: Vec<_> = store.recent(10).into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["http://r4.test", "http://r3.test", "http://r2.test"]);
    }

    #[test]
    fn sweep_drops_expired_entries() {
        let store = ReportStore::in_memory(DEFAULT_MAX_ENTRIES, 30);
        let now = Utc::now();
        store.submit(report_at("http://old.test", now - Age::days(31)));
        store.submit(report_at("http://new.test", now - Age::days(2)));
        assert_eq!(store.sweep(now), 1);
        assert_eq!(store.recent(5)[0].url, "http://new.test");
    }
}
