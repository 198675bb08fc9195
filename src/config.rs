use crate::remote::{FailurePolicy, RemoteScanConfig, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT};
use crate::reports::{DEFAULT_MAX_AGE_DAYS, DEFAULT_MAX_ENTRIES};
use crate::rules::{CategoryConfig, PatternCatalog};
use crate::scanner::ScanThresholds;
use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const MAX_CONFIG_BYTES: u64 = 1024 * 1024;
const MAX_TIMEOUT_MS: u64 = 60_000;

pub const DEFAULT_TRANSCRIPTION_ENDPOINT: &str = "http://localhost:80/api/transcribe";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub remote: Option<RemoteConfig>,
    pub thresholds: Option<ScanThresholds>,
    pub patterns: Option<PatternsConfig>,
    pub reports: Option<ReportsConfig>,
    pub voice: Option<VoiceConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RemoteConfig {
    pub endpoint: Option<String>,
    pub timeout_ms: Option<u64>,
    pub failure_policy: Option<FailurePolicy>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PatternsConfig {
    #[serde(default)]
    pub categories: Vec<CategoryConfig>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReportsConfig {
    pub path: Option<PathBuf>,
    pub max_entries: Option<usize>,
    pub max_age_days: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VoiceConfig {
    pub transcription_endpoint: Option<String>,
    pub timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    pub level: Option<String>,
}

/// Report-store settings with defaults filled in.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    pub path: Option<PathBuf>,
    pub max_entries: usize,
    pub max_age_days: i64,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if let Ok(meta) = fs::metadata(path) {
            if meta.len() > MAX_CONFIG_BYTES {
                return Err(anyhow!(
                    "config {} exceeds {} bytes",
                    path.display(),
                    MAX_CONFIG_BYTES
                ));
            }
        }
        let data = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        Self::parse(&data).with_context(|| format!("Invalid config {}", path.display()))
    }

    pub fn parse(data: &str) -> Result<Self> {
        let cfg: Config = toml::from_str(data)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        let timeouts = [
            self.remote.as_ref().and_then(|r| r.timeout_ms),
            self.voice.as_ref().and_then(|v| v.timeout_ms),
        ];
        for ms in timeouts.into_iter().flatten() {
            if ms == 0 || ms > MAX_TIMEOUT_MS {
                return Err(anyhow!("timeout_ms must be between 1 and {}", MAX_TIMEOUT_MS));
            }
        }
        if let Some(patterns) = &self.patterns {
            if let Some(bad) = patterns.categories.iter().find(|c| c.name.trim().is_empty()) {
                return Err(anyhow!("pattern category with empty name ({:?})", bad.phrases));
            }
        }
        if let Some(reports) = &self.reports {
            if reports.max_entries == Some(0) {
                return Err(anyhow!("reports.max_entries must be at least 1"));
            }
            if reports.max_age_days.is_some_and(|d| d < 1) {
                return Err(anyhow!("reports.max_age_days must be at least 1"));
            }
        }
        Ok(())
    }

    pub fn remote_scan(&self) -> RemoteScanConfig {
        let remote = self.remote.as_ref();
        RemoteScanConfig {
            endpoint: remote
                .and_then(|r| r.endpoint.clone())
                .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string()),
            timeout: remote
                .and_then(|r| r.timeout_ms)
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_TIMEOUT),
            failure_policy: remote.and_then(|r| r.failure_policy).unwrap_or_default(),
        }
    }

    pub fn thresholds(&self) -> ScanThresholds {
        self.thresholds.unwrap_or_default()
    }

    pub fn catalog(&self) -> PatternCatalog {
        match &self.patterns {
            Some(p) => PatternCatalog::with_extensions(&p.categories),
            None => PatternCatalog::builtin(),
        }
    }

    pub fn report_settings(&self) -> ReportSettings {
        let reports = self.reports.as_ref();
        ReportSettings {
            path: reports.and_then(|r| r.path.clone()),
            max_entries: reports
                .and_then(|r| r.max_entries)
                .unwrap_or(DEFAULT_MAX_ENTRIES),
            max_age_days: reports
                .and_then(|r| r.max_age_days)
                .unwrap_or(DEFAULT_MAX_AGE_DAYS),
        }
    }

    pub fn transcription(&self) -> (String, Duration) {
        let voice = self.voice.as_ref();
        let endpoint = voice
            .and_then(|v| v.transcription_endpoint.clone())
            .unwrap_or_else(|| DEFAULT_TRANSCRIPTION_ENDPOINT.to_string());
        let timeout = voice
            .and_then(|v| v.timeout_ms)
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_secs(30));
        (endpoint, timeout)
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }
}
