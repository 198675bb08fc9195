use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThreatLevel {
    Unknown,   // Remote verdict unavailable
    Low,       // Checked, nothing notable
    Medium,    // A few indicators
    High,      // Strong indicators
    Critical,  // Overwhelming indicators or confirmed by vendors
}

impl ThreatLevel {
    /// Step function over a content score. Zero means no threat and yields `None`.
    pub fn from_score(score: usize) -> Option<Self> {
        match score {
            0 => None,
            1..=2 => Some(ThreatLevel::Medium),
            3..=4 => Some(ThreatLevel::High),
            _ => Some(ThreatLevel::Critical),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ThreatLevel::Unknown => "unknown",
            ThreatLevel::Low => "low",
            ThreatLevel::Medium => "medium",
            ThreatLevel::High => "high",
            ThreatLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryMatch {
    pub category: String,
    pub matched_phrases: Vec<String>,
    pub count: usize,
}

/// Outcome of scoring a block of text against the pattern catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanResult {
    pub score: usize,
    pub threat_level: ThreatLevel,
    pub matches: Vec<CategoryMatch>,
}

impl ScanResult {
    pub fn category(&self, name: &str) -> Option<&CategoryMatch> {
        self.matches.iter().find(|m| m.category == name)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternAnalysis {
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub reasons: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SafeBrowsing {
    #[serde(default)]
    pub threats: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Reputation {
    #[serde(default)]
    pub malicious_count: u32,
    #[serde(default)]
    pub suspicious_count: u32,
    #[serde(default)]
    pub harmless_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AiAnalysis {
    #[serde(default)]
    pub reasons: Vec<String>,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerdictDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern_analysis: Option<PatternAnalysis>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub safe_browsing: Option<SafeBrowsing>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reputation: Option<Reputation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_analysis: Option<AiAnalysis>,
}

/// Deep verdict for a single URL, as returned by the link-scan service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRiskVerdict {
    #[serde(default)]
    pub url: String,
    pub is_safe: bool,
    pub threat_level: ThreatLevel,
    #[serde(default)]
    pub threats: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub details: VerdictDetails,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl LinkRiskVerdict {
    /// Verdict substituted when the deep scan cannot be completed.
    pub fn fail_open(url: &str) -> Self {
        Self {
            url: url.to_string(),
            is_safe: true,
            threat_level: ThreatLevel::Unknown,
            threats: Vec::new(),
            recommendations: Vec::new(),
            details: VerdictDetails::default(),
            timestamp: None,
        }
    }

    pub fn fail_closed(url: &str) -> Self {
        Self {
            is_safe: false,
            threats: vec!["Link could not be verified".to_string()],
            ..Self::fail_open(url)
        }
    }
}

/// Which overlay slot a warning occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WarningKind {
    Content,
    Link,
}

/// What kind of content a content warning is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Page,
    Email,
}

impl ContentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ContentKind::Page => "page",
            ContentKind::Email => "email",
        }
    }
}
