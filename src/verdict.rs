use crate::link::{LinkCheck, LinkRiskClassifier};
use crate::types::{
    AiAnalysis, LinkRiskVerdict, PatternAnalysis, Reputation, SafeBrowsing, ThreatLevel,
    VerdictDetails,
};
use chrono::Utc;

/// Vendors flagging a URL as malicious above this count make it critical.
const CRITICAL_VENDOR_COUNT: u32 = 5;

/// Upstream signals gathered for one URL. Any of them may be missing.
#[derive(Debug, Clone, Default)]
pub struct UpstreamSignals {
    pub pattern: Option<LinkCheck>,
    pub safe_browsing: Option<SafeBrowsing>,
    pub reputation: Option<Reputation>,
    pub ai: Option<(bool, AiAnalysis)>,
}

/// Folds upstream signals into one uniform verdict, escalating the threat
/// level as stronger evidence arrives.
#[derive(Debug)]
pub struct VerdictBuilder {
    url: String,
    is_safe: bool,
    level: ThreatLevel,
    threats: Vec<String>,
    details: VerdictDetails,
}

impl VerdictBuilder {
    pub fn new(url: &str) -> Self {
        Self {
            url: url.to_string(),
            is_safe: true,
            level: ThreatLevel::Low,
            threats: Vec::new(),
            details: VerdictDetails::default(),
        }
    }

    pub fn pattern(mut self, check: &LinkCheck) -> Self {
        if check.suspicious {
            self.threats.push("Suspicious URL pattern detected".to_string());
            self.is_safe = false;
            self.level = ThreatLevel::Medium;
            self.details.pattern_analysis = Some(PatternAnalysis {
                domain: check.domain.clone(),
                reasons: check.reasons.clone(),
            });
        }
        self
    }

    pub fn safe_browsing(mut self, sb: &SafeBrowsing) -> Self {
        if !sb.threats.is_empty() {
            self.threats.extend(sb.threats.iter().cloned());
            self.is_safe = false;
            self.level = ThreatLevel::High;
            self.details.safe_browsing = Some(sb.clone());
        }
        self
    }

    pub fn reputation(mut self, rep: &Reputation) -> Self {
        if rep.malicious_count > 0 {
            self.threats
                .push(format!("Flagged by {} security vendors", rep.malicious_count));
            self.is_safe = false;
            if rep.malicious_count > CRITICAL_VENDOR_COUNT {
                self.level = ThreatLevel::Critical;
            } else if self.level != ThreatLevel::Critical {
                self.level = ThreatLevel::High;
            }
            self.details.reputation = Some(rep.clone());
        }
        self
    }

    pub fn ai(mut self, is_suspicious: bool, analysis: &AiAnalysis) -> Self {
        if is_suspicious {
            self.threats
                .push("AI detected potential scam indicators".to_string());
            self.is_safe = false;
            if self.level == ThreatLevel::Low {
                self.level = ThreatLevel::Medium;
            }
            self.details.ai_analysis = Some(analysis.clone());
        }
        self
    }

    pub fn build(self) -> LinkRiskVerdict {
        let recommendations = recommendations_for(self.is_safe, self.level, &self.threats);
        LinkRiskVerdict {
            url: self.url,
            is_safe: self.is_safe,
            threat_level: self.level,
            threats: self.threats,
            recommendations,
            details: self.details,
            timestamp: Some(Utc::now().to_rfc3339()),
        }
    }
}

pub fn aggregate(url: &str, signals: &UpstreamSignals) -> LinkRiskVerdict {
    let mut builder = VerdictBuilder::new(url);
    if let Some(check) = &signals.pattern {
        builder = builder.pattern(check);
    }
    if let Some(sb) = &signals.safe_browsing {
        builder = builder.safe_browsing(sb);
    }
    if let Some(rep) = &signals.reputation {
        builder = builder.reputation(rep);
    }
    if let Some((suspicious, analysis)) = &signals.ai {
        builder = builder.ai(*suspicious, analysis);
    }
    builder.build()
}

/// Offline verdict from the local heuristics alone.
pub fn local_verdict(classifier: &LinkRiskClassifier, url: &str) -> LinkRiskVerdict {
    let signals = UpstreamSignals {
        pattern: Some(classifier.diagnose(url)),
        ..Default::default()
    };
    aggregate(url, &signals)
}

pub fn recommendations_for(is_safe: bool, level: ThreatLevel, threats: &[String]) -> Vec<String> {
    let mut recs: Vec<String> = Vec::new();

    if is_safe {
        recs.push("✅ This link appears to be safe based on our analysis".into());
        recs.push("However, always verify the sender's identity before clicking".into());
        return recs;
    }

    match level {
        ThreatLevel::Critical => {
            recs.push("🚨 DO NOT CLICK THIS LINK - Critical threat detected".into());
            recs.push("This link is extremely dangerous and may steal your information".into());
            recs.push("Delete the message containing this link immediately".into());
        }
        ThreatLevel::High => {
            recs.push("⚠️ DANGER - This link is highly suspicious".into());
            recs.push("Do not click unless you are absolutely certain it's legitimate".into());
            recs.push("Contact the supposed sender through official channels to verify".into());
        }
        ThreatLevel::Medium => {
            recs.push("⚠️ CAUTION - This link shows suspicious characteristics".into());
            recs.push("Verify the sender's identity before proceeding".into());
            recs.push("Look for official contact information to confirm legitimacy".into());
        }
        ThreatLevel::Low | ThreatLevel::Unknown => {}
    }

    if threats.iter().any(|t| t.contains("SOCIAL_ENGINEERING")) {
        recs.push("This appears to be a phishing attempt - never enter personal information".into());
    }
    if threats.iter().any(|t| t.contains("MALWARE")) {
        recs.push("This link may download malicious software to your device".into());
    }

    recs.push("Never provide passwords, credit card numbers, or SSN through links".into());
    recs.push("When in doubt, contact support or a trusted family member".into());
    recs
}
