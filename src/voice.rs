use crate::error::ScanError;
use crate::rules::{VOICE_CATEGORIES, VOICE_IDENTITY_WORDS};
use crate::types::ThreatLevel;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

pub const HANG_UP_NOW: &str = "HANG UP IMMEDIATELY - This is a scam call!";

const CONFIDENCE_PER_INDICATOR: u32 = 15;
const ESCALATION_BONUS: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScamType {
    FakeTechSupport,
    GovernmentImpersonation,
    GrandparentScam,
    BankFraud,
    LotteryScam,
    PaymentScam,
    UnknownScam,
}

/// Per-indicator counts, keyed the way the analysis service reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningIndicators {
    pub high_urgency: u32,
    pub payment_request: u32,
    pub tech_support: u32,
    pub government_impersonation: u32,
    pub pressure_tactics: u32,
    pub identity_verification: u32,
    pub suspicious_payment_method: u32,
}

impl WarningIndicators {
    pub fn total(&self) -> u32 {
        self.high_urgency
            + self.payment_request
            + self.tech_support
            + self.government_impersonation
            + self.pressure_tactics
            + self.identity_verification
            + self.suspicious_payment_method
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceAnalysis {
    pub is_suspicious: bool,
    pub threat_level: ThreatLevel,
    pub scam_type: Option<ScamType>,
    pub confidence: u32,
    pub detected_phrases: Vec<String>,
    pub warning_indicators: WarningIndicators,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub immediate_action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcription: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chunks_analyzed: Option<usize>,
}

/// Speech-to-text backend for recorded calls.
pub trait Transcriber: Send + Sync {
    fn transcribe(
        &self,
        audio: &[u8],
        format: &str,
    ) -> impl Future<Output = Result<String, ScanError>> + Send;
}

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

/// Posts raw audio to a transcription endpoint that answers `{"text": ...}`.
pub struct HttpTranscriber {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTranscriber {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ScanError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

impl Transcriber for HttpTranscriber {
    async fn transcribe(&self, audio: &[u8], format: &str) -> Result<String, ScanError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, format!("audio/{}", format))
            .body(audio.to_vec())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ScanError::Transcription(format!(
                "service answered {}",
                response.status()
            )));
        }
        let body = response.bytes().await?;
        let parsed: TranscriptionResponse =
            serde_json::from_slice(&body).map_err(|e| ScanError::Decode(e.to_string()))?;
        Ok(parsed.text)
    }
}

/// Phrase-based scoring of phone call transcripts.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoiceAnalyzer;

impl VoiceAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze_transcription(&self, transcription: &str) -> VoiceAnalysis {
        let lower = transcription.to_lowercase();

        let mut detected: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
        let mut detected_phrases = Vec::new();
        for (category, phrases) in VOICE_CATEGORIES {
            let hits: Vec<&str> = phrases.iter().copied().filter(|p| lower.contains(p)).collect();
            if !hits.is_empty() {
                detected_phrases.extend(hits.iter().map(|p| p.to_string()));
                detected.insert(*category, hits);
            }
        }
        let hits = |category: &str| detected.get(category).map_or(0, |v| v.len() as u32);

        let indicators = WarningIndicators {
            high_urgency: hits("pressure_tactics"),
            payment_request: hits("payment_requests"),
            tech_support: hits("tech_support"),
            government_impersonation: hits("irs_scam"),
            pressure_tactics: hits("pressure_tactics"),
            identity_verification: VOICE_IDENTITY_WORDS
                .iter()
                .filter(|w| lower.contains(*w))
                .count() as u32,
            suspicious_payment_method: hits("payment_requests"),
        };

        let total = indicators.total();
        let mut analysis = VoiceAnalysis {
            is_suspicious: total > 0,
            threat_level: ThreatLevel::Low,
            scam_type: None,
            confidence: 0,
            detected_phrases,
            warning_indicators: indicators,
            recommendations: Vec::new(),
            immediate_action: None,
            transcription: None,
            chunks_analyzed: None,
        };

        if analysis.is_suspicious {
            let (scam_type, level) = if hits("tech_support") > 0 {
                (ScamType::FakeTechSupport, ThreatLevel::High)
            } else if hits("irs_scam") > 0 {
                (ScamType::GovernmentImpersonation, ThreatLevel::Critical)
            } else if hits("grandparent_scam") > 0 {
                (ScamType::GrandparentScam, ThreatLevel::High)
            } else if hits("bank_scam") > 0 {
                (ScamType::BankFraud, ThreatLevel::High)
            } else if hits("lottery_scam") > 0 {
                (ScamType::LotteryScam, ThreatLevel::Medium)
            } else if analysis.warning_indicators.payment_request >= 2 {
                (ScamType::PaymentScam, ThreatLevel::High)
            } else {
                (ScamType::UnknownScam, ThreatLevel::Medium)
            };
            analysis.scam_type = Some(scam_type);
            analysis.threat_level = level;
            analysis.confidence = (total * CONFIDENCE_PER_INDICATOR).min(100);

            let w = &analysis.warning_indicators;
            if w.payment_request >= 2 && w.high_urgency >= 2 {
                analysis.threat_level = ThreatLevel::Critical;
                analysis.confidence = (analysis.confidence + ESCALATION_BONUS).min(100);
            }
        }

        analysis.recommendations = recommendations(&analysis);
        if analysis.threat_level == ThreatLevel::Critical {
            analysis.immediate_action = Some(HANG_UP_NOW.to_string());
        }

        debug!(
            threat_level = %analysis.threat_level,
            confidence = analysis.confidence,
            phrases = analysis.detected_phrases.len(),
            "Analyzed call transcript"
        );
        analysis
    }

    /// Live monitoring: chunks are joined and analyzed as one transcript.
    pub fn analyze_chunks<S: AsRef<str>>(&self, chunks: &[S]) -> VoiceAnalysis {
        let joined = chunks
            .iter()
            .map(|c| c.as_ref())
            .collect::<Vec<_>>()
            .join(" ");
        let mut analysis = self.analyze_transcription(&joined);
        analysis.chunks_analyzed = Some(chunks.len());
        analysis
    }

    pub async fn analyze_audio<T: Transcriber>(
        &self,
        transcriber: &T,
        audio: &[u8],
        format: &str,
    ) -> Result<VoiceAnalysis, ScanError> {
        let text = transcriber.transcribe(audio, format).await?;
        info!(format, chars = text.len(), "Transcribed call audio");
        let mut analysis = self.analyze_transcription(&text);
        analysis.transcription = Some(text);
        Ok(analysis)
    }
}

fn recommendations(analysis: &VoiceAnalysis) -> Vec<String> {
    let mut recs: Vec<&str> = Vec::new();

    if !analysis.is_suspicious {
        recs.push("✅ No immediate scam indicators detected");
        recs.push("However, remain cautious and never share personal information");
        return recs.into_iter().map(String::from).collect();
    }

    match analysis.threat_level {
        ThreatLevel::Critical => recs.extend([
            "🚨 HANG UP IMMEDIATELY - This is a scam!",
            "Do not provide any information",
            "Do not send money or gift cards",
            "Block this number",
            "Report to FTC at reportfraud.ftc.gov",
        ]),
        ThreatLevel::High => recs.extend([
            "⚠️ WARNING - This call shows strong scam indicators",
            "End the call politely",
            "Call the organization back using official phone numbers",
            "Never allow remote access to your computer",
        ]),
        ThreatLevel::Medium => recs.extend([
            "⚠️ CAUTION - Suspicious patterns detected",
            "Verify the caller's identity independently",
            "Do not provide sensitive information",
        ]),
        ThreatLevel::Low | ThreatLevel::Unknown => {}
    }

    match analysis.scam_type {
        Some(ScamType::FakeTechSupport) => recs.extend([
            "💻 Microsoft/Apple will NEVER call you unsolicited",
            "Do not allow remote access to your computer",
            "Hang up and contact tech support directly if concerned",
        ]),
        Some(ScamType::GovernmentImpersonation) => recs.extend([
            "🏛️ IRS/Government agencies send letters, not threatening calls",
            "They will never demand immediate payment",
            "Call the agency directly using official numbers",
        ]),
        Some(ScamType::GrandparentScam) => recs.extend([
            "👨‍👩‍👧‍👦 Verify by asking personal questions only the real person would know",
            "Call the family member directly using a known number",
            "Contact other family members to verify the situation",
        ]),
        Some(ScamType::BankFraud) => recs.extend([
            "🏦 Hang up and call your bank using the number on your card",
            "Banks will never ask for full passwords or PINs",
            "Do not provide account numbers over the phone",
        ]),
        _ => {}
    }

    if analysis.warning_indicators.payment_request > 0 {
        recs.push("💳 NEVER pay with gift cards, wire transfers, or cryptocurrency");
        recs.push("Legitimate organizations don't request these payment methods");
    }
    if analysis.warning_indicators.high_urgency > 0 {
        recs.push("⏰ Urgency is a classic scam tactic - take your time");
        recs.push("Legitimate issues can wait for you to verify");
    }

    recs.into_iter().map(String::from).collect()
}
