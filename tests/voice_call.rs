use scamguard::error::ScanError;
use scamguard::voice::{ScamType, Transcriber, VoiceAnalyzer, HANG_UP_NOW};
use scamguard::ThreatLevel;

struct FixedTranscriber(Result<&'static str, &'static str>);

impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, _audio: &[u8], _format: &str) -> Result<String, ScanError> {
        match self.0 {
            Ok(text) => Ok(text.to_string()),
            Err(msg) => Err(ScanError::Transcription(msg.to_string())),
        }
    }
}

#[test]
fn irs_call_is_critical() {
    let a = VoiceAnalyzer::new()
        .analyze_transcription("This is the Internal Revenue Service. There is an arrest warrant in your name.");
    assert_eq!(a.scam_type, Some(ScamType::GovernmentImpersonation));
    assert_eq!(a.threat_level, ThreatLevel::Critical);
    assert_eq!(a.immediate_action.as_deref(), Some(HANG_UP_NOW));
    assert_eq!(a.warning_indicators.government_impersonation, 2);
    assert!(a.recommendations[0].contains("HANG UP"));
}

#[test]
fn bank_call_recommends_calling_the_bank() {
    let a = VoiceAnalyzer::new()
        .analyze_transcription(
            "Security department here, we saw a suspicious transaction. Please verify your identity.",
        );
    assert_eq!(a.scam_type, Some(ScamType::BankFraud));
    assert_eq!(a.threat_level, ThreatLevel::High);
    assert!(a
        .recommendations
        .iter()
        .any(|r| r.contains("call your bank using the number on your card")));
}

#[test]
fn scam_story_without_indicators_is_not_flagged() {
    // category phrases pick the scam type, but only indicators make a call suspicious
    let a = VoiceAnalyzer::new().analyze_transcription("Grandma, it's me. I've been arrested.");
    assert!(!a.is_suspicious);
    assert_eq!(a.scam_type, None);
    assert_eq!(a.detected_phrases, vec!["i've been arrested"]);
}

#[test]
fn identity_words_alone_are_unknown_scam() {
    let a = VoiceAnalyzer::new().analyze_transcription("Please confirm your date of birth");
    assert!(a.is_suspicious);
    assert_eq!(a.scam_type, Some(ScamType::UnknownScam));
    assert_eq!(a.threat_level, ThreatLevel::Medium);
    assert_eq!(a.confidence, 15);
}

#[test]
fn confidence_is_capped() {
    let a = VoiceAnalyzer::new().analyze_transcription(
        "Urgent, act now, right now, don't hang up. Buy a gift card, a steam card, \
         use bitcoin or zelle and verify and confirm your account number.",
    );
    assert_eq!(a.confidence, 100);
    assert_eq!(a.threat_level, ThreatLevel::Critical);
}

#[tokio::test]
async fn audio_is_transcribed_then_analyzed() {
    let transcriber = FixedTranscriber(Ok("You've won! Pay the processing fee by western union to claim your prize."));
    let a = VoiceAnalyzer::new()
        .analyze_audio(&transcriber, b"RIFF....", "wav")
        .await
        .unwrap();
    assert_eq!(a.scam_type, Some(ScamType::LotteryScam));
    assert_eq!(a.threat_level, ThreatLevel::Medium);
    assert_eq!(
        a.transcription.as_deref(),
        Some("You've won! Pay the processing fee by western union to claim your prize.")
    );
}

#[tokio::test]
async fn transcription_failure_is_returned() {
    let transcriber = FixedTranscriber(Err("service down"));
    let err = VoiceAnalyzer::new()
        .analyze_audio(&transcriber, b"", "mp3")
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::Transcription(_)));
}
