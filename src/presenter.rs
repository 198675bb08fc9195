use crate::reports::{ReportEvidence, ReportSink, ScamReport};
use crate::rules::split_camel;
use crate::surface::DocumentSurface;
use crate::types::{ContentKind, LinkRiskVerdict, ScanResult, ThreatLevel, WarningKind};
use std::sync::Arc;
use tracing::{debug, info};

const CONTENT_ADVICE: [&str; 4] = [
    "Do NOT click any links",
    "Do NOT provide personal information",
    "Do NOT send money or gift cards",
    "Verify sender through official contact methods",
];

const MAX_LINK_RECOMMENDATIONS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Critical,
    High,
    Caution,
}

impl Tone {
    pub fn for_level(level: ThreatLevel) -> Self {
        match level {
            ThreatLevel::Critical => Tone::Critical,
            ThreatLevel::High => Tone::High,
            _ => Tone::Caution,
        }
    }
}

/// Rendered content of a modal warning.
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    pub kind: WarningKind,
    pub tone: Tone,
    pub title: String,
    pub summary: String,
    pub findings: Vec<String>,
    pub advice: Vec<String>,
    pub actions: [&'static str; 2],
}

impl Overlay {
    pub fn for_content(kind: ContentKind, result: &ScanResult) -> Self {
        let findings = result
            .matches
            .iter()
            .map(|m| {
                let plural = if m.count > 1 { "es" } else { "" };
                format!("{}: {} match{}", split_camel(&m.category), m.count, plural)
            })
            .collect();

        Self {
            kind: WarningKind::Content,
            tone: Tone::for_level(result.threat_level),
            title: format!("This {} looks suspicious!", kind.as_str()),
            summary: format!("We detected {} scam indicators:", result.score),
            findings,
            advice: CONTENT_ADVICE.iter().map(|s| s.to_string()).collect(),
            actions: ["I Understand - Close Warning", "Report This Scam"],
        }
    }

    pub fn for_link(url: &str, verdict: &LinkRiskVerdict) -> Self {
        let mut findings = vec![format!(
            "Threat Level: {}",
            verdict.threat_level.as_str().to_uppercase()
        )];
        findings.extend(verdict.threats.iter().cloned());

        Self {
            kind: WarningKind::Link,
            tone: Tone::Critical,
            title: "DANGEROUS LINK BLOCKED!".to_string(),
            summary: format!("This link has been identified as dangerous: {}", url),
            findings,
            advice: verdict
                .recommendations
                .iter()
                .take(MAX_LINK_RECOMMENDATIONS)
                .cloned()
                .collect(),
            actions: ["Block This Link", "Proceed Anyway (Not Recommended)"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WarningState {
    #[default]
    None,
    Shown,
    Dismissed,
    Reported,
}

#[derive(Debug, Clone)]
enum Trigger {
    Content(ScanResult),
    Link { url: String, verdict: LinkRiskVerdict },
}

#[derive(Debug, Default)]
struct Slot {
    state: WarningState,
    trigger: Option<Trigger>,
}

/// Owns the two overlay slots and their state machines.
pub struct WarningPresenter {
    page_url: String,
    content: Slot,
    link: Slot,
    reports: Arc<dyn ReportSink>,
}

impl WarningPresenter {
    pub fn new(page_url: &str, reports: Arc<dyn ReportSink>) -> Self {
        Self {
            page_url: page_url.to_string(),
            content: Slot::default(),
            link: Slot::default(),
            reports,
        }
    }

    fn slot(&self, kind: WarningKind) -> &Slot {
        match kind {
            WarningKind::Content => &self.content,
            WarningKind::Link => &self.link,
        }
    }

    fn slot_mut(&mut self, kind: WarningKind) -> &mut Slot {
        match kind {
            WarningKind::Content => &mut self.content,
            WarningKind::Link => &mut self.link,
        }
    }

    pub fn state(&self, kind: WarningKind) -> WarningState {
        self.slot(kind).state
    }

    fn show(
        &mut self,
        surface: &mut dyn DocumentSurface,
        overlay: Overlay,
        trigger: Trigger,
    ) -> bool {
        let kind = overlay.kind;
        if self.slot(kind).state == WarningState::Shown || surface.has_overlay(kind) {
            debug!(kind = ?kind, "Warning already shown; ignoring trigger");
            return false;
        }
        surface.inject_overlay(&overlay);
        let slot = self.slot_mut(kind);
        slot.state = WarningState::Shown;
        slot.trigger = Some(trigger);
        info!(kind = ?kind, title = %overlay.title, "Warning shown");
        true
    }

    pub fn show_content_warning(
        &mut self,
        surface: &mut dyn DocumentSurface,
        kind: ContentKind,
        result: &ScanResult,
    ) -> bool {
        self.show(
            surface,
            Overlay::for_content(kind, result),
            Trigger::Content(result.clone()),
        )
    }

    pub fn show_link_warning(
        &mut self,
        surface: &mut dyn DocumentSurface,
        url: &str,
        verdict: &LinkRiskVerdict,
    ) -> bool {
        self.show(
            surface,
            Overlay::for_link(url, verdict),
            Trigger::Link {
                url: url.to_string(),
                verdict: verdict.clone(),
            },
        )
    }

    pub fn dismiss(&mut self, surface: &mut dyn DocumentSurface, kind: WarningKind) -> bool {
        if self.state(kind) != WarningState::Shown {
            return false;
        }
        surface.remove_overlay(kind);
        let slot = self.slot_mut(kind);
        slot.state = WarningState::Dismissed;
        slot.trigger = None;
        debug!(kind = ?kind, "Warning dismissed");
        true
    }

    /// Closes the overlay, then hands the report to the sink without waiting.
    pub fn report(&mut self, surface: &mut dyn DocumentSurface, kind: WarningKind) -> bool {
        if self.state(kind) != WarningState::Shown {
            return false;
        }
        surface.remove_overlay(kind);
        let slot = self.slot_mut(kind);
        slot.state = WarningState::Reported;
        let report = match slot.trigger.take() {
            Some(Trigger::Content(result)) => {
                ScamReport::new(&self.page_url, ReportEvidence::Content(result))
            }
            Some(Trigger::Link { url, verdict }) => {
                ScamReport::new(&url, ReportEvidence::Link(verdict))
            }
            None => return true,
        };
        info!(kind = ?kind, url = %report.url, "Scam reported");
        self.reports.submit(report);
        true
    }

    /// Leaves a shown link warning without dismissing it; returns the URL to
    /// navigate to.
    pub fn proceed_anyway(&mut self, surface: &mut dyn DocumentSurface) -> Option<String> {
        if self.link.state != WarningState::Shown {
            return None;
        }
        surface.remove_overlay(WarningKind::Link);
        self.link.state = WarningState::None;
        match self.link.trigger.take() {
            Some(Trigger::Link { url, .. }) => {
                info!(url = %url, "User proceeded past link warning");
                Some(url)
            }
            _ => None,
        }
    }

    /// Removes any overlay this presenter put up and forgets all state.
    pub fn reset(&mut self, surface: &mut dyn DocumentSurface) {
        for kind in [WarningKind::Content, WarningKind::Link] {
            if self.state(kind) == WarningState::Shown {
                surface.remove_overlay(kind);
            }
            *self.slot_mut(kind) = Slot::default();
        }
    }
}
