use crate::audit::FileFinding;
use crate::link::LinkCheck;
use crate::presenter::{Overlay, Tone};
use crate::reports::{ReportEvidence, ScamReport};
use crate::rules::PatternCatalog;
use crate::surface::{DocumentSurface, HighlightStyle, Marker, NodeId};
use crate::types::{LinkRiskVerdict, ScanResult, ThreatLevel, WarningKind};
use crate::voice::VoiceAnalysis;
use anyhow::Result;
use colored::*;
use serde::Serialize;
use std::collections::HashSet;

const RULE_WIDTH: usize = 80;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn print_banner() {
    println!("\n{}", "╔═══════════════════════════════════════════════════════════════════════════════╗".bright_black());
    println!(
        "{}{}{}",
        "║  ".bright_black(),
        format!("scamguard v{}", env!("CARGO_PKG_VERSION")).bold().cyan(),
        "                                                              ║".bright_black()
    );
    println!(
        "{}{}{}",
        "║  ".bright_black(),
        "Spot scam language, risky links and scam calls before they cost you".italic(),
        "         ║".bright_black()
    );
    println!("{}", "╚═══════════════════════════════════════════════════════════════════════════════╝".bright_black());
}

fn rule() -> ColoredString {
    "═".repeat(RULE_WIDTH).bright_black()
}

fn thin_rule() -> ColoredString {
    "─".repeat(RULE_WIDTH).bright_black()
}

fn level_badge(level: ThreatLevel) -> ColoredString {
    match level {
        ThreatLevel::Critical => "🔴 CRITICAL".red().bold(),
        ThreatLevel::High => "🟠 HIGH".yellow().bold(),
        ThreatLevel::Medium => "🟡 MEDIUM".bold(),
        ThreatLevel::Low => "⚪ LOW".bright_black(),
        ThreatLevel::Unknown => "❔ UNKNOWN".bright_black(),
    }
}

pub fn print_legend(catalog: &PatternCatalog) {
    println!("\n{}", "SCAM PATTERN LEGEND".bold().white());
    println!("{}", rule());
    println!(
        "{}",
        format!(
            "{} phrases in {} categories",
            catalog.phrase_count(),
            catalog.categories().len()
        )
        .bright_black()
    );

    for cat in catalog.categories() {
        println!(
            "\n{} {} {}",
            cat.id.cyan().bold(),
            cat.label.bold(),
            format!("({} phrases)", cat.phrases.len()).bright_black()
        );
        println!("   {}", cat.phrases.join(", "));
    }

    println!("\n{}", "SCORE → THREAT LEVEL".bold());
    println!("{}", thin_rule());
    println!("   1-2  {}", level_badge(ThreatLevel::Medium));
    println!("   3-4  {}", level_badge(ThreatLevel::High));
    println!("   5+   {}", level_badge(ThreatLevel::Critical));
}

pub fn print_scan_result(label: &str, result: Option<&ScanResult>) {
    println!("\n{} {}", "CONTENT:".bold().white(), label.yellow().bold());
    let Some(result) = result else {
        println!("   {}", "✅ No scam indicators found".green().bold());
        return;
    };
    println!(
        "   {}  score {}",
        level_badge(result.threat_level),
        result.score.to_string().bold()
    );
    for m in &result.matches {
        println!(
            "   • {}: {}",
            crate::rules::split_camel(&m.category).cyan(),
            m.matched_phrases.join(", ")
        );
    }
}

fn print_link_check(url: &str, check: &LinkCheck) {
    if check.suspicious {
        println!("   {} {}", "⚠️ ".yellow(), url.yellow());
        for reason in &check.reasons {
            println!("      - {}", reason);
        }
    } else {
        println!("   {} {}", "✓".green(), url.bright_black());
    }
}

fn print_verdict(verdict: &LinkRiskVerdict) {
    let status = if verdict.is_safe {
        "safe".green().bold()
    } else {
        "UNSAFE".red().bold()
    };
    println!("      deep scan: {} {}", status, level_badge(verdict.threat_level));
    for threat in &verdict.threats {
        println!("      - {}", threat.red());
    }
}

pub fn print_link_report(url: &str, check: &LinkCheck, verdict: Option<&LinkRiskVerdict>) {
    println!("\n{}", rule());
    println!("{} {}", "LINK:".bold().white(), url.yellow().bold());
    println!("{}", rule());
    print_link_check(url, check);
    if let Some(verdict) = verdict {
        print_verdict(verdict);
        if !verdict.recommendations.is_empty() {
            println!("\n{}", "What you should do:".bold());
            for rec in &verdict.recommendations {
                println!("   • {}", rec);
            }
        }
    }
}

pub fn print_scan_report(findings: &[FileFinding], verbose: bool) {
    println!("\n{}", rule());
    println!("{}", "SCAN REPORT".bold().white());
    println!("{}\n", rule());

    let flagged: Vec<_> = findings.iter().filter(|f| !f.is_clean()).collect();
    if flagged.is_empty() {
        println!("{}", "✅ No scam indicators detected!".green().bold());
        println!("\n{} files scanned.", findings.len());
        return;
    }

    let count = |level| flagged.iter().filter(|f| f.threat_level() == Some(level)).count();
    println!(
        "⚠️  {} of {} files flagged:\n",
        flagged.len().to_string().bold(),
        findings.len()
    );
    for level in [ThreatLevel::Critical, ThreatLevel::High, ThreatLevel::Medium] {
        let n = count(level);
        if n > 0 {
            println!("   {} {}", level_badge(level), n);
        }
    }

    for finding in &flagged {
        if let Some(level) = finding.threat_level() {
            println!("\n{} {}", level_badge(level), finding.file.bright_white());
        }
        if let Some(result) = &finding.content {
            for m in &result.matches {
                println!(
                    "   • {}: {}",
                    crate::rules::split_camel(&m.category).cyan(),
                    m.matched_phrases.join(", ")
                );
            }
        }
        for link in &finding.links {
            if !link.check.suspicious && !verbose {
                continue;
            }
            print_link_check(&link.url, &link.check);
            if let Some(verdict) = &link.verdict {
                print_verdict(verdict);
            }
        }
    }

    let clean = findings.len() - flagged.len();
    if clean > 0 {
        println!("\n{}", thin_rule());
        println!("💡 {} clean files not shown.", clean);
    }
}

pub fn print_voice_report(analysis: &VoiceAnalysis) {
    println!("\n{}", rule());
    println!("{}", "CALL ANALYSIS".bold().white());
    println!("{}\n", rule());

    if let Some(action) = &analysis.immediate_action {
        println!("{}\n", format!("🚨 {}", action).red().bold());
    }
    println!(
        "   {}  confidence {}%",
        level_badge(analysis.threat_level),
        analysis.confidence
    );
    if let Some(scam_type) = analysis.scam_type {
        println!("   Type:    {}", format!("{:?}", scam_type).cyan());
    }
    if !analysis.detected_phrases.is_empty() {
        println!("   Phrases: {}", analysis.detected_phrases.join(", "));
    }
    if let Some(text) = &analysis.transcription {
        println!("   Heard:   {}", text.bright_black());
    }

    println!("\n{}", "What you should do:".bold());
    for rec in &analysis.recommendations {
        println!("   • {}", rec);
    }
}

pub fn print_reports(reports: &[ScamReport], total: usize) {
    println!("\n{}", "REPORTED SCAMS".bold().white());
    println!("{}", rule());
    if reports.is_empty() {
        println!("No reports stored.");
        return;
    }
    for report in reports {
        let kind = match &report.patterns {
            ReportEvidence::Content(r) => format!("content, score {}", r.score),
            ReportEvidence::Link(v) => format!("link, {}", v.threat_level),
        };
        println!(
            "{}  {}  {}",
            report.timestamp.format("%Y-%m-%d %H:%M").to_string().bright_black(),
            report.url.yellow(),
            kind
        );
    }
    println!("\nShowing {} of {} stored reports.", reports.len(), total);
}

/// Terminal rendering of the document surface: overlays are printed as boxes.
#[derive(Debug, Default)]
pub struct TerminalSurface {
    markers: HashSet<(NodeId, Marker)>,
    overlays: HashSet<WarningKind>,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DocumentSurface for TerminalSurface {
    fn has_marker(&self, node: NodeId, marker: Marker) -> bool {
        self.markers.contains(&(node, marker))
    }

    fn set_marker(&mut self, node: NodeId, marker: Marker) {
        self.markers.insert((node, marker));
    }

    fn highlight(&mut self, node: NodeId, style: HighlightStyle, note: &str) {
        println!("   [{} {:?}] {}", node.0, style, note.yellow());
    }

    fn add_badge(&mut self, node: NodeId, text: &str) {
        println!("   [{}] {}", node.0, text.red().bold());
    }

    fn set_page_badge(&mut self, text: &str) {
        println!("{} {}", "Page badge:".bold(), text.red().bold());
    }

    fn has_overlay(&self, kind: WarningKind) -> bool {
        self.overlays.contains(&kind)
    }

    fn inject_overlay(&mut self, overlay: &Overlay) {
        self.overlays.insert(overlay.kind);
        let title = match overlay.tone {
            Tone::Critical => overlay.title.red().bold(),
            Tone::High => overlay.title.yellow().bold(),
            Tone::Caution => overlay.title.bold(),
        };
        println!("\n{}", rule());
        println!("⚠️  {}", title);
        println!("{}", rule());
        println!("{}", overlay.summary);
        for finding in &overlay.findings {
            println!("   • {}", finding);
        }
        println!("\n{}", "What you should do:".bold());
        for advice in &overlay.advice {
            println!("   • {}", advice);
        }
        println!(
            "\n[{}]   [{}]",
            overlay.actions[0].bold(),
            overlay.actions[1].bright_black()
        );
    }

    fn remove_overlay(&mut self, kind: WarningKind) {
        self.overlays.remove(&kind);
    }

    fn navigate(&mut self, url: &str) {
        println!("{} {}", "→ Opening".green(), url);
    }
}
