use crate::link::{extract_urls, LinkCheck, LinkRiskClassifier};
use crate::remote::{LinkScanTransport, RemoteLinkScanner};
use crate::scanner::ContentScanner;
use crate::types::{LinkRiskVerdict, ScanResult, ThreatLevel};
use regex::Regex;
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Saved pages, emails and plain text.
pub const SCANNED_EXTENSIONS: &[&str] = &["txt", "eml", "html", "htm", "md"];

#[derive(Debug, Clone, Serialize)]
pub struct LinkFinding {
    pub url: String,
    pub check: LinkCheck,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verdict: Option<LinkRiskVerdict>,
}

impl LinkFinding {
    /// A deep verdict, when present, overrides the local heuristics.
    pub fn threat_level(&self) -> Option<ThreatLevel> {
        match &self.verdict {
            Some(v) if !v.is_safe => Some(v.threat_level),
            Some(_) => None,
            None => self.check.suspicious.then_some(ThreatLevel::Medium),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileFinding {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<ScanResult>,
    pub links: Vec<LinkFinding>,
}

impl FileFinding {
    pub fn threat_level(&self) -> Option<ThreatLevel> {
        let content = self.content.as_ref().map(|r| r.threat_level);
        self.links
            .iter()
            .filter_map(LinkFinding::threat_level)
            .chain(content)
            .max()
    }

    pub fn is_clean(&self) -> bool {
        self.threat_level().is_none()
    }
}

fn tag_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?s)<[^>]*>").ok()).as_ref()
}

/// Rendered text of an HTML document, roughly: tags become spaces.
pub fn visible_text(html: &str) -> String {
    match tag_pattern() {
        Some(re) => re.replace_all(html, " ").into_owned(),
        None => html.to_string(),
    }
}

/// Content scan plus local classification of every extracted link.
pub fn scan_text(
    scanner: &ContentScanner,
    classifier: &LinkRiskClassifier,
    label: &str,
    text: &str,
    is_html: bool,
) -> FileFinding {
    let content = if is_html {
        scanner.scan(&visible_text(text))
    } else {
        scanner.scan(text)
    };
    let links = extract_urls(text)
        .into_iter()
        .map(|url| LinkFinding {
            check: classifier.classify(&url),
            url,
            verdict: None,
        })
        .collect();

    FileFinding {
        file: label.to_string(),
        content,
        links,
    }
}

/// Walks `path` (a file or directory) and scans every supported file.
/// Unreadable files are skipped with a warning.
pub fn scan_directory(
    path: &Path,
    scanner: &ContentScanner,
    classifier: &LinkRiskClassifier,
) -> Vec<FileFinding> {
    let files: Vec<_> = WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map_or(false, |ext| SCANNED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        })
        .collect();

    info!(path = %path.display(), files = files.len(), "Scanning saved content");

    let mut findings = Vec::new();
    for entry in files {
        let label = entry
            .path()
            .strip_prefix(path)
            .ok()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(entry.path())
            .display()
            .to_string();

        let bytes = match fs::read(entry.path()) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(file = %label, error = %err, "Skipping unreadable file");
                continue;
            }
        };
        let text = String::from_utf8_lossy(&bytes);
        let is_html = entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map_or(false, |ext| ext.eq_ignore_ascii_case("html") || ext.eq_ignore_ascii_case("htm"));

        let finding = scan_text(scanner, classifier, &label, &text, is_html);
        debug!(file = %label, level = ?finding.threat_level(), "Scanned file");
        findings.push(finding);
    }
    findings
}

/// Deep-scans every locally suspicious link. Repeated URLs share one request.
pub async fn deep_scan<T: LinkScanTransport>(
    findings: &mut [FileFinding],
    remote: &RemoteLinkScanner<T>,
) {
    for link in findings
        .iter_mut()
        .flat_map(|f| f.links.iter_mut())
        .filter(|l| l.check.suspicious)
    {
        link.verdict = Some(remote.scan_link(&link.url).await);
    }
}
