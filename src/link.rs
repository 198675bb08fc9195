use crate::rules::{
    EMAIL_SERVICES, LOOKALIKE_BRANDS, LOW_TRUST_TLDS, MAX_HOST_LABELS, PROTECTED_BRANDS,
    URL_SHORTENERS,
};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;
use url::{Host, Url};

/// Links extracted from a single message are capped at this many.
pub const MAX_URLS_PER_MESSAGE: usize = 10;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LinkCheck {
    pub suspicious: bool,
    pub domain: String,
    pub reasons: Vec<String>,
}

/// Cheap, local URL heuristics that decide whether a link deserves a deep scan.
///
/// Malformed input is never an error: anything that does not parse as a URL
/// with a host is reported as not suspicious.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinkRiskClassifier;

impl LinkRiskClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Stops at the first matching heuristic.
    pub fn classify(&self, url: &str) -> LinkCheck {
        self.evaluate(url, false)
    }

    /// Runs every heuristic and reports all reasons.
    pub fn diagnose(&self, url: &str) -> LinkCheck {
        self.evaluate(url, true)
    }

    fn evaluate(&self, url: &str, collect_all: bool) -> LinkCheck {
        let Ok(parsed) = Url::parse(url.trim()) else {
            return LinkCheck::default();
        };
        let Some(host) = parsed.host() else {
            return LinkCheck::default();
        };
        let is_ipv4 = matches!(host, Host::Ipv4(_));
        let host = host.to_string().to_ascii_lowercase();

        let mut check = LinkCheck {
            suspicious: false,
            domain: host.clone(),
            reasons: Vec::new(),
        };

        let heuristics: [&dyn Fn(&str) -> Option<String>; 5] = [
            &|_: &str| is_ipv4.then(|| "IP address used instead of a domain name".to_string()),
            &low_trust_tld,
            &shortener,
            &excessive_subdomains,
            &brand_impersonation,
        ];

        for heuristic in heuristics {
            if let Some(reason) = heuristic(&host) {
                check.suspicious = true;
                check.reasons.push(reason);
                if !collect_all {
                    break;
                }
            }
        }

        check
    }

    /// Homoglyph spelling of a well-known brand in the page's own hostname.
    pub fn lookalike_brand(&self, url: &str) -> Option<&'static str> {
        let parsed = Url::parse(url.trim()).ok()?;
        let host = parsed.host_str()?.to_ascii_lowercase();
        lookalike_patterns()
            .iter()
            .find(|(brand, re)| re.is_match(&host) && !is_genuine_brand_host(&host, brand))
            .map(|(brand, _)| *brand)
    }
}

fn low_trust_tld(host: &str) -> Option<String> {
    LOW_TRUST_TLDS
        .iter()
        .find(|tld| host.ends_with(*tld))
        .map(|tld| format!("Low-trust top-level domain ({})", tld))
}

fn shortener(host: &str) -> Option<String> {
    URL_SHORTENERS
        .iter()
        .find(|sh| host == **sh || host.ends_with(&format!(".{}", sh)))
        .map(|sh| format!("URL shortener hides the destination ({})", sh))
}

fn excessive_subdomains(host: &str) -> Option<String> {
    let labels = host.split('.').count();
    (labels > MAX_HOST_LABELS).then(|| format!("Excessive subdomains ({} labels)", labels))
}

fn brand_impersonation(host: &str) -> Option<String> {
    PROTECTED_BRANDS
        .iter()
        .find(|brand| host.contains(*brand) && !host.ends_with(&format!("{}.com", brand)))
        .map(|brand| format!("Possible {} impersonation", brand))
}

fn is_genuine_brand_host(host: &str, brand: &str) -> bool {
    let apex = format!("{}.com", brand);
    host == apex || host.ends_with(&format!(".{}", apex))
}

fn lookalike_patterns() -> &'static [(&'static str, Regex)] {
    static PATTERNS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        LOOKALIKE_BRANDS
            .iter()
            .filter_map(|(brand, pattern)| Regex::new(pattern).ok().map(|re| (*brand, re)))
            .collect()
    })
}

fn url_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r#"https?://[^\s<>"'()\[\]]+"#).ok())
        .as_ref()
}

/// Pulls http(s) links out of free text, first [`MAX_URLS_PER_MESSAGE`] only.
pub fn extract_urls(text: &str) -> Vec<String> {
    let Some(re) = url_pattern() else {
        return Vec::new();
    };
    let mut urls: Vec<String> = Vec::new();
    for m in re.find_iter(text) {
        let url = m.as_str().trim_end_matches(&['.', ',', ';', ':', '!', '?'][..]);
        if !urls.iter().any(|u| u == url) {
            urls.push(url.to_string());
        }
        if urls.len() == MAX_URLS_PER_MESSAGE {
            break;
        }
    }
    urls
}

pub fn is_email_service(url: &str) -> bool {
    EMAIL_SERVICES.iter().any(|svc| url.contains(svc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shortener_requires_domain_boundary() {
        let c = LinkRiskClassifier::new();
        assert!(c.classify("https://bit.ly/3xyz").suspicious);
        assert!(c.classify("https://www.bit.ly/3xyz").suspicious);
        // substring "t.co" must not flag an unrelated host
        assert!(!c.classify("https://reddit.com/r/rust").suspicious);
    }

    #[test]
    fn lookalike_ignores_genuine_domains() {
        let c = LinkRiskClassifier::new();
        assert_eq!(c.lookalike_brand("https://www.paypal.com/"), None);
        assert_eq!(c.lookalike_brand("https://payp4l-support.net/"), Some("paypal"));
        assert_eq!(c.lookalike_brand("http://g00gle.co/login"), Some("google"));
        assert_eq!(c.lookalike_brand("not a url"), None);
    }

    #[test]
    fn extracts_unique_links_without_trailing_punctuation() {
        let text = "Go to https://bit.ly/abc. Or http://x.tk/path, again https://bit.ly/abc";
        assert_eq!(extract_urls(text), vec!["https://bit.ly/abc", "http://x.tk/path"]);
    }

    #[test]
    fn extraction_is_capped() {
        let text: String = (0..20).map(|i| format!("http://h{}.example/ ", i)).collect();
        assert_eq!(extract_urls(&text).len(), MAX_URLS_PER_MESSAGE);
    }
}
