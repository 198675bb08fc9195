use crate::rules::PatternCatalog;
use crate::types::{CategoryMatch, ScanResult, ThreatLevel};
use aho_corasick::{AhoCorasick, AhoCorasickBuilder, BuildError, MatchKind};
use serde::Deserialize;
use std::collections::HashMap;

/// Score bars for the two invocation policies. Newly injected content is
/// noisier, so it has to clear a higher bar and never interrupts the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScanThresholds {
    pub page_overlay_min_score: usize,
    pub incremental_highlight_min_score: usize,
    /// Incremental blocks must be strictly longer than this many chars.
    pub incremental_min_chars: usize,
    pub email_badge_min_score: usize,
}

impl Default for ScanThresholds {
    fn default() -> Self {
        Self {
            page_overlay_min_score: 1,
            incremental_highlight_min_score: 3,
            incremental_min_chars: 50,
            email_badge_min_score: 2,
        }
    }
}

impl ScanThresholds {
    pub fn warrants_overlay(&self, result: &ScanResult) -> bool {
        result.score >= self.page_overlay_min_score
    }

    pub fn warrants_highlight(&self, result: &ScanResult) -> bool {
        result.score >= self.incremental_highlight_min_score
    }

    pub fn warrants_badge(&self, result: &ScanResult) -> bool {
        result.score >= self.email_badge_min_score
    }

    pub fn is_incremental_candidate(&self, text: &str) -> bool {
        text.chars().count() > self.incremental_min_chars
    }
}

/// Scores text against a [`PatternCatalog`].
///
/// All phrases are compiled into one automaton and searched with overlapping
/// semantics, so a phrase nested inside another ("gift card" in "free gift
/// card") still counts, the same as an independent substring test per phrase.
pub struct ContentScanner {
    catalog: PatternCatalog,
    automaton: AhoCorasick,
    // unique phrase id -> every (category, phrase) slot it belongs to
    owners: Vec<Vec<(usize, usize)>>,
}

impl ContentScanner {
    pub fn new(catalog: PatternCatalog) -> Result<Self, BuildError> {
        let mut unique: Vec<&str> = Vec::new();
        let mut index: HashMap<&str, usize> = HashMap::new();
        let mut owners: Vec<Vec<(usize, usize)>> = Vec::new();

        for (ci, cat) in catalog.categories().iter().enumerate() {
            for (pi, phrase) in cat.phrases.iter().enumerate() {
                let id = *index.entry(phrase.as_str()).or_insert_with(|| {
                    unique.push(phrase.as_str());
                    owners.push(Vec::new());
                    unique.len() - 1
                });
                owners[id].push((ci, pi));
            }
        }

        let automaton = AhoCorasickBuilder::new()
            .match_kind(MatchKind::Standard)
            .build(&unique)?;

        Ok(Self {
            catalog,
            automaton,
            owners,
        })
    }

    pub fn builtin() -> Result<Self, BuildError> {
        Self::new(PatternCatalog::builtin())
    }

    pub fn catalog(&self) -> &PatternCatalog {
        &self.catalog
    }

    /// Returns `None` when no phrase matches. Repeated occurrences of the
    /// same phrase count once.
    pub fn scan(&self, text: &str) -> Option<ScanResult> {
        let lower = text.to_lowercase();
        let categories = self.catalog.categories();

        let mut hit: Vec<Vec<bool>> = categories
            .iter()
            .map(|c| vec![false; c.phrases.len()])
            .collect();

        for m in self.automaton.find_overlapping_iter(&lower) {
            for &(ci, pi) in &self.owners[m.pattern().as_usize()] {
                hit[ci][pi] = true;
            }
        }

        let mut matches = Vec::new();
        let mut score = 0;
        for (ci, cat) in categories.iter().enumerate() {
            let matched_phrases: Vec<String> = cat
                .phrases
                .iter()
                .zip(&hit[ci])
                .filter(|(_, seen)| **seen)
                .map(|(p, _)| p.clone())
                .collect();
            if matched_phrases.is_empty() {
                continue;
            }
            score += matched_phrases.len();
            matches.push(CategoryMatch {
                category: cat.name.clone(),
                count: matched_phrases.len(),
                matched_phrases,
            });
        }

        let threat_level = ThreatLevel::from_score(score)?;
        Some(ScanResult {
            score,
            threat_level,
            matches,
        })
    }
}
