//! The displayed document as the engine sees it.
//!
//! Both the warning presenter (overlays) and the change observer (highlights)
//! write here. Writers check for an existing marker first so nothing is
//! injected twice.

use crate::presenter::Overlay;
use crate::types::WarningKind;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    ScamChecked,
    ScamHighlighted,
    WarningBadge,
    SuspiciousLink,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightStyle {
    SuspiciousContent,
    ScamEmail,
    SuspiciousLink,
}

pub trait DocumentSurface {
    fn has_marker(&self, node: NodeId, marker: Marker) -> bool;
    fn set_marker(&mut self, node: NodeId, marker: Marker);
    fn highlight(&mut self, node: NodeId, style: HighlightStyle, note: &str);
    fn add_badge(&mut self, node: NodeId, text: &str);
    fn set_page_badge(&mut self, text: &str);

    fn has_overlay(&self, kind: WarningKind) -> bool;
    fn inject_overlay(&mut self, overlay: &Overlay);
    fn remove_overlay(&mut self, kind: WarningKind);

    fn navigate(&mut self, url: &str);
}

pub type SharedSurface = Rc<RefCell<dyn DocumentSurface>>;

#[derive(Debug, Clone, PartialEq)]
pub struct HighlightRecord {
    pub node: NodeId,
    pub style: HighlightStyle,
    pub note: String,
}

/// In-memory surface that records every write.
#[derive(Debug, Default)]
pub struct PageSurface {
    markers: HashSet<(NodeId, Marker)>,
    highlights: Vec<HighlightRecord>,
    badges: Vec<(NodeId, String)>,
    page_badge: Option<String>,
    overlays: HashMap<WarningKind, Overlay>,
    injected: usize,
    navigations: Vec<String>,
}

impl PageSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> Rc<RefCell<Self>> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn highlights(&self) -> &[HighlightRecord] {
        &self.highlights
    }

    pub fn badges(&self) -> &[(NodeId, String)] {
        &self.badges
    }

    pub fn page_badge(&self) -> Option<&str> {
        self.page_badge.as_deref()
    }

    pub fn overlay(&self, kind: WarningKind) -> Option<&Overlay> {
        self.overlays.get(&kind)
    }

    pub fn overlay_count(&self) -> usize {
        self.overlays.len()
    }

    /// Total overlays ever injected, including removed ones.
    pub fn injected_overlays(&self) -> usize {
        self.injected
    }

    pub fn navigations(&self) -> &[String] {
        &self.navigations
    }
}

impl DocumentSurface for PageSurface {
    fn has_marker(&self, node: NodeId, marker: Marker) -> bool {
        self.markers.contains(&(node, marker))
    }

    fn set_marker(&mut self, node: NodeId, marker: Marker) {
        self.markers.insert((node, marker));
    }

    fn highlight(&mut self, node: NodeId, style: HighlightStyle, note: &str) {
        self.highlights.push(HighlightRecord {
            node,
            style,
            note: note.to_string(),
        });
    }

    fn add_badge(&mut self, node: NodeId, text: &str) {
        self.badges.push((node, text.to_string()));
    }

    fn set_page_badge(&mut self, text: &str) {
        self.page_badge = Some(text.to_string());
    }

    fn has_overlay(&self, kind: WarningKind) -> bool {
        self.overlays.contains_key(&kind)
    }

    fn inject_overlay(&mut self, overlay: &Overlay) {
        self.injected += 1;
        self.overlays.insert(overlay.kind, overlay.clone());
    }

    fn remove_overlay(&mut self, kind: WarningKind) {
        self.overlays.remove(&kind);
    }

    fn navigate(&mut self, url: &str) {
        self.navigations.push(url.to_string());
    }
}
