use crate::scanner::{ContentScanner, ScanThresholds};
use crate::surface::{HighlightStyle, Marker, NodeId, SharedSurface};
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;
use tracing::{debug, info};

pub const HIGHLIGHT_NOTE: &str = "⚠️ Suspicious content detected";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    Text,
}

/// A newly added node and its rendered text.
#[derive(Debug, Clone)]
pub struct ContentUnit {
    pub node: NodeId,
    pub kind: NodeKind,
    pub text: String,
}

impl ContentUnit {
    pub fn element(node: NodeId, text: impl Into<String>) -> Self {
        Self {
            node,
            kind: NodeKind::Element,
            text: text.into(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MutationRecord {
    pub added: Vec<ContentUnit>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

pub type MutationCallback = Box<dyn FnMut(&[MutationRecord])>;

/// Anything that can notify about structural content changes.
pub trait MutationSource {
    fn register(&mut self, callback: MutationCallback) -> SubscriptionId;
    fn unregister(&mut self, id: SubscriptionId);
}

pub type SharedSource = Rc<RefCell<dyn MutationSource>>;

/// Fan-out of mutation batches to registered callbacks.
#[derive(Default)]
pub struct MutationHub {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, MutationCallback)>,
}

impl MutationHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatch(&mut self, records: &[MutationRecord]) {
        for (_, callback) in self.subscribers.iter_mut() {
            callback(records);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

impl MutationSource for MutationHub {
    fn register(&mut self, callback: MutationCallback) -> SubscriptionId {
        self.next_id += 1;
        let id = SubscriptionId(self.next_id);
        self.subscribers.push((id, callback));
        id
    }

    fn unregister(&mut self, id: SubscriptionId) {
        self.subscribers.retain(|(sid, _)| *sid != id);
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObserverStats {
    pub scanned: usize,
    pub highlighted: usize,
    pub skipped_processed: usize,
}

struct ObserverCore {
    scanner: Arc<ContentScanner>,
    thresholds: ScanThresholds,
    surface: SharedSurface,
    processed: RefCell<HashSet<NodeId>>,
    stats: Cell<ObserverStats>,
}

impl ObserverCore {
    fn handle(&self, records: &[MutationRecord]) -> Vec<NodeId> {
        let mut highlighted = Vec::new();
        let mut stats = self.stats.get();

        for unit in records.iter().flat_map(|r| r.added.iter()) {
            if unit.kind != NodeKind::Element
                || !self.thresholds.is_incremental_candidate(&unit.text)
            {
                continue;
            }
            if !self.processed.borrow_mut().insert(unit.node) {
                stats.skipped_processed += 1;
                continue;
            }

            stats.scanned += 1;
            let Some(result) = self.scanner.scan(&unit.text) else {
                continue;
            };
            if !self.thresholds.warrants_highlight(&result) {
                continue;
            }

            let mut surface = self.surface.borrow_mut();
            if surface.has_marker(unit.node, Marker::ScamHighlighted) {
                continue;
            }
            surface.highlight(unit.node, HighlightStyle::SuspiciousContent, HIGHLIGHT_NOTE);
            surface.set_marker(unit.node, Marker::ScamHighlighted);
            stats.highlighted += 1;
            highlighted.push(unit.node);
            info!(node = unit.node.0, score = result.score, "Highlighted injected content");
        }

        self.stats.set(stats);
        highlighted
    }
}

/// Scans content added after page load. Each node is scanned at most once
/// and only ever gets a passive highlight, never an overlay.
pub struct ChangeObserver {
    core: Rc<ObserverCore>,
    subscription: Option<(SharedSource, SubscriptionId)>,
}

impl ChangeObserver {
    pub fn new(
        scanner: Arc<ContentScanner>,
        thresholds: ScanThresholds,
        surface: SharedSurface,
    ) -> Self {
        Self {
            core: Rc::new(ObserverCore {
                scanner,
                thresholds,
                surface,
                processed: RefCell::new(HashSet::new()),
                stats: Cell::new(ObserverStats::default()),
            }),
            subscription: None,
        }
    }

    pub fn attach(&mut self, source: SharedSource) {
        self.detach();
        let core = Rc::clone(&self.core);
        let id = source.borrow_mut().register(Box::new(move |records| {
            core.handle(records);
        }));
        debug!(subscription = id.0, "Change observer attached");
        self.subscription = Some((source, id));
    }

    pub fn detach(&mut self) {
        if let Some((source, id)) = self.subscription.take() {
            source.borrow_mut().unregister(id);
            debug!(subscription = id.0, "Change observer detached");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Processes one batch directly; returns the nodes that were highlighted.
    pub fn handle_batch(&self, records: &[MutationRecord]) -> Vec<NodeId> {
        self.core.handle(records)
    }

    pub fn is_processed(&self, node: NodeId) -> bool {
        self.core.processed.borrow().contains(&node)
    }

    pub fn stats(&self) -> ObserverStats {
        self.core.stats.get()
    }
}

impl Drop for ChangeObserver {
    fn drop(&mut self) {
        self.detach();
    }
}
