//! Per-page protection state and the navigation controller that owns it.

use crate::link::{is_email_service, LinkRiskClassifier};
use crate::observer::{ChangeObserver, SharedSource};
use crate::presenter::{WarningPresenter, WarningState};
use crate::remote::{LinkScanTransport, RemoteLinkScanner};
use crate::reports::ReportSink;
use crate::scanner::{ContentScanner, ScanThresholds};
use crate::surface::{HighlightStyle, Marker, NodeId, SharedSurface};
use crate::types::{ContentKind, ScanResult, WarningKind};
use std::cell::RefCell;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const LOOKALIKE_BADGE: &str = "!";
pub const LIST_ITEM_BADGE: &str = "⚠️ SUSPICIOUS";
pub const EMAIL_NOTE: &str = "⚠️ This email contains scam indicators";
pub const LINK_HOVER_NOTE: &str = "⚠️ Suspicious link - Click will be scanned first";

/// Keys (page keys and link URLs) already analyzed in this session.
#[derive(Debug, Default)]
pub struct ScannedSet {
    keys: HashSet<String>,
}

impl ScannedSet {
    /// Returns `false` if the key was already present.
    pub fn mark(&mut self, key: &str) -> bool {
        self.keys.insert(key.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkDecision {
    /// Let the host follow the link as it normally would.
    Allow,
    /// The click was deferred, the link came back safe and navigation was performed.
    Navigate(String),
    /// The link warning is showing; nothing was navigated.
    Blocked,
}

/// Shared, page-independent pieces every session is built from.
pub struct Engine<T> {
    pub scanner: Arc<ContentScanner>,
    pub classifier: LinkRiskClassifier,
    pub remote: Arc<RemoteLinkScanner<T>>,
    pub reports: Arc<dyn ReportSink>,
    pub thresholds: ScanThresholds,
}

impl<T> Clone for Engine<T> {
    fn clone(&self) -> Self {
        Self {
            scanner: Arc::clone(&self.scanner),
            classifier: self.classifier,
            remote: Arc::clone(&self.remote),
            reports: Arc::clone(&self.reports),
            thresholds: self.thresholds,
        }
    }
}

/// Everything the engine knows about one displayed page. Dropped on navigation.
pub struct PageSession<T> {
    url: String,
    engine: Engine<T>,
    surface: SharedSurface,
    scanned: RefCell<ScannedSet>,
    presenter: RefCell<WarningPresenter>,
    observer: RefCell<ChangeObserver>,
}

impl<T: LinkScanTransport> PageSession<T> {
    pub fn start(engine: Engine<T>, url: &str, surface: SharedSurface) -> Self {
        let presenter = WarningPresenter::new(url, Arc::clone(&engine.reports));
        let observer = ChangeObserver::new(
            Arc::clone(&engine.scanner),
            engine.thresholds,
            SharedSurface::clone(&surface),
        );

        if let Some(brand) = engine.classifier.lookalike_brand(url) {
            warn!(url = %url, brand, "Page hostname imitates a known brand");
            surface.borrow_mut().set_page_badge(LOOKALIKE_BADGE);
        }
        debug!(url = %url, "Page session started");

        Self {
            url: url.to_string(),
            engine,
            surface,
            scanned: RefCell::new(ScannedSet::default()),
            presenter: RefCell::new(presenter),
            observer: RefCell::new(observer),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn is_email_service(&self) -> bool {
        is_email_service(&self.url)
    }

    pub fn attach(&self, source: SharedSource) {
        self.observer.borrow_mut().attach(source);
    }

    pub fn observer(&self) -> std::cell::Ref<'_, ChangeObserver> {
        self.observer.borrow()
    }

    /// Full-page scan, at most once per page.
    pub fn on_page_load(&self, text: &str) -> Option<ScanResult> {
        let key = format!("page:{}", self.url);
        if !self.scanned.borrow_mut().mark(&key) {
            debug!(url = %self.url, "Page already scanned");
            return None;
        }

        let result = self.engine.scanner.scan(text)?;
        info!(
            url = %self.url,
            score = result.score,
            threat_level = %result.threat_level,
            "Page scan found scam indicators"
        );
        if self.engine.thresholds.warrants_overlay(&result) {
            let mut surface = self.surface.borrow_mut();
            self.presenter
                .borrow_mut()
                .show_content_warning(&mut *surface, ContentKind::Page, &result);
        }
        Some(result)
    }

    /// Scans the body of an opened email and marks its container.
    pub fn on_email_opened(&self, container: NodeId, text: &str) -> Option<ScanResult> {
        let key = format!("email:{}", container.0);
        if !self.scanned.borrow_mut().mark(&key) {
            return None;
        }

        let result = self.engine.scanner.scan(text)?;
        info!(url = %self.url, score = result.score, "Email scan found scam indicators");
        if self.engine.thresholds.warrants_overlay(&result) {
            let mut surface = self.surface.borrow_mut();
            self.presenter
                .borrow_mut()
                .show_content_warning(&mut *surface, ContentKind::Email, &result);
            if !surface.has_marker(container, Marker::ScamHighlighted) {
                surface.highlight(container, HighlightStyle::ScamEmail, EMAIL_NOTE);
                surface.set_marker(container, Marker::ScamHighlighted);
            }
        }
        Some(result)
    }

    /// One-time check of an inbox row. Returns whether a badge was added.
    pub fn on_email_list_item(&self, node: NodeId, text: &str) -> bool {
        let mut surface = self.surface.borrow_mut();
        if surface.has_marker(node, Marker::ScamChecked) {
            return false;
        }
        surface.set_marker(node, Marker::ScamChecked);

        let Some(result) = self.engine.scanner.scan(text) else {
            return false;
        };
        if !self.engine.thresholds.warrants_badge(&result)
            || surface.has_marker(node, Marker::WarningBadge)
        {
            return false;
        }
        surface.add_badge(node, LIST_ITEM_BADGE);
        surface.set_marker(node, Marker::WarningBadge);
        debug!(node = node.0, score = result.score, "Badged suspicious list item");
        true
    }

    /// Returns whether a hover indicator was added.
    pub fn on_link_hover(&self, node: NodeId, url: &str) -> bool {
        if !self.engine.classifier.classify(url).suspicious {
            return false;
        }
        let mut surface = self.surface.borrow_mut();
        if surface.has_marker(node, Marker::SuspiciousLink) {
            return false;
        }
        surface.highlight(node, HighlightStyle::SuspiciousLink, LINK_HOVER_NOTE);
        surface.set_marker(node, Marker::SuspiciousLink);
        true
    }

    /// Decides what happens to a link click. Only suspicious, not yet scanned
    /// links are deferred for a deep scan; no borrow is held across the await.
    pub async fn on_link_click(&self, url: &str) -> LinkDecision {
        if self.scanned.borrow().contains(url) {
            return LinkDecision::Allow;
        }
        let check = self.engine.classifier.classify(url);
        if !check.suspicious {
            return LinkDecision::Allow;
        }

        info!(url = %url, reasons = ?check.reasons, "Deferring navigation for deep scan");
        let verdict = self.engine.remote.scan_link(url).await;
        let first = self.scanned.borrow_mut().mark(url);

        let mut surface = self.surface.borrow_mut();
        if verdict.is_safe {
            if !first {
                // another click on the same link already navigated
                return LinkDecision::Allow;
            }
            surface.navigate(url);
            LinkDecision::Navigate(url.to_string())
        } else {
            self.presenter
                .borrow_mut()
                .show_link_warning(&mut *surface, url, &verdict);
            LinkDecision::Blocked
        }
    }

    pub fn dismiss(&self, kind: WarningKind) -> bool {
        let mut surface = self.surface.borrow_mut();
        self.presenter.borrow_mut().dismiss(&mut *surface, kind)
    }

    pub fn report(&self, kind: WarningKind) -> bool {
        let mut surface = self.surface.borrow_mut();
        self.presenter.borrow_mut().report(&mut *surface, kind)
    }

    /// Follows the blocked link anyway. Returns the URL navigated to.
    pub fn proceed_anyway(&self) -> Option<String> {
        let mut surface = self.surface.borrow_mut();
        let url = self.presenter.borrow_mut().proceed_anyway(&mut *surface)?;
        surface.navigate(&url);
        Some(url)
    }

    pub fn warning_state(&self, kind: WarningKind) -> WarningState {
        self.presenter.borrow().state(kind)
    }

    pub fn scanned_count(&self) -> usize {
        self.scanned.borrow().len()
    }

    fn teardown(self) {
        self.observer.borrow_mut().detach();
        let mut surface = self.surface.borrow_mut();
        self.presenter.borrow_mut().reset(&mut *surface);
        debug!(url = %self.url, "Page session torn down");
    }
}

/// Owns the session for the currently displayed page.
pub struct SessionController<T> {
    engine: Engine<T>,
    current: Option<PageSession<T>>,
}

impl<T: LinkScanTransport> SessionController<T> {
    pub fn new(engine: Engine<T>) -> Self {
        Self {
            engine,
            current: None,
        }
    }

    /// Ends the previous page's session and starts a fresh one.
    pub fn navigate(
        &mut self,
        url: &str,
        surface: SharedSurface,
        source: Option<SharedSource>,
    ) -> &PageSession<T> {
        self.end();
        let session = PageSession::start(self.engine.clone(), url, surface);
        if let Some(source) = source {
            session.attach(source);
        }
        self.current.insert(session)
    }

    pub fn current(&self) -> Option<&PageSession<T>> {
        self.current.as_ref()
    }

    /// Tears down the current session and forgets resolved link verdicts.
    pub fn end(&mut self) {
        if let Some(previous) = self.current.take() {
            previous.teardown();
        }
        self.engine.remote.clear_cache();
    }
}
