mod common;

use common::{engine, remote, verdict, MockTransport};
use scamguard::observer::{ContentUnit, MutationHub, MutationRecord, SharedSource};
use scamguard::presenter::WarningState;
use scamguard::reports::{MemorySink, ReportEvidence};
use scamguard::session::{LinkDecision, PageSession, SessionController};
use scamguard::surface::{DocumentSurface, HighlightStyle, NodeId, PageSurface};
use scamguard::types::{ThreatLevel, WarningKind};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;
use std::time::Duration;

const PAGE: &str = "https://news.example.com/story";
const PRIZE_TEXT: &str = "Congratulations! You've won. Claim your prize now.";
const BAD_LINK: &str = "http://paypal-secure.ga/login";
const SAFE_SHORT_LINK: &str = "https://bit.ly/family-photos";

struct Fixture {
    surface: Rc<RefCell<PageSurface>>,
    sink: Arc<MemorySink>,
    remote: Arc<scamguard::RemoteLinkScanner<MockTransport>>,
    session: PageSession<MockTransport>,
}

fn fixture_at(url: &str, transport: MockTransport) -> Fixture {
    let surface = PageSurface::shared();
    let sink = Arc::new(MemorySink::default());
    let remote = Arc::new(remote(transport));
    let session = PageSession::start(
        engine(Arc::clone(&remote), Arc::clone(&sink)),
        url,
        surface.clone(),
    );
    Fixture {
        surface,
        sink,
        remote,
        session,
    }
}

fn fixture(transport: MockTransport) -> Fixture {
    fixture_at(PAGE, transport)
}

fn default_transport() -> MockTransport {
    MockTransport::new()
        .with(verdict(BAD_LINK, false, ThreatLevel::High))
        .with(verdict(SAFE_SHORT_LINK, true, ThreatLevel::Low))
        .delayed(Duration::from_millis(50))
}

#[test]
fn page_is_scanned_once_and_warned_once() {
    let f = fixture(default_transport());

    let result = f.session.on_page_load(PRIZE_TEXT).unwrap();
    assert_eq!(result.threat_level, ThreatLevel::High);
    assert!(f.session.on_page_load(PRIZE_TEXT).is_none());

    let surface = f.surface.borrow();
    assert_eq!(surface.injected_overlays(), 1);
    let overlay = surface.overlay(WarningKind::Content).unwrap();
    assert_eq!(overlay.title, "This page looks suspicious!");
    assert_eq!(overlay.summary, "We detected 3 scam indicators:");
}

#[test]
fn dismissed_warning_can_be_shown_again() {
    let f = fixture(default_transport());
    f.session.on_page_load(PRIZE_TEXT);

    // a second trigger while shown is a no-op
    assert!(f.session.on_email_opened(NodeId(7), PRIZE_TEXT).is_some());
    assert_eq!(f.surface.borrow().injected_overlays(), 1);

    assert!(f.session.dismiss(WarningKind::Content));
    assert_eq!(f.session.warning_state(WarningKind::Content), WarningState::Dismissed);
    assert!(!f.surface.borrow().has_overlay(WarningKind::Content));

    f.session.on_email_opened(NodeId(8), PRIZE_TEXT);
    let surface = f.surface.borrow();
    assert_eq!(surface.injected_overlays(), 2);
    assert_eq!(
        surface.overlay(WarningKind::Content).unwrap().title,
        "This email looks suspicious!"
    );
}

#[test]
fn reporting_sends_page_evidence() {
    let f = fixture(default_transport());
    f.session.on_page_load(PRIZE_TEXT);

    assert!(f.session.report(WarningKind::Content));
    assert_eq!(f.session.warning_state(WarningKind::Content), WarningState::Reported);
    assert!(!f.session.report(WarningKind::Content));

    let reports = f.sink.reports();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].url, PAGE);
    match &reports[0].patterns {
        ReportEvidence::Content(result) => assert_eq!(result.score, 3),
        other => panic!("unexpected evidence {other:?}"),
    }
}

#[test]
fn opened_email_container_is_highlighted_once() {
    let f = fixture_at("https://mail.google.com/mail/u/0/", default_transport());
    assert!(f.session.is_email_service());

    f.session.on_email_opened(NodeId(3), PRIZE_TEXT);
    f.session.on_email_opened(NodeId(3), PRIZE_TEXT);

    let surface = f.surface.borrow();
    let highlights: Vec<_> = surface.highlights().iter().filter(|h| h.node == NodeId(3)).collect();
    assert_eq!(highlights.len(), 1);
    assert_eq!(highlights[0].style, HighlightStyle::ScamEmail);
}

#[test]
fn inbox_rows_are_badged_at_two_indicators() {
    let f = fixture(default_transport());

    assert!(f.session.on_email_list_item(NodeId(1), "Final notice: account suspended"));
    assert!(!f.session.on_email_list_item(NodeId(1), "Final notice: account suspended"));
    assert!(!f.session.on_email_list_item(NodeId(2), "Your coupon expires today"));

    let surface = f.surface.borrow();
    assert_eq!(surface.badges().len(), 1);
    assert_eq!(surface.badges()[0].0, NodeId(1));
    // list rows never raise an overlay
    assert_eq!(surface.overlay_count(), 0);
}

#[test]
fn hover_marks_suspicious_links_once() {
    let f = fixture(default_transport());
    assert!(f.session.on_link_hover(NodeId(4), BAD_LINK));
    assert!(!f.session.on_link_hover(NodeId(4), BAD_LINK));
    assert!(!f.session.on_link_hover(NodeId(5), "https://www.paypal.com/"));
    assert_eq!(f.surface.borrow().highlights().len(), 1);
}

#[test]
fn lookalike_page_gets_badge() {
    let f = fixture_at("https://payp4l-account.net/login", default_transport());
    assert_eq!(f.surface.borrow().page_badge(), Some("!"));

    let clean = fixture(default_transport());
    assert_eq!(clean.surface.borrow().page_badge(), None);
}

#[tokio::test]
async fn ordinary_links_are_not_deferred() {
    let f = fixture(default_transport());
    assert_eq!(
        f.session.on_link_click("https://www.paypal.com/signin").await,
        LinkDecision::Allow
    );
    assert_eq!(f.remote.issued_requests(), 0);
}

#[tokio::test(start_paused = true)]
async fn safe_deep_scan_navigates_and_is_remembered() {
    let f = fixture(default_transport());

    let decision = f.session.on_link_click(SAFE_SHORT_LINK).await;
    assert_eq!(decision, LinkDecision::Navigate(SAFE_SHORT_LINK.to_string()));
    assert_eq!(f.surface.borrow().navigations(), [SAFE_SHORT_LINK.to_string()]);

    assert_eq!(f.session.on_link_click(SAFE_SHORT_LINK).await, LinkDecision::Allow);
    assert_eq!(f.remote.issued_requests(), 1);
}

#[tokio::test(start_paused = true)]
async fn dangerous_link_is_blocked_until_user_proceeds() {
    let f = fixture(default_transport());

    assert_eq!(f.session.on_link_click(BAD_LINK).await, LinkDecision::Blocked);
    {
        let surface = f.surface.borrow();
        let overlay = surface.overlay(WarningKind::Link).unwrap();
        assert_eq!(overlay.title, "DANGEROUS LINK BLOCKED!");
        assert_eq!(overlay.findings[0], "Threat Level: HIGH");
        assert!(surface.navigations().is_empty());
    }

    assert_eq!(f.session.proceed_anyway().as_deref(), Some(BAD_LINK));
    assert_eq!(f.session.warning_state(WarningKind::Link), WarningState::None);
    assert_eq!(f.surface.borrow().navigations(), [BAD_LINK.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn double_click_shows_one_link_warning() {
    let f = fixture(default_transport());

    let (a, b) = tokio::join!(
        f.session.on_link_click(BAD_LINK),
        f.session.on_link_click(BAD_LINK)
    );
    assert_eq!(a, LinkDecision::Blocked);
    assert_eq!(b, LinkDecision::Blocked);
    assert_eq!(f.remote.issued_requests(), 1);
    assert_eq!(f.surface.borrow().injected_overlays(), 1);
}

#[tokio::test(start_paused = true)]
async fn content_and_link_warnings_are_independent() {
    let f = fixture(default_transport());
    f.session.on_page_load(PRIZE_TEXT);
    f.session.on_link_click(BAD_LINK).await;

    assert_eq!(f.surface.borrow().overlay_count(), 2);
    assert!(f.session.report(WarningKind::Link));
    let reports = f.sink.reports();
    assert_eq!(reports[0].url, BAD_LINK);
    assert!(matches!(reports[0].patterns, ReportEvidence::Link(_)));
    assert_eq!(f.session.warning_state(WarningKind::Content), WarningState::Shown);
}

#[tokio::test(start_paused = true)]
async fn double_click_on_safe_link_navigates_once() {
    let f = fixture(default_transport());

    let (a, b) = tokio::join!(
        f.session.on_link_click(SAFE_SHORT_LINK),
        f.session.on_link_click(SAFE_SHORT_LINK)
    );
    assert_eq!(a, LinkDecision::Navigate(SAFE_SHORT_LINK.to_string()));
    assert_eq!(b, LinkDecision::Allow);
    assert_eq!(f.surface.borrow().navigations().len(), 1);
    assert_eq!(f.remote.issued_requests(), 1);
}

#[test]
fn injected_content_is_scanned_once_and_only_highlighted() {
    let f = fixture(default_transport());
    let hub = Rc::new(RefCell::new(MutationHub::new()));
    f.session.attach(hub.clone());

    let scam = "URGENT: verify your account within 24 hours or it will be closed";
    let batch = [MutationRecord {
        added: vec![
            ContentUnit::element(NodeId(10), scam),
            ContentUnit::element(NodeId(11), "Act now!"),
        ],
    }];
    hub.borrow_mut().dispatch(&batch);
    hub.borrow_mut().dispatch(&batch);

    let observer = f.session.observer();
    assert!(observer.is_processed(NodeId(10)));
    assert!(!observer.is_processed(NodeId(11)));
    let stats = observer.stats();
    assert_eq!(stats.scanned, 1);
    assert_eq!(stats.highlighted, 1);
    assert_eq!(stats.skipped_processed, 1);

    let surface = f.surface.borrow();
    assert_eq!(surface.highlights().len(), 1);
    assert_eq!(surface.highlights()[0].style, HighlightStyle::SuspiciousContent);
    assert_eq!(surface.overlay_count(), 0);
}

#[test]
fn navigation_tears_down_previous_page() {
    let sink = Arc::new(MemorySink::default());
    let remote = Arc::new(remote(default_transport()));
    let mut controller = SessionController::new(engine(remote, sink));

    let first_surface = PageSurface::shared();
    let hub = Rc::new(RefCell::new(MutationHub::new()));
    controller
        .navigate(PAGE, first_surface.clone(), Some(hub.clone() as SharedSource))
        .on_page_load(PRIZE_TEXT);
    assert_eq!(hub.borrow().subscriber_count(), 1);
    assert_eq!(first_surface.borrow().overlay_count(), 1);

    let second_surface = PageSurface::shared();
    let session = controller.navigate("https://other.example.org/", second_surface.clone(), None);
    assert_eq!(session.scanned_count(), 0);
    assert_eq!(session.warning_state(WarningKind::Content), WarningState::None);

    assert_eq!(hub.borrow().subscriber_count(), 0);
    assert_eq!(first_surface.borrow().overlay_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn outage_verdict_does_not_follow_into_the_next_page() {
    let transport = MockTransport::new()
        .with(verdict(BAD_LINK, false, ThreatLevel::Critical))
        .down_for(1);
    let remote = Arc::new(remote(transport));
    let sink = Arc::new(MemorySink::default());
    let mut controller = SessionController::new(engine(Arc::clone(&remote), sink));

    let first = controller.navigate("https://a.example/", PageSurface::shared(), None);
    assert_eq!(
        first.on_link_click(BAD_LINK).await,
        LinkDecision::Navigate(BAD_LINK.to_string())
    );

    let second_surface = PageSurface::shared();
    let second = controller.navigate("https://b.example/", second_surface.clone(), None);
    assert_eq!(second.on_link_click(BAD_LINK).await, LinkDecision::Blocked);
    assert_eq!(remote.issued_requests(), 2);
    assert!(second_surface.borrow().has_overlay(WarningKind::Link));
}

#[tokio::test(start_paused = true)]
async fn navigation_forgets_resolved_link_verdicts() {
    let remote = Arc::new(remote(default_transport()));
    let sink = Arc::new(MemorySink::default());
    let mut controller = SessionController::new(engine(Arc::clone(&remote), sink));

    let first = controller.navigate(PAGE, PageSurface::shared(), None);
    first.on_link_click(SAFE_SHORT_LINK).await;
    assert!(remote.cached(SAFE_SHORT_LINK).is_some());

    let second = controller.navigate("https://other.example.org/", PageSurface::shared(), None);
    assert!(remote.cached(SAFE_SHORT_LINK).is_none());
    assert_eq!(
        second.on_link_click(SAFE_SHORT_LINK).await,
        LinkDecision::Navigate(SAFE_SHORT_LINK.to_string())
    );
    assert_eq!(remote.issued_requests(), 2);
}
