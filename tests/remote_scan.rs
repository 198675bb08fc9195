mod common;

use common::{remote, verdict, MockTransport};
use scamguard::remote::{FailurePolicy, HttpTransport, RemoteLinkScanner};
use scamguard::ThreatLevel;
use std::time::Duration;

const URL: &str = "http://paypal-secure.ga/login";

#[tokio::test(start_paused = true)]
async fn concurrent_requests_share_one_flight() {
    let scanner = remote(
        MockTransport::new()
            .with(verdict(URL, false, ThreatLevel::High))
            .delayed(Duration::from_millis(300)),
    );

    let (a, b, c) = tokio::join!(
        scanner.scan_link(URL),
        scanner.scan_link(URL),
        scanner.scan_link(URL)
    );
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert!(!a.is_safe);
    assert_eq!(scanner.issued_requests(), 1);

    // resolved verdicts are served from cache
    let again = scanner.scan_link(URL).await;
    assert_eq!(again, a);
    assert_eq!(scanner.issued_requests(), 1);
    assert_eq!(scanner.cached(URL), Some(a));
}

#[tokio::test(start_paused = true)]
async fn hung_service_falls_back_after_timeout() {
    let scanner = remote(MockTransport::new().hanging());
    let started = tokio::time::Instant::now();

    let v = scanner.scan_link(URL).await;

    assert!(v.is_safe);
    assert_eq!(v.threat_level, ThreatLevel::Unknown);
    let waited = started.elapsed();
    assert!(waited >= Duration::from_secs(5) && waited < Duration::from_secs(6));
}

#[tokio::test]
async fn service_error_fails_open() {
    let scanner = remote(MockTransport::new());
    let v = scanner.scan_link("http://unknown.tk").await;
    assert!(v.is_safe);
    assert_eq!(v.threat_level, ThreatLevel::Unknown);
    assert_eq!(v.url, "http://unknown.tk");
}

#[tokio::test]
async fn closed_policy_blocks_unverified_links() {
    let scanner = RemoteLinkScanner::new(
        MockTransport::new(),
        Duration::from_secs(5),
        FailurePolicy::Closed,
    );
    let v = scanner.scan_link("http://unknown.tk").await;
    assert!(!v.is_safe);
    assert_eq!(v.threats, vec!["Link could not be verified"]);
}

#[tokio::test]
async fn clearing_cache_forces_a_new_request() {
    let scanner = remote(MockTransport::new().with(verdict(URL, true, ThreatLevel::Low)));
    scanner.scan_link(URL).await;
    scanner.clear_cache();
    assert!(scanner.cached(URL).is_none());
    scanner.scan_link(URL).await;
    assert_eq!(scanner.issued_requests(), 2);
}

#[tokio::test]
async fn unreachable_http_service_fails_open() {
    let transport =
        HttpTransport::new("http://127.0.0.1:1/api/scan-link", Duration::from_secs(2)).unwrap();
    let scanner = RemoteLinkScanner::new(transport, Duration::from_secs(2), FailurePolicy::Open);

    let v = scanner.scan_link(URL).await;
    assert!(v.is_safe);
    assert_eq!(v.threat_level, ThreatLevel::Unknown);
}

#[tokio::test]
async fn fallback_verdicts_are_not_cached() {
    let scanner = remote(
        MockTransport::new()
            .with(verdict(URL, false, ThreatLevel::Critical))
            .down_for(1),
    );

    let during_outage = scanner.scan_link(URL).await;
    assert!(during_outage.is_safe);
    assert!(scanner.cached(URL).is_none());

    let recovered = scanner.scan_link(URL).await;
    assert!(!recovered.is_safe);
    assert_eq!(recovered.threat_level, ThreatLevel::Critical);
    assert_eq!(scanner.issued_requests(), 2);
    assert_eq!(scanner.cached(URL), Some(recovered));
}

#[tokio::test(start_paused = true)]
async fn waiters_on_a_failed_flight_share_the_fallback() {
    let scanner = remote(
        MockTransport::new()
            .with(verdict(URL, false, ThreatLevel::High))
            .delayed(Duration::from_millis(200))
            .down_for(1),
    );

    let (a, b) = tokio::join!(scanner.scan_link(URL), scanner.scan_link(URL));
    assert!(a.is_safe && b.is_safe);
    assert_eq!(scanner.issued_requests(), 1);
    assert!(scanner.cached(URL).is_none());
}
