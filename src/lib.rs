//! Scam and phishing detection for displayed content.
//!
//! A [`session::PageSession`] ties the pieces together for one page: the
//! [`scanner::ContentScanner`] scores text, the [`link::LinkRiskClassifier`]
//! decides which clicks to defer, the [`remote::RemoteLinkScanner`] asks the
//! link-scan service, and the [`presenter::WarningPresenter`] puts up at most
//! one overlay per kind.

pub mod audit;
pub mod config;
pub mod error;
pub mod link;
pub mod observer;
pub mod presenter;
pub mod remote;
pub mod report;
pub mod reports;
pub mod rules;
pub mod scanner;
pub mod session;
pub mod surface;
pub mod types;
pub mod verdict;
pub mod voice;

pub use error::ScanError;
pub use link::{LinkCheck, LinkRiskClassifier};
pub use remote::{FailurePolicy, LinkScanTransport, RemoteLinkScanner};
pub use scanner::{ContentScanner, ScanThresholds};
pub use session::{LinkDecision, PageSession, SessionController};
pub use types::{LinkRiskVerdict, ScanResult, ThreatLevel};
