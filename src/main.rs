mod cli;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use cli::{Args, Command};
use colored::*;
use scamguard::audit;
use scamguard::config::Config;
use scamguard::link::{LinkCheck, LinkRiskClassifier};
use scamguard::presenter::WarningPresenter;
use scamguard::remote::HttpLinkScanner;
use scamguard::report::{self, TerminalSurface};
use scamguard::reports::{ReportSink, ReportStore};
use scamguard::scanner::ContentScanner;
use scamguard::session::{Engine, PageSession};
use scamguard::surface::{NodeId, SharedSurface};
use scamguard::types::{LinkRiskVerdict, ThreatLevel};
use scamguard::verdict::local_verdict;
use scamguard::voice::{HttpTranscriber, VoiceAnalyzer};
use serde::Serialize;
use std::cell::RefCell;
use std::fs;
use std::path::Path;
use std::rc::Rc;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Serialize)]
struct LinkOutput<'a> {
    url: &'a str,
    check: LinkCheck,
    #[serde(skip_serializing_if = "Option::is_none")]
    verdict: Option<LinkRiskVerdict>,
}

fn init_tracing(verbose: bool, configured: Option<&str>) {
    let fallback = if verbose {
        "debug"
    } else {
        configured.unwrap_or("warn")
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn open_store(config: &Config) -> Result<ReportStore> {
    let settings = config.report_settings();
    match &settings.path {
        Some(path) => ReportStore::open(path, settings.max_entries, settings.max_age_days),
        None => Ok(ReportStore::in_memory(
            settings.max_entries,
            settings.max_age_days,
        )),
    }
}

fn build_engine(config: &Config) -> Result<Engine<scamguard::remote::HttpTransport>> {
    let scanner = ContentScanner::new(config.catalog()).context("Failed to build pattern matcher")?;
    let remote = HttpLinkScanner::http(&config.remote_scan()).context("Failed to build HTTP client")?;
    let reports: Arc<dyn ReportSink> = Arc::new(open_store(config)?);
    Ok(Engine {
        scanner: Arc::new(scanner),
        classifier: LinkRiskClassifier::new(),
        remote: Arc::new(remote),
        reports,
        thresholds: config.thresholds(),
    })
}

fn audio_format(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_else(|| "wav".to_string())
}

/// Runs the command; returns whether anything critical was found.
async fn run(args: &Args, config: &Config) -> Result<bool> {
    match &args.command {
        Command::Legend => {
            report::print_legend(&config.catalog());
            Ok(false)
        }

        Command::Scan { path, deep } => {
            if !path.exists() {
                bail!("Path does not exist: {}", path.display());
            }
            let engine = build_engine(config)?;
            let mut findings = audit::scan_directory(path, &engine.scanner, &engine.classifier);
            if *deep {
                audit::deep_scan(&mut findings, &engine.remote).await;
            }

            if args.json {
                report::print_json(&findings)?;
            } else {
                report::print_banner();
                report::print_scan_report(&findings, args.verbose);
            }
            Ok(findings
                .iter()
                .any(|f| f.threat_level() == Some(ThreatLevel::Critical)))
        }

        Command::Text { text, email } => {
            let engine = build_engine(config)?;
            if args.json {
                let result = engine.scanner.scan(text);
                report::print_json(&result)?;
                return Ok(result.is_some_and(|r| r.threat_level == ThreatLevel::Critical));
            }

            report::print_banner();
            let surface: SharedSurface = Rc::new(RefCell::new(TerminalSurface::new()));
            let session = PageSession::start(engine, "about:text", surface);
            let result = if *email {
                session.on_email_opened(NodeId(0), text)
            } else {
                session.on_page_load(text)
            };
            report::print_scan_result("text", result.as_ref());
            Ok(result.is_some_and(|r| r.threat_level == ThreatLevel::Critical))
        }

        Command::Link { url, deep, diagnose } => {
            let engine = build_engine(config)?;
            let check = if *diagnose {
                engine.classifier.diagnose(url)
            } else {
                engine.classifier.classify(url)
            };
            let verdict = if *deep {
                Some(engine.remote.scan_link(url).await)
            } else if *diagnose {
                Some(local_verdict(&engine.classifier, url))
            } else {
                None
            };
            let critical = verdict
                .as_ref()
                .is_some_and(|v| v.threat_level == ThreatLevel::Critical);

            if args.json {
                report::print_json(&LinkOutput {
                    url: url.as_str(),
                    check,
                    verdict,
                })?;
                return Ok(critical);
            }

            report::print_banner();
            report::print_link_report(url, &check, verdict.as_ref());
            if let Some(v) = verdict.as_ref().filter(|v| *deep && !v.is_safe) {
                let mut presenter = WarningPresenter::new(url, Arc::clone(&engine.reports));
                presenter.show_link_warning(&mut TerminalSurface::new(), url, v);
            }
            Ok(critical)
        }

        Command::Voice { file, text } => {
            let analyzer = VoiceAnalyzer::new();
            let analysis = match (text, file) {
                (Some(text), _) => analyzer.analyze_transcription(text),
                (None, Some(file)) => {
                    let audio = fs::read(file)
                        .with_context(|| format!("Failed to read {}", file.display()))?;
                    let (endpoint, timeout) = config.transcription();
                    let transcriber = HttpTranscriber::new(&endpoint, timeout)?;
                    analyzer
                        .analyze_audio(&transcriber, &audio, &audio_format(file))
                        .await?
                }
                (None, None) => bail!("Provide an audio file or --text"),
            };

            if args.json {
                report::print_json(&analysis)?;
            } else {
                report::print_banner();
                report::print_voice_report(&analysis);
            }
            Ok(analysis.threat_level == ThreatLevel::Critical)
        }

        Command::Reports { sweep, limit } => {
            let settings = config.report_settings();
            let Some(path) = &settings.path else {
                bail!("No report store configured; set [reports] path in the config file");
            };
            let store = ReportStore::open(path, settings.max_entries, settings.max_age_days)?;
            if *sweep {
                let removed = store.sweep(Utc::now());
                if !args.json {
                    println!("🧹 Purged {} expired reports", removed);
                }
            }
            let recent = store.recent(*limit);
            if args.json {
                report::print_json(&recent)?;
            } else {
                report::print_reports(&recent, store.len());
            }
            Ok(false)
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = cli::parse();
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    init_tracing(args.verbose, config.log_level());

    let critical = run(&args, &config).await?;

    if critical && args.fail_on_findings {
        eprintln!(
            "\n{}",
            "⚠️  CRITICAL: scam indicators found. Do not act on this content.".red().bold()
        );
        std::process::exit(1);
    }
    Ok(())
}
