use clap::{Parser, Subcommand};
use std::path::PathBuf;

const TAGLINE: &str = "Spot scam language, risky links and scam calls before they cost you";

#[derive(Parser, Debug)]
#[command(name = "scamguard")]
#[command(version)]
#[command(about = TAGLINE, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Configuration file (TOML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output JSON instead of human readable
    #[arg(long, global = true)]
    pub json: bool,

    /// Show clean links and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Fail with non-zero exit code if critical findings exist
    #[arg(long, global = true)]
    pub fail_on_findings: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Scan a saved page, email or a whole directory of them
    Scan {
        path: PathBuf,

        /// Deep-scan suspicious links through the link-scan service
        #[arg(long)]
        deep: bool,
    },

    /// Scan a piece of text as if it were a page
    Text {
        text: String,

        /// Treat the text as an opened email
        #[arg(long)]
        email: bool,
    },

    /// Check a single link
    Link {
        url: String,

        /// Ask the link-scan service before deciding
        #[arg(long)]
        deep: bool,

        /// Report every local heuristic that fires, not just the first
        #[arg(long)]
        diagnose: bool,
    },

    /// Analyze a phone call from a transcript or a recording
    Voice {
        /// Audio recording to transcribe first
        #[arg(required_unless_present = "text", conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Transcript text
        #[arg(long)]
        text: Option<String>,
    },

    /// List stored scam reports
    Reports {
        /// Purge reports past the retention window first
        #[arg(long)]
        sweep: bool,

        /// How many recent reports to show
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Print the scam pattern legend
    Legend,
}

pub fn parse() -> Args {
    Args::parse()
}
