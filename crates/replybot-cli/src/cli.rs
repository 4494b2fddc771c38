//! Command-line interface definition using clap.

use clap::Parser;

/// Version string with git hash and build date, e.g. `0.1.0 (abc1234, 2026-01-29)`.
fn version_string() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const BUILD_DATE: &str = env!("BUILD_DATE");

    static VERSION_STRING: std::sync::OnceLock<String> = std::sync::OnceLock::new();
    VERSION_STRING.get_or_init(|| format!("{} ({}, {})", VERSION, GIT_HASH, BUILD_DATE))
}

/// Replybot - watch a subreddit for a keyword and reply with generated text
#[derive(Parser, Debug)]
#[command(name = "replybot")]
#[command(author, version = version_string(), about, long_about = None)]
pub struct Cli {
    /// Subreddit to monitor; prompted for when omitted
    #[arg(short, long, env = "REPLYBOT_SUBREDDIT")]
    pub subreddit: Option<String>,

    /// Keyword to match (case-sensitive); prompted for when omitted
    #[arg(short, long, env = "REPLYBOT_KEYWORD")]
    pub keyword: Option<String>,

    /// Ignore posts already listed when a pass starts
    #[arg(long)]
    pub skip_existing: bool,

    /// Show a live count of items seen while monitoring
    #[arg(long)]
    pub status_line: bool,

    /// Enable verbose logging (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Level written to the log file.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }
}
