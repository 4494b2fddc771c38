//! Shared configuration paths.
//!
//! # Storage Structure
//!
//! ```text
//! ~/.replybot/
//! ├── .env.local    # Secrets (platform credentials, API key)
//! └── logs/
//!     └── replybot.log
//! ```
//!
//! # Environment Variables
//!
//! - `REPLYBOT_STATE_DIR`: Override the base state directory
//! - `REPLYBOT_LOG_DIR`: Override the log directory

use std::path::PathBuf;
use std::sync::OnceLock;

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "REPLYBOT_STATE_DIR";

/// Environment variable for custom log directory.
pub const LOG_DIR_ENV: &str = "REPLYBOT_LOG_DIR";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".replybot";

const LOGS_SUBDIR: &str = "logs";
const LOG_FILE_NAME: &str = "replybot.log";
const ENV_FILE_NAME: &str = ".env.local";

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Get the state directory.
///
/// Resolved from, in order:
/// 1. `REPLYBOT_STATE_DIR` environment variable if set
/// 2. `~/.replybot` if home directory is available
/// 3. `.replybot` in current directory as fallback
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

/// Get the logs directory.
///
/// Defaults to `~/.replybot/logs/` or `REPLYBOT_LOG_DIR` env var.
pub fn logs_dir() -> PathBuf {
    std::env::var(LOG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| state_dir().join(LOGS_SUBDIR))
}

/// Get the log file path.
pub fn log_file() -> PathBuf {
    logs_dir().join(LOG_FILE_NAME)
}

/// Get the `.env.local` file path holding secrets.
pub fn env_file() -> PathBuf {
    state_dir().join(ENV_FILE_NAME)
}
