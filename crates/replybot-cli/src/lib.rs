//! Replybot console.
//!
//! This crate provides the `replybot` binary: argument parsing, file
//! logging and the interactive operator prompts.

pub mod cli;
pub mod logging;
pub mod prompt;

use replybot_core::{BotError, CancelFlag, Result};

/// Exit status when a second Ctrl-C arrives before the first was handled.
pub const FORCED_EXIT_CODE: i32 = 130;

/// Routes SIGINT into `cancel` instead of terminating the process.
///
/// The engine observes the flag at its blocking-call boundaries. A second
/// SIGINT while the flag is still set exits immediately, so a hung HTTP
/// call can still be abandoned.
pub fn register_interrupt(cancel: &CancelFlag) -> Result<()> {
    let install_failed =
        |e: std::io::Error| BotError::Startup(format!("failed to install interrupt handler: {}", e));

    // Shutdown check must run before the flag is set.
    signal_hook::flag::register_conditional_shutdown(
        signal_hook::consts::SIGINT,
        FORCED_EXIT_CODE,
        cancel.as_atomic(),
    )
    .map_err(install_failed)?;
    signal_hook::flag::register(signal_hook::consts::SIGINT, cancel.as_atomic())
        .map_err(install_failed)?;
    Ok(())
}

/// Loads `.env` style files; values already in the environment win.
///
/// Order: `~/.replybot/.env.local`, then `./.env.local`, then `./.env`.
pub fn load_env_files() {
    let _ = dotenvy::from_path(replybot_core::config::env_file());
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::dotenv();
}
