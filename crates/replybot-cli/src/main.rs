//! Replybot entry point.

use chrono::{DateTime, Local};
use clap::Parser;
use rustyline::DefaultEditor;
use tracing::{error, info};

use replybot_cli::cli::Cli;
use replybot_cli::prompt::ConsolePrompter;
use replybot_cli::{load_env_files, logging, register_interrupt};
use replybot_core::{
    seed_handled_set, BotError, CancelFlag, CompletionClient, Result, RunSummary, Session,
    SessionSettings, StreamSettings,
};
use replybot_reddit::{RedditClient, RedditCredentials};

fn main() {
    let started_at = Local::now();
    load_env_files();

    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.log_level()) {
        eprintln!("Warning: file logging disabled: {}", e);
    }

    match run(&cli, started_at) {
        Ok(summary) => println!("{}", summary),
        Err(e) if e.is_interrupt() => {
            info!("cancelled during startup");
            println!("Cancelled.");
        }
        Err(e) => {
            error!(error = %e, "fatal error");
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: &Cli, started_at: DateTime<Local>) -> Result<RunSummary> {
    let credentials = RedditCredentials::from_env()?;
    let reddit = RedditClient::connect(credentials)?;

    let generator =
        CompletionClient::from_env().map_err(|e| BotError::Config(e.to_string()))?;
    info!(endpoint = generator.endpoint(), "OpenAI client configured");

    let editor = DefaultEditor::new().map_err(|e| BotError::Prompt(e.to_string()))?;
    let mut console = ConsolePrompter::new(editor).with_status_line(cli.status_line);
    let config = console.monitor_config(cli.subreddit.clone(), cli.keyword.clone())?;

    let cancel = CancelFlag::new();
    register_interrupt(&cancel)?;

    let handled = seed_handled_set(&reddit)?;

    let settings = SessionSettings::new()
        .with_stream(StreamSettings::new().with_skip_existing(cli.skip_existing));

    println!(
        "Monitoring r/{} for '{}' as u/{} (Ctrl-C to stop)",
        config.collection(),
        config.keyword(),
        reddit.username()
    );

    let mut session = Session::new(reddit, generator, console, config, handled, cancel)
        .with_settings(settings)
        .with_started_at(started_at);
    session.run()
}
