//! Operator console prompts.
//!
//! [`ConsolePrompter`] answers the engine's [`DecisionProvider`] questions
//! on the terminal. Line input goes through [`LineReader`] so the prompt
//! flow can be driven from a script in tests.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use tracing::{debug, warn};

use replybot_core::{BotError, DecisionProvider, ReplyDecision, ReplyOutcome, Result};
use replybot_models::{
    Item, ItemId, ModelTier, MonitorConfig, DEFAULT_COLLECTION, DEFAULT_INSTRUCTION,
    DEFAULT_KEYWORD,
};

/// Source of operator input lines.
pub trait LineReader {
    /// Shows `prompt` and reads one line.
    fn read_line(&mut self, prompt: &str) -> std::result::Result<String, ReadlineError>;
}

impl LineReader for DefaultEditor {
    fn read_line(&mut self, prompt: &str) -> std::result::Result<String, ReadlineError> {
        let line = self.readline(prompt)?;
        if !line.trim().is_empty() {
            self.add_history_entry(line.as_str())?;
        }
        Ok(line)
    }
}

/// Parses a yes/no answer.
pub fn parse_yes_no(input: &str) -> Option<bool> {
    match input.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" => Some(false),
        _ => None,
    }
}

/// Parses a model choice: a tier name, its 1-based position, or blank for
/// the default tier.
pub fn parse_model(input: &str) -> Option<ModelTier> {
    let input = input.trim();
    if input.is_empty() {
        return Some(ModelTier::default());
    }
    if let Ok(n) = input.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| ModelTier::ALL.get(i).copied());
    }
    input.parse().ok()
}

/// Returns `input` unchanged, or `default` when it is blank.
pub fn or_default(input: String, default: &str) -> String {
    if input.trim().is_empty() {
        default.to_string()
    } else {
        input
    }
}

fn readline_error(e: ReadlineError) -> BotError {
    match e {
        ReadlineError::Interrupted | ReadlineError::Eof => BotError::Interrupted,
        other => BotError::Prompt(other.to_string()),
    }
}

/// Interactive operator console.
pub struct ConsolePrompter<R> {
    reader: R,
    clear_screen: bool,
    status_line: bool,
    status_shown: bool,
}

impl<R: LineReader> ConsolePrompter<R> {
    /// Creates a prompter that clears the screen between startup prompts.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            clear_screen: true,
            status_line: false,
            status_shown: false,
        }
    }

    /// Enables or disables screen clearing.
    pub fn with_clear_screen(mut self, enabled: bool) -> Self {
        self.clear_screen = enabled;
        self
    }

    /// Enables the live "items seen" line while monitoring.
    pub fn with_status_line(mut self, enabled: bool) -> Self {
        self.status_line = enabled;
        self
    }

    /// Asks for the subreddit and keyword unless already given.
    pub fn monitor_config(
        &mut self,
        subreddit: Option<String>,
        keyword: Option<String>,
    ) -> Result<MonitorConfig> {
        let collection = match subreddit {
            Some(collection) => collection,
            None => {
                self.clear();
                self.ask_with_default("What subreddit do you want to monitor?", DEFAULT_COLLECTION)?
            }
        };
        let keyword = match keyword {
            Some(keyword) => keyword,
            None => {
                self.clear();
                self.ask_with_default("What keyword do you want to monitor?", DEFAULT_KEYWORD)?
            }
        };
        self.clear();

        Ok(MonitorConfig::new(&collection, &keyword)?)
    }

    fn clear(&self) {
        if self.clear_screen {
            if let Err(e) = execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0)) {
                debug!(error = %e, "screen clear failed");
            }
        }
    }

    fn end_status_line(&mut self) {
        if self.status_shown {
            println!();
            self.status_shown = false;
        }
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        self.end_status_line();
        self.reader.read_line(prompt).map_err(readline_error)
    }

    fn ask_with_default(&mut self, question: &str, default: &str) -> Result<String> {
        let line = self.ask(&format!("{} ({}): ", question, default))?;
        Ok(or_default(line, default))
    }

    fn ask_until<T>(
        &mut self,
        prompt: &str,
        hint: &str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<T> {
        loop {
            let line = self.ask(prompt)?;
            match parse(&line) {
                Some(value) => return Ok(value),
                None => println!("{}", hint),
            }
        }
    }

    fn ask_model(&mut self) -> Result<ModelTier> {
        let names: Vec<&str> = ModelTier::ALL.iter().map(|m| m.name()).collect();
        let prompt = format!(
            "Which model do you want to use? [{}] ({}): ",
            names.join("/"),
            ModelTier::default()
        );
        let hint = format!("Please select one of: {}", names.join(", "));
        self.ask_until(&prompt, &hint, parse_model)
    }

    fn ask_yes_no(&mut self, question: &str) -> Result<bool> {
        self.ask_until(
            &format!("{} [y/n]: ", question),
            "Please answer y or n",
            parse_yes_no,
        )
    }
}

impl<R: LineReader> DecisionProvider for ConsolePrompter<R> {
    fn review(&mut self, _item: &Item) -> Result<ReplyDecision> {
        let model = self.ask_model()?;
        let instruction = self.ask_with_default(
            "How would you like the model to reply to this comment/submission?",
            DEFAULT_INSTRUCTION,
        )?;
        if self.ask_yes_no("Do you want to reply to this comment/submission?")? {
            Ok(ReplyDecision::Approve { model, instruction })
        } else {
            Ok(ReplyDecision::Skip)
        }
    }

    fn confirm_exit(&mut self) -> Result<bool> {
        self.end_status_line();
        self.clear();
        self.ask_yes_no("Do you want to exit?")
    }

    fn on_item(&mut self, _item: &Item, seen: usize) {
        if !self.status_line {
            return;
        }
        print!("\rComments and posts processed: {:>7}", seen);
        if let Err(e) = io::stdout().flush() {
            warn!(error = %e, "status line flush failed");
        }
        self.status_shown = true;
    }

    fn on_match(&mut self, item: &Item) {
        self.end_status_line();
        println!("{}", item.summary_line());
        println!("{}", item.text());
        println!();
    }

    fn on_outcome(&mut self, item_id: &ItemId, outcome: &ReplyOutcome) {
        match outcome {
            ReplyOutcome::Replied { text, .. } => println!("Replied to {}: {}", item_id, text),
            ReplyOutcome::NoReply => println!("No reply generated for {}", item_id),
            ReplyOutcome::Declined => println!("Skipped {}", item_id),
            ReplyOutcome::AlreadyHandled => println!("Already replied to {}", item_id),
        }
    }
}
