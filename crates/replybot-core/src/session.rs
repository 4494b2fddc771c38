//! Session controller.
//!
//! Owns the run/stop loop. Each pass subscribes to the stream, waits for the
//! first eligible item and hands it to the orchestrator; the pass then ends,
//! so at most one reply is attempted per pass. Interrupts move the session
//! to exit confirmation instead of tearing it down.

use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{debug, error, info};

use replybot_models::{ItemId, MonitorConfig};

use crate::cancel::CancelFlag;
use crate::completion::GenerationParams;
use crate::dedup::{HandledSet, SeenSet};
use crate::dispatcher::{StreamDispatcher, StreamSettings};
use crate::error::{BotError, Result};
use crate::matcher::is_eligible;
use crate::orchestrator::{ReplyOrchestrator, ReplyOutcome};
use crate::summary::RunSummary;
use crate::traits::{ContentSource, DecisionProvider, TextGenerator};

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Monitoring passes are running.
    Running,
    /// Interrupted; waiting for the operator to confirm exit.
    AwaitingExitConfirmation,
    /// Finished. Absorbing.
    Terminated,
}

/// Tunables for a session.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Stream polling settings.
    pub stream: StreamSettings,
    /// Generation sampling parameters.
    pub generation: GenerationParams,
    /// Pause after a successful reply before the next pass.
    pub reply_cooldown: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            stream: StreamSettings::default(),
            generation: GenerationParams::default(),
            reply_cooldown: Duration::from_secs(1),
        }
    }
}

impl SessionSettings {
    /// Creates settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the stream settings.
    pub fn with_stream(mut self, stream: StreamSettings) -> Self {
        self.stream = stream;
        self
    }

    /// Sets the post-reply cooldown.
    pub fn with_reply_cooldown(mut self, cooldown: Duration) -> Self {
        self.reply_cooldown = cooldown;
        self
    }
}

/// How a single pass ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// An eligible item was handed to the orchestrator.
    Handled {
        /// The eligible item.
        item_id: ItemId,
        /// What the orchestrator did with it.
        outcome: ReplyOutcome,
    },
    /// The stream pull observed an interrupt.
    Cancelled,
}

/// A monitoring session: collaborators, dedup state and the run loop.
pub struct Session<S, G, D> {
    source: S,
    generator: G,
    decisions: D,
    config: MonitorConfig,
    settings: SessionSettings,
    handled: HandledSet,
    seen: SeenSet,
    cancel: CancelFlag,
    state: SessionState,
    started_at: DateTime<Local>,
    ended_at: Option<DateTime<Local>>,
    passes: u64,
}

impl<S, G, D> Session<S, G, D>
where
    S: ContentSource,
    G: TextGenerator,
    D: DecisionProvider,
{
    /// Creates a session in the `Running` state.
    ///
    /// `handled` is normally the output of
    /// [`seed_handled_set`](crate::seeder::seed_handled_set).
    pub fn new(
        source: S,
        generator: G,
        decisions: D,
        config: MonitorConfig,
        handled: HandledSet,
        cancel: CancelFlag,
    ) -> Self {
        info!(
            collection = config.collection(),
            keyword = config.keyword(),
            handled = handled.len(),
            "session created"
        );
        Self {
            source,
            generator,
            decisions,
            config,
            settings: SessionSettings::default(),
            handled,
            seen: SeenSet::new(),
            cancel,
            state: SessionState::Running,
            started_at: Local::now(),
            ended_at: None,
            passes: 0,
        }
    }

    /// Replaces the session settings.
    pub fn with_settings(mut self, settings: SessionSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Backdates the run start, e.g. to when the process launched.
    ///
    /// Defaults to the moment the session was created.
    pub fn with_started_at(mut self, started_at: DateTime<Local>) -> Self {
        self.started_at = started_at;
        self
    }

    /// Current state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// The handled set.
    pub fn handled(&self) -> &HandledSet {
        &self.handled
    }

    /// The seen set.
    pub fn seen(&self) -> &SeenSet {
        &self.seen
    }

    /// The monitor configuration.
    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    /// Number of passes started so far.
    pub fn passes(&self) -> u64 {
        self.passes
    }

    /// The content source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Runs passes until the operator confirms exit.
    ///
    /// Failures other than interrupts end the run with an error.
    pub fn run(&mut self) -> Result<RunSummary> {
        loop {
            match self.state {
                SessionState::Running => match self.run_pass() {
                    Ok(PassOutcome::Cancelled) => self.interrupted(),
                    Ok(PassOutcome::Handled { item_id, outcome }) => {
                        debug!(id = %item_id, ?outcome, "pass complete");
                    }
                    Err(e) if e.is_interrupt() => self.interrupted(),
                    Err(e) => {
                        error!(error = %e, "monitoring pass failed");
                        return Err(e);
                    }
                },
                SessionState::AwaitingExitConfirmation => match self.decisions.confirm_exit() {
                    Ok(true) | Err(BotError::Interrupted) => self.terminate(),
                    Ok(false) => self.resume(),
                    Err(e) => return Err(e),
                },
                SessionState::Terminated => return Ok(self.summary()),
            }
        }
    }

    /// Runs one pass: stream until the first eligible item is handled or
    /// an interrupt is observed.
    pub fn run_pass(&mut self) -> Result<PassOutcome> {
        self.passes += 1;
        info!(
            pass = self.passes,
            collection = self.config.collection(),
            keyword = self.config.keyword(),
            "monitoring pass started"
        );

        let mut dispatcher = StreamDispatcher::new(
            &self.source,
            self.config.collection(),
            &self.settings.stream,
            &self.cancel,
        );
        let orchestrator = ReplyOrchestrator::new(
            &self.source,
            &self.generator,
            &self.settings.generation,
            &self.cancel,
        );

        loop {
            let Some(item) = dispatcher.pull(&mut self.seen)? else {
                return Ok(PassOutcome::Cancelled);
            };
            self.decisions.on_item(&item, self.seen.len());

            if !is_eligible(&item, self.config.keyword(), &self.handled) {
                continue;
            }

            info!(id = %item.id(), kind = ?item.kind(), "keyword matched");
            self.decisions.on_match(&item);

            let outcome = orchestrator.handle(&item, &mut self.decisions, &mut self.handled)?;
            self.decisions.on_outcome(item.id(), &outcome);

            if outcome.is_replied() {
                self.cancel.wait(self.settings.reply_cooldown);
            }

            return Ok(PassOutcome::Handled {
                item_id: item.id().clone(),
                outcome,
            });
        }
    }

    /// Builds the summary for the current moment (or the termination time).
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            seen: self.seen.len(),
            handled: self.handled.len(),
            started_at: self.started_at,
            ended_at: self.ended_at.unwrap_or_else(Local::now),
        }
    }

    fn interrupted(&mut self) {
        info!("interrupt received");
        self.state = SessionState::AwaitingExitConfirmation;
    }

    fn resume(&mut self) {
        info!(handled = self.handled.len(), "exit declined, resuming monitoring");
        self.cancel.reset();
        self.seen.clear();
        self.state = SessionState::Running;
    }

    fn terminate(&mut self) {
        info!(
            seen = self.seen.len(),
            handled = self.handled.len(),
            "exiting"
        );
        self.ended_at = Some(Local::now());
        self.state = SessionState::Terminated;
    }
}
