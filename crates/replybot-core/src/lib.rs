//! Replybot core - stream monitoring, dedup and reply orchestration.
//!
//! - **seeder**: rebuild the handled set from the account's own history
//! - **dispatcher**: turn the platform's newest-posts listing into a stream
//! - **matcher**: keyword + dedup eligibility predicate
//! - **orchestrator**: generate and submit one reply
//! - **session**: run/stop state machine and run summary
//! - **completion**: blocking client for the text-completion service
//!
//! The platform, the generation service and the operator are injected via
//! [`ContentSource`], [`TextGenerator`] and [`DecisionProvider`].

pub mod cancel;
pub mod completion;
pub mod config;
pub mod dedup;
pub mod dispatcher;
pub mod error;
pub mod matcher;
pub mod orchestrator;
pub mod seeder;
pub mod session;
pub mod summary;
pub mod traits;

pub use cancel::CancelFlag;
pub use completion::{
    CompletionChoice, CompletionClient, CompletionResponse, GenerationError, GenerationParams,
    GenerationRequest,
};
pub use dedup::{HandledSet, SeenSet};
pub use dispatcher::{StreamDispatcher, StreamSettings};
pub use error::{BotError, Result, SourceError, SourceResult};
pub use matcher::is_eligible;
pub use orchestrator::{ReplyOrchestrator, ReplyOutcome};
pub use seeder::{handled_from_history, seed_handled_set};
pub use session::{PassOutcome, Session, SessionSettings, SessionState};
pub use summary::RunSummary;
pub use traits::{ContentSource, DecisionProvider, ReplyDecision, TextGenerator};
