//! Collaborator traits.
//!
//! The engine never talks to the network or the console directly. The
//! social platform, the text-generation service and the operator are all
//! injected through the traits below, which keeps the dedup and matching
//! logic testable with scripted stand-ins.

use replybot_models::{CommentNode, HistoryEntry, Item, ItemId, ModelTier, Post};

use crate::completion::{CompletionResponse, GenerationError, GenerationRequest};
use crate::error::{Result, SourceResult};
use crate::orchestrator::ReplyOutcome;

/// The social platform, seen as a data source and a reply sink.
pub trait ContentSource {
    /// Returns up to `limit` of the newest posts in `collection`, newest first.
    fn new_posts(&self, collection: &str, limit: usize) -> SourceResult<Vec<Post>>;

    /// Returns the flattened comment listing of a post.
    fn comments(&self, post: &Post) -> SourceResult<Vec<CommentNode>>;

    /// Submits `text` as a reply to `item`.
    fn submit_reply(&self, item: &Item, text: &str) -> SourceResult<()>;

    /// Returns the authenticated account's own comments and posts.
    fn own_history(&self) -> SourceResult<Vec<HistoryEntry>>;
}

/// The text-generation service.
pub trait TextGenerator {
    /// Issues a single, non-streaming generation request.
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> std::result::Result<CompletionResponse, GenerationError>;
}

/// The operator's verdict on a matched item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyDecision {
    /// Generate and submit a reply.
    Approve {
        /// Model tier to generate with.
        model: ModelTier,
        /// Instruction prepended to the item text.
        instruction: String,
    },
    /// Leave the item alone.
    Skip,
}

/// Source of operator decisions.
///
/// The interactive binary answers these with console prompts; tests script
/// them. Returning [`crate::BotError::Interrupted`] from any method is treated
/// as an operator interrupt.
pub trait DecisionProvider {
    /// Decides whether and how to reply to a matched item.
    fn review(&mut self, item: &Item) -> Result<ReplyDecision>;

    /// Asks whether to exit after an interrupt.
    fn confirm_exit(&mut self) -> Result<bool>;

    /// Called for every item pulled from the stream.
    fn on_item(&mut self, _item: &Item, _seen: usize) {}

    /// Called when an item passes the matcher.
    fn on_match(&mut self, _item: &Item) {}

    /// Called after the orchestrator finished with a matched item.
    fn on_outcome(&mut self, _item_id: &ItemId, _outcome: &ReplyOutcome) {}
}

impl<D: DecisionProvider + ?Sized> DecisionProvider for &mut D {
    fn review(&mut self, item: &Item) -> Result<ReplyDecision> {
        (**self).review(item)
    }

    fn confirm_exit(&mut self) -> Result<bool> {
        (**self).confirm_exit()
    }

    fn on_item(&mut self, item: &Item, seen: usize) {
        (**self).on_item(item, seen)
    }

    fn on_match(&mut self, item: &Item) {
        (**self).on_match(item)
    }

    fn on_outcome(&mut self, item_id: &ItemId, outcome: &ReplyOutcome) {
        (**self).on_outcome(item_id, outcome)
    }
}
