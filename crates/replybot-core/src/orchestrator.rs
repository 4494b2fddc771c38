//! Reply orchestration for matched items.

use tracing::{debug, info, warn};

use replybot_models::{Item, ItemId, ReplyRequest};

use crate::cancel::CancelFlag;
use crate::completion::{GenerationParams, GenerationRequest};
use crate::dedup::HandledSet;
use crate::error::{BotError, Result};
use crate::traits::{ContentSource, DecisionProvider, ReplyDecision, TextGenerator};

/// What happened to a matched item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// A reply was submitted and the item recorded as handled.
    Replied {
        /// Item that received the reply.
        item_id: ItemId,
        /// Submitted reply text.
        text: String,
    },
    /// Generation produced no usable text; nothing was submitted.
    NoReply,
    /// The operator chose not to reply.
    Declined,
    /// The item was already handled; nothing was generated.
    AlreadyHandled,
}

impl ReplyOutcome {
    /// Returns true if a reply was submitted.
    pub fn is_replied(&self) -> bool {
        matches!(self, ReplyOutcome::Replied { .. })
    }
}

/// Generates and submits replies for matched items.
pub struct ReplyOrchestrator<'a, S: ContentSource + ?Sized, G: TextGenerator + ?Sized> {
    source: &'a S,
    generator: &'a G,
    params: &'a GenerationParams,
    cancel: &'a CancelFlag,
}

impl<'a, S: ContentSource + ?Sized, G: TextGenerator + ?Sized> ReplyOrchestrator<'a, S, G> {
    /// Creates an orchestrator over the given collaborators.
    pub fn new(
        source: &'a S,
        generator: &'a G,
        params: &'a GenerationParams,
        cancel: &'a CancelFlag,
    ) -> Self {
        Self {
            source,
            generator,
            params,
            cancel,
        }
    }

    /// Handles one item that passed the matcher.
    ///
    /// The item is added to `handled` only after the reply was submitted.
    /// Generation and submission failures propagate unchanged; an interrupt
    /// observed before the generation call yields [`BotError::Interrupted`].
    pub fn handle<D: DecisionProvider + ?Sized>(
        &self,
        item: &Item,
        decisions: &mut D,
        handled: &mut HandledSet,
    ) -> Result<ReplyOutcome> {
        if handled.contains(item.id()) {
            debug!(id = %item.id(), "item already handled, not replying");
            return Ok(ReplyOutcome::AlreadyHandled);
        }

        let (model, instruction) = match decisions.review(item)? {
            ReplyDecision::Approve { model, instruction } => (model, instruction),
            ReplyDecision::Skip => {
                info!(id = %item.id(), "operator declined to reply");
                return Ok(ReplyOutcome::Declined);
            }
        };

        let request = ReplyRequest::new(item.id().clone(), instruction, model);

        if self.cancel.is_cancelled() {
            return Err(BotError::Interrupted);
        }

        info!(
            id = %request.item_id,
            model = %request.model,
            text = item.text(),
            "generating response"
        );
        let generation = GenerationRequest::new(
            request.model.model_id(),
            request.prompt(item.text()),
            self.params,
        );
        let response = self.generator.generate(&generation)?;

        let text = match response.first_text().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            Some(_) => {
                warn!(id = %request.item_id, "generated text was empty, not replying");
                return Ok(ReplyOutcome::NoReply);
            }
            None => {
                warn!(id = %request.item_id, "response text not retrieved, not replying");
                return Ok(ReplyOutcome::NoReply);
            }
        };
        info!(id = %request.item_id, response = %text, "response generated");

        self.source
            .submit_reply(item, &text)
            .map_err(|e| BotError::Submission(format!("reply to {}: {}", item.fullname(), e)))?;

        handled.insert(request.item_id.clone());
        info!(id = %request.item_id, handled = handled.len(), "replied to item");

        Ok(ReplyOutcome::Replied {
            item_id: request.item_id,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CompletionResponse, GenerationError};
    use crate::error::{SourceError, SourceResult};
    use replybot_models::{Comment, CommentNode, HistoryEntry, ModelTier, Post};
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingSource {
        replies: RefCell<Vec<(String, String)>>,
        fail_submit: bool,
    }

    impl ContentSource for RecordingSource {
        fn new_posts(&self, _collection: &str, _limit: usize) -> SourceResult<Vec<Post>> {
            Ok(vec![])
        }

        fn comments(&self, _post: &Post) -> SourceResult<Vec<CommentNode>> {
            Ok(vec![])
        }

        fn submit_reply(&self, item: &Item, text: &str) -> SourceResult<()> {
            if self.fail_submit {
                return Err(SourceError::Api {
                    status: 403,
                    message: "forbidden".into(),
                });
            }
            self.replies
                .borrow_mut()
                .push((item.id().to_string(), text.to_string()));
            Ok(())
        }

        fn own_history(&self) -> SourceResult<Vec<HistoryEntry>> {
            Ok(vec![])
        }
    }

    struct FixedGenerator {
        response: Option<CompletionResponse>,
        requests: RefCell<Vec<GenerationRequest>>,
    }

    impl FixedGenerator {
        fn returning(response: CompletionResponse) -> Self {
            Self {
                response: Some(response),
                requests: RefCell::new(vec![]),
            }
        }

        fn failing() -> Self {
            Self {
                response: None,
                requests: RefCell::new(vec![]),
            }
        }
    }

    impl TextGenerator for FixedGenerator {
        fn generate(
            &self,
            request: &GenerationRequest,
        ) -> std::result::Result<CompletionResponse, GenerationError> {
            self.requests.borrow_mut().push(request.clone());
            self.response
                .clone()
                .ok_or_else(|| GenerationError::RequestFailed("boom".into()))
        }
    }

    struct Approve(ModelTier);

    impl DecisionProvider for Approve {
        fn review(&mut self, _item: &Item) -> Result<ReplyDecision> {
            Ok(ReplyDecision::Approve {
                model: self.0,
                instruction: "Answer: ".to_string(),
            })
        }

        fn confirm_exit(&mut self) -> Result<bool> {
            Ok(true)
        }
    }

    struct Skip;

    impl DecisionProvider for Skip {
        fn review(&mut self, _item: &Item) -> Result<ReplyDecision> {
            Ok(ReplyDecision::Skip)
        }

        fn confirm_exit(&mut self) -> Result<bool> {
            Ok(true)
        }
    }

    fn item() -> Item {
        Item::Comment(Comment {
            id: "c1".into(),
            post_id: "p1".into(),
            parent_id: "p1".into(),
            body: "I saw a kangaroo today".to_string(),
            author: None,
        })
    }

    #[test]
    fn test_reply_submitted_and_recorded_once() {
        let source = RecordingSource::default();
        let generator = FixedGenerator::returning(CompletionResponse::with_text(" Kangaroos are marsupials."));
        let params = GenerationParams::default();
        let cancel = CancelFlag::new();
        let orchestrator = ReplyOrchestrator::new(&source, &generator, &params, &cancel);
        let mut handled = HandledSet::new();

        let outcome = orchestrator
            .handle(&item(), &mut Approve(ModelTier::Curie), &mut handled)
            .unwrap();

        assert_eq!(
            outcome,
            ReplyOutcome::Replied {
                item_id: "c1".into(),
                text: "Kangaroos are marsupials.".to_string(),
            }
        );
        assert_eq!(
            *source.replies.borrow(),
            vec![("c1".to_string(), "Kangaroos are marsupials.".to_string())]
        );
        assert!(handled.contains(&"c1".into()));
        assert_eq!(handled.len(), 1);

        let requests = generator.requests.borrow();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].model, "text-curie-001");
        assert_eq!(requests[0].prompt, "Answer: I saw a kangaroo todayReply:");
        assert_eq!(requests[0].max_tokens, 50);
    }

    #[test]
    fn test_second_handle_does_not_resubmit() {
        let source = RecordingSource::default();
        let generator = FixedGenerator::returning(CompletionResponse::with_text("hi"));
        let params = GenerationParams::default();
        let cancel = CancelFlag::new();
        let orchestrator = ReplyOrchestrator::new(&source, &generator, &params, &cancel);
        let mut handled = HandledSet::new();

        orchestrator.handle(&item(), &mut Approve(ModelTier::Ada), &mut handled).unwrap();
        let again = orchestrator
            .handle(&item(), &mut Approve(ModelTier::Ada), &mut handled)
            .unwrap();

        assert_eq!(again, ReplyOutcome::AlreadyHandled);
        assert_eq!(source.replies.borrow().len(), 1);
        assert_eq!(generator.requests.borrow().len(), 1);
    }

    #[test]
    fn test_missing_text_is_no_reply() {
        let source = RecordingSource::default();
        let generator = FixedGenerator::returning(CompletionResponse::default());
        let params = GenerationParams::default();
        let cancel = CancelFlag::new();
        let orchestrator = ReplyOrchestrator::new(&source, &generator, &params, &cancel);
        let mut handled = HandledSet::new();

        let outcome = orchestrator
            .handle(&item(), &mut Approve(ModelTier::Davinci), &mut handled)
            .unwrap();

        assert_eq!(outcome, ReplyOutcome::NoReply);
        assert!(handled.is_empty());
        assert!(source.replies.borrow().is_empty());
    }

    #[test]
    fn test_whitespace_text_is_no_reply() {
        let source = RecordingSource::default();
        let generator = FixedGenerator::returning(CompletionResponse::with_text("  "));
        let params = GenerationParams::default();
        let cancel = CancelFlag::new();
        let orchestrator = ReplyOrchestrator::new(&source, &generator, &params, &cancel);
        let mut handled = HandledSet::new();

        let outcome = orchestrator
            .handle(&item(), &mut Approve(ModelTier::Davinci), &mut handled)
            .unwrap();

        assert_eq!(outcome, ReplyOutcome::NoReply);
        assert!(source.replies.borrow().is_empty());
    }

    #[test]
    fn test_declined_makes_no_calls() {
        let source = RecordingSource::default();
        let generator = FixedGenerator::returning(CompletionResponse::with_text("hi"));
        let params = GenerationParams::default();
        let cancel = CancelFlag::new();
        let orchestrator = ReplyOrchestrator::new(&source, &generator, &params, &cancel);
        let mut handled = HandledSet::new();

        let outcome = orchestrator.handle(&item(), &mut Skip, &mut handled).unwrap();

        assert_eq!(outcome, ReplyOutcome::Declined);
        assert!(generator.requests.borrow().is_empty());
        assert!(handled.is_empty());
    }

    #[test]
    fn test_generation_failure_propagates() {
        let source = RecordingSource::default();
        let generator = FixedGenerator::failing();
        let params = GenerationParams::default();
        let cancel = CancelFlag::new();
        let orchestrator = ReplyOrchestrator::new(&source, &generator, &params, &cancel);
        let mut handled = HandledSet::new();

        let err = orchestrator
            .handle(&item(), &mut Approve(ModelTier::Ada), &mut handled)
            .unwrap_err();

        assert!(matches!(err, BotError::Generation(_)));
        assert!(handled.is_empty());
    }

    #[test]
    fn test_submission_failure_leaves_item_unhandled() {
        let source = RecordingSource {
            fail_submit: true,
            ..RecordingSource::default()
        };
        let generator = FixedGenerator::returning(CompletionResponse::with_text("hi"));
        let params = GenerationParams::default();
        let cancel = CancelFlag::new();
        let orchestrator = ReplyOrchestrator::new(&source, &generator, &params, &cancel);
        let mut handled = HandledSet::new();

        let err = orchestrator
            .handle(&item(), &mut Approve(ModelTier::Ada), &mut handled)
            .unwrap_err();

        assert!(matches!(err, BotError::Submission(msg) if msg.contains("t1_c1")));
        assert!(handled.is_empty());
    }

    #[test]
    fn test_interrupt_checked_before_generation() {
        let source = RecordingSource::default();
        let generator = FixedGenerator::returning(CompletionResponse::with_text("hi"));
        let params = GenerationParams::default();
        let cancel = CancelFlag::new();
        cancel.cancel();
        let orchestrator = ReplyOrchestrator::new(&source, &generator, &params, &cancel);
        let mut handled = HandledSet::new();

        let err = orchestrator
            .handle(&item(), &mut Approve(ModelTier::Ada), &mut handled)
            .unwrap_err();

        assert!(err.is_interrupt());
        assert!(generator.requests.borrow().is_empty());
    }
}
