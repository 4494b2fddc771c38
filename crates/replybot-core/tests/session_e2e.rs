//! End-to-end session tests with scripted collaborators.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use replybot_core::{
    seed_handled_set, BotError, CancelFlag, CompletionResponse, ContentSource, DecisionProvider,
    GenerationError, GenerationRequest, ReplyDecision, ReplyOutcome, Result, Session,
    SessionSettings, SessionState, SourceError, SourceResult, StreamSettings, TextGenerator,
};
use replybot_models::{
    Comment, CommentNode, HistoryEntry, Item, ItemId, ModelTier, MonitorConfig, Post,
};

enum Poll {
    Posts(Vec<Post>),
    Interrupt,
}

/// Scripted platform. Cancels the session once the poll script runs out.
struct FakePlatform {
    polls: RefCell<VecDeque<Poll>>,
    comments: HashMap<String, Vec<CommentNode>>,
    history: Vec<HistoryEntry>,
    replies: RefCell<Vec<(String, String)>>,
    fail_submit: bool,
    cancel: CancelFlag,
}

impl FakePlatform {
    fn new(polls: Vec<Poll>, cancel: &CancelFlag) -> Self {
        Self {
            polls: RefCell::new(polls.into()),
            comments: HashMap::new(),
            history: vec![],
            replies: RefCell::new(vec![]),
            fail_submit: false,
            cancel: cancel.clone(),
        }
    }

    fn with_comments(mut self, post_id: &str, nodes: Vec<CommentNode>) -> Self {
        self.comments.insert(post_id.to_string(), nodes);
        self
    }

    fn with_history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.history = history;
        self
    }
}

impl ContentSource for FakePlatform {
    fn new_posts(&self, _collection: &str, _limit: usize) -> SourceResult<Vec<Post>> {
        match self.polls.borrow_mut().pop_front() {
            Some(Poll::Posts(posts)) => Ok(posts),
            Some(Poll::Interrupt) | None => {
                self.cancel.cancel();
                Ok(vec![])
            }
        }
    }

    fn comments(&self, post: &Post) -> SourceResult<Vec<CommentNode>> {
        Ok(self.comments.get(post.id.as_str()).cloned().unwrap_or_default())
    }

    fn submit_reply(&self, item: &Item, text: &str) -> SourceResult<()> {
        if self.fail_submit {
            return Err(SourceError::Api {
                status: 500,
                message: "internal error".into(),
            });
        }
        self.replies
            .borrow_mut()
            .push((item.id().to_string(), text.to_string()));
        Ok(())
    }

    fn own_history(&self) -> SourceResult<Vec<HistoryEntry>> {
        Ok(self.history.clone())
    }
}

/// Returns scripted responses, then keeps repeating the last one.
struct FakeGenerator {
    responses: RefCell<VecDeque<CompletionResponse>>,
    calls: Rc<RefCell<usize>>,
}

impl FakeGenerator {
    fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            responses: RefCell::new(responses.into()),
            calls: Rc::new(RefCell::new(0)),
        }
    }
}

impl TextGenerator for FakeGenerator {
    fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> std::result::Result<CompletionResponse, GenerationError> {
        *self.calls.borrow_mut() += 1;
        let mut responses = self.responses.borrow_mut();
        if responses.len() > 1 {
            Ok(responses.pop_front().unwrap_or_default())
        } else {
            Ok(responses.front().cloned().unwrap_or_default())
        }
    }
}

/// Approves every match; answers exit prompts from a script (default: exit).
#[derive(Default)]
struct Operator {
    exits: VecDeque<Result<bool>>,
    reviewed: Vec<String>,
    seen_counts: Vec<usize>,
    outcomes: Vec<ReplyOutcome>,
}

impl Operator {
    fn answering_exit(exits: Vec<Result<bool>>) -> Self {
        Self {
            exits: exits.into(),
            ..Self::default()
        }
    }
}

impl DecisionProvider for Operator {
    fn review(&mut self, item: &Item) -> Result<ReplyDecision> {
        self.reviewed.push(item.id().to_string());
        Ok(ReplyDecision::Approve {
            model: ModelTier::Davinci,
            instruction: "Reply briefly: ".to_string(),
        })
    }

    fn confirm_exit(&mut self) -> Result<bool> {
        self.exits.pop_front().unwrap_or(Ok(true))
    }

    fn on_item(&mut self, _item: &Item, seen: usize) {
        self.seen_counts.push(seen);
    }

    fn on_outcome(&mut self, _item_id: &ItemId, outcome: &ReplyOutcome) {
        self.outcomes.push(outcome.clone());
    }
}

fn post(id: &str, selftext: &str) -> Post {
    Post {
        id: id.into(),
        collection: "all".to_string(),
        title: String::new(),
        selftext: selftext.to_string(),
        author: Some("someone".to_string()),
    }
}

fn comment(id: &str, post_id: &str, body: &str) -> CommentNode {
    CommentNode::Comment(Comment {
        id: id.into(),
        post_id: post_id.into(),
        parent_id: post_id.into(),
        body: body.to_string(),
        author: Some("someone".to_string()),
    })
}

fn settings() -> SessionSettings {
    SessionSettings::new()
        .with_stream(StreamSettings::new().with_backoff(Duration::ZERO, Duration::ZERO))
        .with_reply_cooldown(Duration::ZERO)
}

fn session<'a>(
    platform: FakePlatform,
    generator: FakeGenerator,
    operator: &'a mut Operator,
    cancel: CancelFlag,
) -> Session<FakePlatform, FakeGenerator, &'a mut Operator> {
    let handled = seed_handled_set(&platform).unwrap();
    Session::new(
        platform,
        generator,
        operator,
        MonitorConfig::new("all", "kangaroo").unwrap(),
        handled,
        cancel,
    )
    .with_settings(settings())
}

#[test]
fn test_decline_exit_resumes_with_handled_set_preserved() {
    let cancel = CancelFlag::new();
    let platform = FakePlatform::new(
        vec![
            Poll::Posts(vec![post("p1", "nothing to see")]),
            Poll::Interrupt,
            Poll::Posts(vec![post("p2", "a kangaroo hopped by")]),
            Poll::Interrupt,
        ],
        &cancel,
    )
    .with_history(vec![HistoryEntry::post("old")]);
    let generator = FakeGenerator::new(vec![CompletionResponse::with_text("Kangaroos are marsupials.")]);
    let mut operator = Operator::answering_exit(vec![Ok(false), Ok(true)]);

    let mut session = session(platform, generator, &mut operator, cancel.clone());
    let summary = session.run().unwrap();

    assert_eq!(session.state(), SessionState::Terminated);
    assert!(session.handled().contains(&"old".into()));
    assert!(session.handled().contains(&"p2".into()));
    assert_eq!(summary.handled, 2);
    // Seen counter restarted after the declined exit.
    assert_eq!(summary.seen, 1);
    assert_eq!(session.passes(), 3);
    assert_eq!(
        *session.source().replies.borrow(),
        vec![("p2".to_string(), "Kangaroos are marsupials.".to_string())]
    );
    drop(session);
    assert_eq!(operator.seen_counts, vec![1, 1]);
}

#[test]
fn test_redelivered_item_is_replied_to_once() {
    let cancel = CancelFlag::new();
    let platform = FakePlatform::new(
        vec![
            Poll::Posts(vec![post("p1", "kangaroo!")]),
            Poll::Posts(vec![post("p1", "kangaroo!")]),
        ],
        &cancel,
    );
    let generator = FakeGenerator::new(vec![CompletionResponse::with_text("G'day.")]);
    let calls = Rc::clone(&generator.calls);
    let mut operator = Operator::default();

    let mut session = session(platform, generator, &mut operator, cancel);
    session.run().unwrap();

    assert_eq!(session.source().replies.borrow().len(), 1);
    assert_eq!(*calls.borrow(), 1);
    drop(session);
    assert_eq!(operator.reviewed, vec!["p1"]);
}

#[test]
fn test_history_prevents_reply_after_restart() {
    let cancel = CancelFlag::new();
    let platform = FakePlatform::new(vec![Poll::Posts(vec![post("p1", "kangaroo")])], &cancel)
        .with_history(vec![HistoryEntry::comment("my_reply", "p1")]);
    let generator = FakeGenerator::new(vec![CompletionResponse::with_text("again?")]);
    let mut operator = Operator::default();

    let mut session = session(platform, generator, &mut operator, cancel);
    session.run().unwrap();

    assert!(session.source().replies.borrow().is_empty());
}

#[test]
fn test_comment_match_gets_reply() {
    let cancel = CancelFlag::new();
    let platform = FakePlatform::new(vec![Poll::Posts(vec![post("p1", "plain post")])], &cancel)
        .with_comments(
            "p1",
            vec![
                CommentNode::More {
                    count: 2,
                    children: vec!["x".into()],
                },
                comment("c1", "p1", "I saw a kangaroo today"),
            ],
        );
    let generator = FakeGenerator::new(vec![CompletionResponse::with_text("Kangaroos are marsupials.")]);
    let mut operator = Operator::default();

    let mut session = session(platform, generator, &mut operator, cancel);
    let summary = session.run().unwrap();

    assert_eq!(
        *session.source().replies.borrow(),
        vec![("c1".to_string(), "Kangaroos are marsupials.".to_string())]
    );
    assert!(session.handled().contains(&"c1".into()));
    assert_eq!(summary.handled, 1);
}

#[test]
fn test_malformed_response_ends_pass_without_reply() {
    let cancel = CancelFlag::new();
    let platform = FakePlatform::new(
        vec![
            Poll::Posts(vec![post("p1", "kangaroo")]),
            // The next subscription re-reads the listing and sees p1 again.
            Poll::Posts(vec![post("p1", "kangaroo")]),
        ],
        &cancel,
    );
    let generator = FakeGenerator::new(vec![
        CompletionResponse::default(),
        CompletionResponse::with_text("Second try."),
    ]);
    let mut operator = Operator::default();

    let mut session = session(platform, generator, &mut operator, cancel);
    session.run().unwrap();

    assert_eq!(
        *session.source().replies.borrow(),
        vec![("p1".to_string(), "Second try.".to_string())]
    );
    drop(session);
    assert_eq!(operator.outcomes[0], ReplyOutcome::NoReply);
    assert!(operator.outcomes[1].is_replied());
}

#[test]
fn test_submission_failure_is_fatal() {
    let cancel = CancelFlag::new();
    let mut platform = FakePlatform::new(vec![Poll::Posts(vec![post("p1", "kangaroo")])], &cancel);
    platform.fail_submit = true;
    let generator = FakeGenerator::new(vec![CompletionResponse::with_text("hello")]);
    let mut operator = Operator::default();

    let mut session = session(platform, generator, &mut operator, cancel);
    let err = session.run().unwrap_err();

    assert!(matches!(err, BotError::Submission(_)));
    assert!(session.handled().is_empty());
    assert_eq!(session.state(), SessionState::Running);
}

#[test]
fn test_interrupt_at_exit_prompt_terminates() {
    let cancel = CancelFlag::new();
    let platform = FakePlatform::new(vec![Poll::Interrupt], &cancel);
    let generator = FakeGenerator::new(vec![]);
    let mut operator = Operator::answering_exit(vec![Err(BotError::Interrupted)]);

    let mut session = session(platform, generator, &mut operator, cancel);
    let summary = session.run().unwrap();

    assert_eq!(session.state(), SessionState::Terminated);
    assert_eq!(summary.seen, 0);

    // Terminated is absorbing.
    let again = session.run().unwrap();
    assert_eq!(again, summary);
}

#[test]
fn test_prompt_failure_propagates() {
    let cancel = CancelFlag::new();
    let platform = FakePlatform::new(vec![Poll::Interrupt], &cancel);
    let generator = FakeGenerator::new(vec![]);
    let mut operator = Operator::answering_exit(vec![Err(BotError::Prompt("stdin closed".into()))]);

    let mut session = session(platform, generator, &mut operator, cancel);
    assert!(matches!(session.run(), Err(BotError::Prompt(_))));
}

#[test]
fn test_summary_reports_launch_time() {
    let cancel = CancelFlag::new();
    let platform = FakePlatform::new(vec![Poll::Interrupt], &cancel);
    let generator = FakeGenerator::new(vec![]);
    let mut operator = Operator::default();
    let launched = chrono::Local::now() - chrono::Duration::minutes(5);

    let mut session =
        session(platform, generator, &mut operator, cancel).with_started_at(launched);
    let summary = session.run().unwrap();

    assert_eq!(summary.started_at, launched);
    assert!(summary.elapsed() >= chrono::Duration::minutes(5));
    assert!(summary.elapsed_hms().starts_with("00:05:"));
}
