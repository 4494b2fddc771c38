//! Stream dispatcher.
//!
//! Turns the platform's "newest posts" listing into a lazy, ordered stream
//! of items. Each post is followed by the live comments attached to it.
//! There is no resume-from-offset: a new dispatcher starts from whatever the
//! listing shows at subscription time.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use tracing::{debug, trace};

use replybot_models::{Comment, CommentNode, Item, ItemId, Post};

use crate::cancel::CancelFlag;
use crate::dedup::SeenSet;
use crate::error::Result;
use crate::traits::ContentSource;

/// How many recently yielded post ids a subscription remembers.
pub const RECENT_IDS_CAPACITY: usize = 301;

/// Stream polling settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamSettings {
    /// Posts requested per listing poll.
    pub fetch_limit: usize,
    /// First wait after an empty poll.
    pub min_backoff: Duration,
    /// Longest wait between empty polls.
    pub max_backoff: Duration,
    /// Ignore posts already present when the stream starts.
    pub skip_existing: bool,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            fetch_limit: 100,
            min_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(16),
            skip_existing: false,
        }
    }
}

impl StreamSettings {
    /// Creates settings with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the backoff bounds.
    pub fn with_backoff(mut self, min: Duration, max: Duration) -> Self {
        self.min_backoff = min;
        self.max_backoff = max.max(min);
        self
    }

    /// Sets whether pre-existing posts are skipped.
    pub fn with_skip_existing(mut self, skip: bool) -> Self {
        self.skip_existing = skip;
        self
    }
}

/// Insertion-ordered set that forgets its oldest member when full.
#[derive(Debug)]
struct RecentIds {
    order: VecDeque<ItemId>,
    members: HashSet<ItemId>,
    capacity: usize,
}

impl RecentIds {
    fn new(capacity: usize) -> Self {
        Self {
            order: VecDeque::with_capacity(capacity),
            members: HashSet::with_capacity(capacity),
            capacity,
        }
    }

    /// Returns true if `id` was not remembered yet.
    fn insert(&mut self, id: &ItemId) -> bool {
        if self.members.contains(id) {
            return false;
        }
        if self.order.len() == self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.members.remove(&oldest);
            }
        }
        self.order.push_back(id.clone());
        self.members.insert(id.clone());
        true
    }
}

/// Doubling delay between empty polls.
#[derive(Debug)]
struct Backoff {
    current: Duration,
    min: Duration,
    max: Duration,
}

impl Backoff {
    fn new(min: Duration, max: Duration) -> Self {
        Self {
            current: min,
            min,
            max,
        }
    }

    fn next_delay(&mut self) -> Duration {
        let delay = self.current;
        self.current = (self.current * 2).min(self.max);
        delay
    }

    fn reset(&mut self) {
        self.current = self.min;
    }
}

/// Pulls items from one collection's live feed.
pub struct StreamDispatcher<'a, S: ContentSource + ?Sized> {
    source: &'a S,
    collection: &'a str,
    settings: &'a StreamSettings,
    cancel: &'a CancelFlag,
    recent: RecentIds,
    backoff: Backoff,
    pending_posts: VecDeque<Post>,
    pending_comments: VecDeque<Comment>,
    /// Last yielded post whose comments have not been fetched yet.
    expand: Option<Post>,
    primed: bool,
}

impl<'a, S: ContentSource + ?Sized> StreamDispatcher<'a, S> {
    /// Subscribes to `collection`'s feed.
    pub fn new(
        source: &'a S,
        collection: &'a str,
        settings: &'a StreamSettings,
        cancel: &'a CancelFlag,
    ) -> Self {
        debug!(collection, "subscribing to stream");
        Self {
            source,
            collection,
            settings,
            cancel,
            recent: RecentIds::new(RECENT_IDS_CAPACITY),
            backoff: Backoff::new(settings.min_backoff, settings.max_backoff),
            pending_posts: VecDeque::new(),
            pending_comments: VecDeque::new(),
            expand: None,
            primed: false,
        }
    }

    /// Blocks until the next item is available.
    ///
    /// Returns `Ok(None)` once cancellation is observed. Every yielded
    /// identifier is recorded in `seen`.
    pub fn pull(&mut self, seen: &mut SeenSet) -> Result<Option<Item>> {
        loop {
            if self.cancel.is_cancelled() {
                debug!("stream pull cancelled");
                return Ok(None);
            }

            if let Some(comment) = self.pending_comments.pop_front() {
                return Ok(Some(Self::emit(Item::Comment(comment), seen)));
            }

            if let Some(post) = self.expand.take() {
                self.queue_comments(&post)?;
                continue;
            }

            if let Some(post) = self.pending_posts.pop_front() {
                self.expand = Some(post.clone());
                return Ok(Some(Self::emit(Item::Post(post), seen)));
            }

            if !self.poll_feed()? {
                let delay = self.backoff.next_delay();
                trace!(delay_ms = delay.as_millis() as u64, "no new posts, backing off");
                if self.cancel.wait(delay) {
                    debug!("stream wait cancelled");
                    return Ok(None);
                }
            }
        }
    }

    fn emit(item: Item, seen: &mut SeenSet) -> Item {
        seen.record(item.id());
        trace!(id = %item.id(), kind = ?item.kind(), "item pulled");
        item
    }

    /// Queues the actionable comments of `post`.
    fn queue_comments(&mut self, post: &Post) -> Result<()> {
        let nodes = self.source.comments(post)?;
        let total = nodes.len();
        self.pending_comments
            .extend(nodes.into_iter().filter_map(CommentNode::into_comment));
        trace!(
            post_id = %post.id,
            nodes = total,
            comments = self.pending_comments.len(),
            "comments fetched"
        );
        Ok(())
    }

    /// Polls the listing once. Returns true if new posts were queued.
    fn poll_feed(&mut self) -> Result<bool> {
        let posts = self
            .source
            .new_posts(self.collection, self.settings.fetch_limit)?;

        let recent = &mut self.recent;
        let fresh: Vec<Post> = posts.into_iter().filter(|p| recent.insert(&p.id)).collect();

        let priming = !self.primed;
        self.primed = true;
        if priming && self.settings.skip_existing {
            debug!(skipped = fresh.len(), "skipping posts present at subscription");
            return Ok(false);
        }

        if fresh.is_empty() {
            return Ok(false);
        }

        trace!(new_posts = fresh.len(), "feed polled");
        self.backoff.reset();
        // Listing is newest first; deliver in arrival order.
        self.pending_posts.extend(fresh.into_iter().rev());
        Ok(true)
    }
}
