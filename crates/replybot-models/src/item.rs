//! Stream item types.
//!
//! Items are produced by the content source and never constructed by the
//! monitoring engine itself. They are immutable once observed.

use serde::{Deserialize, Serialize};

use crate::ids::ItemId;

/// Kind of a stream item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    /// A top-level post in a collection.
    Post,
    /// A comment attached to a post.
    Comment,
}

impl ItemKind {
    /// Platform type prefix used to build fullnames.
    pub fn type_prefix(self) -> &'static str {
        match self {
            ItemKind::Post => "t3",
            ItemKind::Comment => "t1",
        }
    }
}

/// A post observed on the live feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    /// Platform-assigned id.
    pub id: ItemId,
    /// Collection (subreddit) the post was made in.
    pub collection: String,
    /// Post title.
    #[serde(default)]
    pub title: String,
    /// Self-text body; empty for link posts.
    #[serde(default)]
    pub selftext: String,
    /// Author name, if not deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// A comment attached to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    /// Platform-assigned id.
    pub id: ItemId,
    /// Id of the post this comment belongs to.
    pub post_id: ItemId,
    /// Id of the direct parent (post or comment).
    pub parent_id: ItemId,
    /// Comment body.
    pub body: String,
    /// Author name, if not deleted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
}

/// A post or comment observed from the stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Item {
    /// A top-level post.
    Post(Post),
    /// A comment on a post.
    Comment(Comment),
}

impl Item {
    /// Returns the item's identifier.
    pub fn id(&self) -> &ItemId {
        match self {
            Item::Post(post) => &post.id,
            Item::Comment(comment) => &comment.id,
        }
    }

    /// Returns the text that keyword matching runs against.
    ///
    /// Posts match on their self-text, comments on their body.
    pub fn text(&self) -> &str {
        match self {
            Item::Post(post) => &post.selftext,
            Item::Comment(comment) => &comment.body,
        }
    }

    /// Returns the item kind.
    pub fn kind(&self) -> ItemKind {
        match self {
            Item::Post(_) => ItemKind::Post,
            Item::Comment(_) => ItemKind::Comment,
        }
    }

    /// Returns the prefixed fullname used when replying (`t3_<id>` / `t1_<id>`).
    pub fn fullname(&self) -> String {
        format!("{}_{}", self.kind().type_prefix(), self.id())
    }

    /// One-line description for the operator console.
    ///
    /// Posts show their title, comments the start of their body; both are
    /// cut at [`SUMMARY_WIDTH`] characters.
    pub fn summary_line(&self) -> String {
        let (label, text) = match self {
            Item::Post(post) => ("post", post.title.as_str()),
            Item::Comment(comment) => ("comment", comment.body.as_str()),
        };
        let text = text.lines().next().unwrap_or("").trim();
        let shown: String = text.chars().take(SUMMARY_WIDTH).collect();
        let ellipsis = if text.chars().count() > SUMMARY_WIDTH {
            "..."
        } else {
            ""
        };
        format!("[{} {}] {}{}", label, self.id(), shown, ellipsis)
    }
}

/// Maximum characters of text in [`Item::summary_line`].
pub const SUMMARY_WIDTH: usize = 60;

impl From<Post> for Item {
    fn from(post: Post) -> Self {
        Item::Post(post)
    }
}

impl From<Comment> for Item {
    fn from(comment: Comment) -> Self {
        Item::Comment(comment)
    }
}

/// One node of a post's flattened comment listing.
///
/// Only [`CommentNode::Comment`] is actionable; the other variants are
/// placeholders the platform returns in place of real comments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommentNode {
    /// A live comment.
    Comment(Comment),
    /// A deleted or removed comment.
    Deleted {
        /// Id of the deleted comment.
        id: ItemId,
    },
    /// A "load more comments" placeholder.
    More {
        /// Number of comments hidden behind the placeholder.
        count: u64,
        /// Ids of the hidden children.
        children: Vec<ItemId>,
    },
}

impl CommentNode {
    /// Returns the comment if this node is actionable.
    pub fn into_comment(self) -> Option<Comment> {
        match self {
            CommentNode::Comment(comment) => Some(comment),
            CommentNode::Deleted { .. } | CommentNode::More { .. } => None,
        }
    }
}

/// A post or comment previously authored by the bot account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Id of the authored item.
    pub id: ItemId,
    /// Whether it is a post or a comment.
    pub kind: ItemKind,
    /// For comments: the item that was replied to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ItemId>,
}

impl HistoryEntry {
    /// Creates a history entry for an authored comment.
    pub fn comment(id: impl Into<ItemId>, parent_id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::Comment,
            parent_id: Some(parent_id.into()),
        }
    }

    /// Creates a history entry for an authored post.
    pub fn post(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::Post,
            parent_id: None,
        }
    }
}
