//! Parsing of Reddit listing payloads.
//!
//! Kept free of I/O so every shape the API returns can be tested from
//! captured JSON.

use std::collections::VecDeque;

use serde::Deserialize;
use serde_json::Value;

use replybot_core::{SourceError, SourceResult};
use replybot_models::{Comment, CommentNode, HistoryEntry, ItemId, Post};

const KIND_COMMENT: &str = "t1";
const KIND_POST: &str = "t3";
const KIND_MORE: &str = "more";

/// Bodies the platform substitutes for deleted or removed comments.
const DELETED_MARKERS: [&str; 2] = ["[deleted]", "[removed]"];

/// A `Listing` envelope.
#[derive(Debug, Deserialize)]
pub struct Listing {
    /// Listing payload.
    pub data: ListingData,
}

/// Listing payload: a page of things plus the pagination cursor.
#[derive(Debug, Default, Deserialize)]
pub struct ListingData {
    /// Fullname to pass as `after` for the next page.
    #[serde(default)]
    pub after: Option<String>,
    /// Things on this page.
    #[serde(default)]
    pub children: Vec<Thing>,
}

/// A typed object (`t1` comment, `t3` post, `more` placeholder, ...).
#[derive(Debug, Clone, Deserialize)]
pub struct Thing {
    /// Type tag.
    pub kind: String,
    /// Raw object data.
    pub data: Value,
}

#[derive(Debug, Deserialize)]
struct PostData {
    id: String,
    #[serde(default)]
    subreddit: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    #[serde(default)]
    author: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommentData {
    id: String,
    #[serde(default)]
    link_id: String,
    #[serde(default)]
    parent_id: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    replies: Value,
}

#[derive(Debug, Deserialize)]
struct MoreData {
    #[serde(default)]
    count: u64,
    #[serde(default)]
    children: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct MeData {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ReplyEnvelope {
    json: ReplyJson,
}

#[derive(Debug, Deserialize)]
struct ReplyJson {
    #[serde(default)]
    errors: Vec<Value>,
}

fn parse_error(context: &str, e: serde_json::Error) -> SourceError {
    SourceError::Parse(format!("{}: {}", context, e))
}

fn live_author(author: Option<String>) -> Option<String> {
    author.filter(|a| a != "[deleted]")
}

fn to_post(data: Value) -> SourceResult<Post> {
    let data: PostData = serde_json::from_value(data).map_err(|e| parse_error("post", e))?;
    Ok(Post {
        id: ItemId::new(data.id),
        collection: data.subreddit,
        title: data.title,
        selftext: data.selftext,
        author: live_author(data.author),
    })
}

/// Parses one page of a post listing, newest first as returned.
pub fn parse_post_listing(listing: Value) -> SourceResult<(Vec<Post>, Option<String>)> {
    let listing: Listing =
        serde_json::from_value(listing).map_err(|e| parse_error("post listing", e))?;
    let posts = listing
        .data
        .children
        .into_iter()
        .filter(|thing| thing.kind == KIND_POST)
        .map(|thing| to_post(thing.data))
        .collect::<SourceResult<Vec<_>>>()?;
    Ok((posts, listing.data.after))
}

/// Flattens the `/comments/{post}` response into listing order.
///
/// The response is `[post_listing, comment_listing]`. Reply trees are
/// walked breadth-first; `more` stubs and deleted comments are kept as
/// placeholders.
pub fn parse_comment_tree(response: Value) -> SourceResult<Vec<CommentNode>> {
    let mut parts: Vec<Value> = serde_json::from_value(response)
        .map_err(|e| parse_error("comment response", e))?;
    if parts.len() < 2 {
        return Err(SourceError::Parse(format!(
            "comment response: expected 2 listings, got {}",
            parts.len()
        )));
    }
    let listing: Listing = serde_json::from_value(parts.swap_remove(1))
        .map_err(|e| parse_error("comment listing", e))?;

    let mut queue: VecDeque<Thing> = listing.data.children.into();
    let mut nodes = Vec::new();

    while let Some(thing) = queue.pop_front() {
        match thing.kind.as_str() {
            KIND_COMMENT => {
                let data: CommentData =
                    serde_json::from_value(thing.data).map_err(|e| parse_error("comment", e))?;
                if data.replies.is_object() {
                    let replies: Listing = serde_json::from_value(data.replies)
                        .map_err(|e| parse_error("comment replies", e))?;
                    queue.extend(replies.data.children);
                }
                if DELETED_MARKERS.contains(&data.body.as_str()) {
                    nodes.push(CommentNode::Deleted {
                        id: ItemId::new(data.id),
                    });
                    continue;
                }
                nodes.push(CommentNode::Comment(Comment {
                    id: ItemId::new(data.id),
                    post_id: ItemId::from_fullname(&data.link_id),
                    parent_id: ItemId::from_fullname(&data.parent_id),
                    body: data.body,
                    author: live_author(data.author),
                }));
            }
            KIND_MORE => {
                let data: MoreData =
                    serde_json::from_value(thing.data).map_err(|e| parse_error("more", e))?;
                nodes.push(CommentNode::More {
                    count: data.count,
                    children: data.children.into_iter().map(ItemId::new).collect(),
                });
            }
            _ => {}
        }
    }

    Ok(nodes)
}

/// Parses one page of the account's own comments or submissions.
pub fn parse_history_page(listing: Value) -> SourceResult<(Vec<HistoryEntry>, Option<String>)> {
    let listing: Listing =
        serde_json::from_value(listing).map_err(|e| parse_error("history listing", e))?;
    let mut entries = Vec::with_capacity(listing.data.children.len());

    for thing in listing.data.children {
        match thing.kind.as_str() {
            KIND_COMMENT => {
                let data: CommentData =
                    serde_json::from_value(thing.data).map_err(|e| parse_error("comment", e))?;
                entries.push(HistoryEntry::comment(
                    data.id,
                    ItemId::from_fullname(&data.parent_id),
                ));
            }
            KIND_POST => {
                let data: PostData =
                    serde_json::from_value(thing.data).map_err(|e| parse_error("post", e))?;
                entries.push(HistoryEntry::post(data.id));
            }
            _ => {}
        }
    }

    Ok((entries, listing.data.after))
}

/// Extracts the account name from `/api/v1/me`.
pub fn parse_me(response: Value) -> SourceResult<String> {
    let me: MeData = serde_json::from_value(response).map_err(|e| parse_error("me", e))?;
    Ok(me.name)
}

/// Checks an `api_type=json` reply response for embedded errors.
pub fn check_reply_response(response: Value) -> SourceResult<()> {
    let envelope: ReplyEnvelope =
        serde_json::from_value(response).map_err(|e| parse_error("reply response", e))?;
    if envelope.json.errors.is_empty() {
        return Ok(());
    }
    let message = envelope
        .json
        .errors
        .iter()
        .map(|e| match e {
            Value::Array(parts) => parts
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(": "),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join("; ");
    Err(SourceError::Api {
        status: 0,
        message,
    })
}
