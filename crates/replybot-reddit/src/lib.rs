//! Reddit content source for replybot.
//!
//! Implements [`replybot_core::ContentSource`] over the Reddit HTTP API
//! using a script-app OAuth password grant:
//!
//! - `new_posts`: `/r/{collection}/new`
//! - `comments`: `/comments/{post}` flattened breadth-first
//! - `submit_reply`: `/api/comment`
//! - `own_history`: `/user/{me}/comments` and `/user/{me}/submitted`
//!
//! Credentials come from the environment, see [`RedditCredentials`].

pub mod client;
pub mod credentials;
pub mod listing;

pub use client::{RedditClient, RedditEndpoints, DEFAULT_HISTORY_LIMIT};
pub use credentials::RedditCredentials;
