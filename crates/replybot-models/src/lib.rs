//! Core data models for replybot.
//!
//! This crate provides the plain data types shared by the monitoring engine
//! and the platform clients: stream items, the bot's own history, the
//! monitor configuration and the reply request built for each match.

pub mod ids;
pub mod item;
pub mod monitor;
pub mod reply;

// Re-export main types
pub use ids::ItemId;
pub use item::{Comment, CommentNode, HistoryEntry, Item, ItemKind, Post, SUMMARY_WIDTH};
pub use monitor::{ConfigError, MonitorConfig, DEFAULT_COLLECTION, DEFAULT_KEYWORD};
pub use reply::{ModelTier, ReplyRequest, DEFAULT_INSTRUCTION};
