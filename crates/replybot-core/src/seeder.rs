//! Identity seeding from the account's own history.

use tracing::{debug, info};

use replybot_models::{HistoryEntry, ItemKind};

use crate::dedup::HandledSet;
use crate::error::{BotError, Result};
use crate::traits::ContentSource;

/// Builds the handled set from the account's reply history.
///
/// A failure to fetch history is fatal: starting without it would risk
/// replying twice to the same item.
pub fn seed_handled_set<S: ContentSource + ?Sized>(source: &S) -> Result<HandledSet> {
    let history = source
        .own_history()
        .map_err(|e| BotError::Startup(format!("failed to fetch account history: {}", e)))?;

    let handled = handled_from_history(&history);
    info!(
        history_entries = history.len(),
        handled = handled.len(),
        "handled set seeded from account history"
    );
    Ok(handled)
}

/// Collects every historical identifier into a fresh handled set.
///
/// Authored comments also contribute their parent, the item that was
/// replied to. Overlapping entries collapse into a single member.
pub fn handled_from_history(history: &[HistoryEntry]) -> HandledSet {
    let mut handled = HandledSet::new();
    for entry in history {
        handled.insert(entry.id.clone());
        if entry.kind == ItemKind::Comment {
            if let Some(parent) = &entry.parent_id {
                handled.insert(parent.clone());
            }
        }
    }
    debug!(handled = handled.len(), "handled set built");
    handled
}
