//! Keyword matcher.

use replybot_models::Item;

use crate::dedup::HandledSet;

/// Returns true if `item` should be offered for a reply.
///
/// An item is eligible iff `keyword` occurs in its text (case-sensitive
/// substring) and its identifier has not been handled yet. Posts and
/// comments are treated alike through [`Item::text`].
pub fn is_eligible(item: &Item, keyword: &str, handled: &HandledSet) -> bool {
    item.text().contains(keyword) && !handled.contains(item.id())
}
