//! Identifier newtypes.

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Platform-assigned identifier of a post or comment.
///
/// Always the bare base-36 id (`abc123`), never the prefixed fullname
/// (`t1_abc123`). Use [`ItemId::from_fullname`] when the platform hands out
/// a fullname.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(String);

impl ItemId {
    /// Creates an id from a bare identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Creates an id from a fullname, stripping a `tN_` prefix if present.
    pub fn from_fullname(fullname: &str) -> Self {
        match fullname.split_once('_') {
            Some((prefix, rest))
                if prefix.len() == 2 && prefix.starts_with('t') && !rest.is_empty() =>
            {
                Self(rest.to_string())
            }
            _ => Self(fullname.to_string()),
        }
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for ItemId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
