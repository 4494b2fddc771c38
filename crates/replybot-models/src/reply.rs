//! Reply request types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ids::ItemId;

/// Instruction offered to the operator when none is typed.
pub const DEFAULT_INSTRUCTION: &str =
    "Reply to the following directly and as an expert in under 50 words:";

/// Suffix appended after the item text in every prompt.
const PROMPT_SUFFIX: &str = "Reply:";

/// Generation model tier, from highest quality/cost to lowest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelTier {
    /// Most capable, most expensive.
    #[default]
    Davinci,
    /// Capable and faster.
    Curie,
    /// Straightforward tasks.
    Babbage,
    /// Fastest and cheapest.
    Ada,
}

impl ModelTier {
    /// All tiers, in the order they are offered to the operator.
    pub const ALL: [ModelTier; 4] = [
        ModelTier::Davinci,
        ModelTier::Curie,
        ModelTier::Babbage,
        ModelTier::Ada,
    ];

    /// Short name shown in prompts and accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        match self {
            ModelTier::Davinci => "davinci",
            ModelTier::Curie => "curie",
            ModelTier::Babbage => "babbage",
            ModelTier::Ada => "ada",
        }
    }

    /// Model identifier sent to the completion endpoint.
    pub fn model_id(self) -> &'static str {
        match self {
            ModelTier::Davinci => "text-davinci-003",
            ModelTier::Curie => "text-curie-001",
            ModelTier::Babbage => "text-babbage-001",
            ModelTier::Ada => "text-ada-001",
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ModelTier::ALL
            .into_iter()
            .find(|tier| tier.name() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown model '{}', expected one of: davinci, curie, babbage, ada",
                    s.trim()
                )
            })
    }
}

/// A reply request built for one matched item.
///
/// Constructed per match and dropped once the reply completes or fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplyRequest {
    /// Item being replied to.
    pub item_id: ItemId,
    /// Free-text instruction prepended to the item text.
    pub instruction: String,
    /// Selected model tier.
    pub model: ModelTier,
}

impl ReplyRequest {
    /// Creates a new reply request.
    pub fn new(item_id: ItemId, instruction: impl Into<String>, model: ModelTier) -> Self {
        Self {
            item_id,
            instruction: instruction.into(),
            model,
        }
    }

    /// Builds the generation prompt for the given item text.
    pub fn prompt(&self, item_text: &str) -> String {
        format!("{}{}{}", self.instruction, item_text, PROMPT_SUFFIX)
    }
}
