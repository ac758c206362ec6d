use serde::{Deserialize, Serialize};

/// Which assets of a character the user asked for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SelectionMode {
    /// Every animation in the catalog
    All,
    /// Animations whose name contains the query
    Matching { query: String },
    /// Explicitly picked animation ids
    Selected { ids: Vec<String> },
    /// Only the character model (T-pose, with skin)
    CharacterModel,
}
