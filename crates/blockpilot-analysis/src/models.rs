//! Data models for vision analysis results.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How detailed the vision analysis should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    /// Basic game-state readout
    Basic,
    /// Medium detail with main risks and opportunities
    Detailed,
    /// Full detail with multi-step look-ahead
    Expert,
}

impl DetailLevel {
    /// Lowercase name used in prompts and configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            DetailLevel::Basic => "basic",
            DetailLevel::Detailed => "detailed",
            DetailLevel::Expert => "expert",
        }
    }
}

impl Default for DetailLevel {
    fn default() -> Self {
        DetailLevel::Detailed
    }
}

/// Difficulty level for strategy advice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    /// Beginner-friendly advice
    Beginner,
    /// Intermediate advice
    Intermediate,
    /// Advanced advice
    Advanced,
}

impl Difficulty {
    /// Lowercase name used in prompts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Beginner => "beginner",
            Difficulty::Intermediate => "intermediate",
            Difficulty::Advanced => "advanced",
        }
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Intermediate
    }
}

/// Structured game state extracted from a board screenshot.
///
/// Field types stay loose on purpose: the state is whatever the model
/// reported, nulled where it reported nothing. `active_piece` keeps its raw
/// JSON shape since models vary in how they describe position and rotation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameState {
    /// Current score
    #[serde(default)]
    pub current_score: Option<i64>,
    /// Current level
    #[serde(default)]
    pub current_level: Option<i64>,
    /// Lines cleared so far
    #[serde(default)]
    pub lines_cleared: Option<i64>,
    /// Next piece letter (I, J, L, O, S, T, Z)
    #[serde(default)]
    pub next_piece: Option<String>,
    /// Piece letter in the hold slot, if any
    #[serde(default)]
    pub hold_piece: Option<String>,
    /// Game status (playing, paused, game_over)
    #[serde(default)]
    pub game_status: Option<String>,
    /// Free-form description of the 10x20 board layout
    #[serde(default)]
    pub board_state: Option<String>,
    /// Active piece description (type, position, rotation)
    #[serde(default)]
    pub active_piece: Option<serde_json::Value>,
    /// Identified risks
    #[serde(default)]
    pub risks: Vec<String>,
    /// Identified opportunities
    #[serde(default)]
    pub opportunities: Vec<String>,
    /// Recommended next moves
    #[serde(default)]
    pub recommended_actions: Vec<String>,
}

/// Why a model reply could not be parsed into a [`GameState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsingStatus {
    /// The reply carried no JSON object at all
    JsonNotFound,
    /// A JSON object was found but did not parse
    JsonParseError,
}

/// What came out of a vision analysis reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum VisionOutcome {
    /// Structured state extracted from the reply
    Parsed(GameState),
    /// The reply was kept as raw text
    Text {
        /// The unparsed analysis text
        analysis: String,
        /// Why parsing fell back to text
        parsing_status: ParsingStatus,
    },
}

/// Result of one vision analysis round trip.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionAnalysis {
    /// The model's raw reply
    pub raw_response: String,
    /// Parsed state or text fallback
    pub outcome: VisionOutcome,
    /// Detail level the analysis ran at
    pub detail_level: DetailLevel,
    /// When the analysis completed
    pub timestamp: DateTime<Utc>,
}

impl VisionAnalysis {
    /// The structured game state, if one was extracted.
    pub fn game_state(&self) -> Option<&GameState> {
        match &self.outcome {
            VisionOutcome::Parsed(state) => Some(state),
            VisionOutcome::Text { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_level_names() {
        assert_eq!(DetailLevel::Basic.as_str(), "basic");
        assert_eq!(DetailLevel::default(), DetailLevel::Detailed);
        assert_eq!(DetailLevel::Expert.as_str(), "expert");
    }

    #[test]
    fn test_difficulty_names() {
        assert_eq!(Difficulty::default().as_str(), "intermediate");
    }

    #[test]
    fn test_game_state_tolerates_missing_fields() {
        let state: GameState = serde_json::from_str(r#"{"current_score": 1200}"#).unwrap();
        assert_eq!(state.current_score, Some(1200));
        assert!(state.next_piece.is_none());
        assert!(state.risks.is_empty());
    }

    #[test]
    fn test_game_state_keeps_loose_active_piece() {
        let state: GameState = serde_json::from_str(
            r#"{"active_piece": {"type": "T", "position": [4, 0], "rotation": 2}}"#,
        )
        .unwrap();
        let active = state.active_piece.unwrap();
        assert_eq!(active["type"], "T");
    }
}
