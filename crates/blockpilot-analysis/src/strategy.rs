//! Strategy advice from a structured game state.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{Difficulty, GameState};
use crate::provider::{ChatModel, ChatRequest, Message};

const SYSTEM_PROMPT: &str =
    "你是一个俄罗斯方块策略专家，基于游戏状态提供专业的策略建议。\n请用中文回复，提供具体、可操作的建议。";

/// Strategy advice configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Whether to log raw model replies
    pub verbose: bool,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 25,
            verbose: false,
        }
    }
}

/// Strategy advice for one game state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StrategyAdvice {
    /// The model's advice text
    pub analysis: String,
    /// Difficulty the advice targets
    pub difficulty: Difficulty,
    /// How many future pieces were considered
    pub next_pieces_considered: usize,
    /// When the advice was produced
    pub timestamp: DateTime<Utc>,
}

/// Produces strategy advice from game states.
pub struct StrategyAdvisor<M> {
    config: StrategyConfig,
    model: M,
}

impl<M: ChatModel> StrategyAdvisor<M> {
    /// Create an advisor with default configuration.
    pub fn new(model: M) -> Self {
        Self::with_config(StrategyConfig::default(), model)
    }

    /// Create an advisor with the given configuration.
    pub fn with_config(config: StrategyConfig, model: M) -> Self {
        Self { config, model }
    }

    /// Ask for advice on a game state.
    ///
    /// # Arguments
    ///
    /// * `game_state` - The state to advise on
    /// * `difficulty` - Target difficulty level
    /// * `next_pieces` - How many future pieces to consider
    pub async fn advise(
        &self,
        game_state: &GameState,
        difficulty: Difficulty,
        next_pieces: usize,
    ) -> AnalysisResult<StrategyAdvice> {
        let prompt = build_strategy_prompt(game_state, difficulty, next_pieces)?;

        let request = ChatRequest {
            model: self.model.model_id().to_string(),
            messages: vec![Message::system(SYSTEM_PROMPT), Message::user_text(prompt)],
            temperature: None,
            max_tokens: None,
        };

        let response = tokio::time::timeout(
            Duration::from_secs(self.config.timeout_seconds),
            self.model.chat(request),
        )
        .await
        .map_err(|_| AnalysisError::Timeout(self.config.timeout_seconds))??;

        if self.config.verbose {
            debug!("strategy reply: {}", response.content);
        }

        Ok(StrategyAdvice {
            analysis: response.content,
            difficulty,
            next_pieces_considered: next_pieces,
            timestamp: Utc::now(),
        })
    }
}

/// Build the strategy prompt from a serialized game state.
fn build_strategy_prompt(
    game_state: &GameState,
    difficulty: Difficulty,
    next_pieces: usize,
) -> AnalysisResult<String> {
    let state_json = serde_json::to_string_pretty(game_state)?;

    Ok(format!(
        "基于以下俄罗斯方块游戏状态，提供{}难度的策略建议：\n\n\
         游戏状态: {}\n\n\
         考虑未来{}个方块的策略。\n\n\
         请提供：\n\
         1. 立即行动建议 - 具体的移动操作\n\
         2. 中期策略规划 - 未来几步的布局思路\n\
         3. 风险预警 - 需要注意的危险情况\n\
         4. 机会识别 - 可以利用的优势机会\n\
         5. 分数优化建议 - 如何最大化得分\n\n\
         请用中文回复，提供具体、可操作的建议。",
        difficulty.as_str(),
        state_json,
        next_pieces
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ChatResponse;
    use async_trait::async_trait;

    struct ScriptedModel {
        reply: String,
    }

    #[async_trait]
    impl ChatModel for ScriptedModel {
        fn model_id(&self) -> &str {
            "scripted"
        }

        async fn chat(&self, _request: ChatRequest) -> AnalysisResult<ChatResponse> {
            Ok(ChatResponse {
                content: self.reply.clone(),
                model: "scripted".to_string(),
                usage: None,
            })
        }
    }

    #[test]
    fn test_prompt_embeds_state_and_parameters() {
        let state = GameState {
            current_score: Some(1500),
            next_piece: Some("L".to_string()),
            ..GameState::default()
        };

        let prompt = build_strategy_prompt(&state, Difficulty::Advanced, 3).unwrap();
        assert!(prompt.contains("advanced"));
        assert!(prompt.contains("未来3个方块"));
        assert!(prompt.contains("1500"));
        assert!(prompt.contains("\"L\""));
    }

    #[tokio::test]
    async fn test_advise_round_trip() {
        let advisor = StrategyAdvisor::new(ScriptedModel {
            reply: "优先清理左侧低谷。".to_string(),
        });

        let advice = advisor
            .advise(&GameState::default(), Difficulty::Beginner, 2)
            .await
            .unwrap();

        assert_eq!(advice.analysis, "优先清理左侧低谷。");
        assert_eq!(advice.difficulty, Difficulty::Beginner);
        assert_eq!(advice.next_pieces_considered, 2);
    }
}
