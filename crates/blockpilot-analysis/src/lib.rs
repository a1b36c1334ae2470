//! Tetris board analysis for blockpilot.
//!
//! Turns an attached board screenshot into a structured game state via a
//! multimodal chat model, and a game state into strategy advice:
//! - Payload intake with byte-level format verification and a size cap
//! - Multimodal chat message construction (data URL + analysis prompt)
//! - JSON extraction from free-form model replies, with text fallbacks
//! - Strategy prompt construction with difficulty and look-ahead depth

pub mod config;
pub mod error;
pub mod models;
pub mod provider;
pub mod strategy;
pub mod vision;

pub use config::AnalysisConfig;
pub use error::{AnalysisError, AnalysisResult};
pub use models::{
    DetailLevel, Difficulty, GameState, ParsingStatus, VisionAnalysis, VisionOutcome,
};
pub use provider::{
    ChatModel, ChatRequest, ChatResponse, ContentPart, ImageUrl, Message, MessageContent,
    OpenAiCompatibleModel, TokenUsage,
};
pub use strategy::{StrategyAdvice, StrategyAdvisor, StrategyConfig};
pub use vision::{ImageInput, VisionAnalyzer, VisionConfig};
