//! Board screenshot analysis through a multimodal chat model.
//!
//! Takes a screenshot (already-encoded data URL, file path, or raw bytes),
//! verifies the payload, embeds it in a multimodal chat request, and parses
//! the model's reply into a [`GameState`]. Replies that carry no usable JSON
//! degrade to a text outcome instead of an error.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

use blockpilot_images::{encode_data_url, EncodedImage, ImageFormat};
use chrono::Utc;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{AnalysisError, AnalysisResult};
use crate::models::{DetailLevel, GameState, ParsingStatus, VisionAnalysis, VisionOutcome};
use crate::provider::{ChatModel, ChatRequest, Message};

/// System prompt fixing the JSON reply contract.
const SYSTEM_PROMPT: &str = "你是一个专业的俄罗斯方块游戏分析师，专门分析游戏截图并提取游戏状态信息。\n请严格按照JSON格式回复，包含以下字段：\n- current_score: 当前分数\n- current_level: 当前等级\n- lines_cleared: 已消除行数\n- next_piece: 下一个方块类型\n- hold_piece: Hold区域中的方块类型\n- game_status: 游戏状态\n- board_state: 棋盘状态描述\n- active_piece: 当前活跃方块信息\n- risks: 风险分析\n- opportunities: 机会分析\n- recommended_actions: 推荐操作";

/// Vision analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionConfig {
    /// Maximum screenshot size in bytes (5 MiB)
    pub max_file_size: u64,
    /// Acceptable screenshot formats
    pub supported_formats: Vec<String>,
    /// Default analysis detail level
    pub detail_level: DetailLevel,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// Whether to log raw model replies
    pub verbose: bool,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            max_file_size: 5 * 1024 * 1024,
            supported_formats: vec![
                "jpg".to_string(),
                "jpeg".to_string(),
                "png".to_string(),
                "webp".to_string(),
            ],
            detail_level: DetailLevel::default(),
            timeout_seconds: 60,
            verbose: true,
        }
    }
}

/// A screenshot in one of the shapes the analyzer accepts.
#[derive(Debug, Clone)]
pub enum ImageInput {
    /// Already encoded by the selection pipeline
    DataUrl(EncodedImage),
    /// A file on disk
    Path(PathBuf),
    /// Raw image bytes
    Bytes(Vec<u8>),
}

/// Analyzes board screenshots into structured game state.
pub struct VisionAnalyzer<M> {
    config: VisionConfig,
    model: M,
}

impl<M: ChatModel> VisionAnalyzer<M> {
    /// Create an analyzer with default configuration.
    pub fn new(model: M) -> Self {
        Self::with_config(VisionConfig::default(), model)
    }

    /// Create an analyzer with the given configuration.
    pub fn with_config(config: VisionConfig, model: M) -> Self {
        Self { config, model }
    }

    /// The active configuration.
    pub fn config(&self) -> &VisionConfig {
        &self.config
    }

    /// Analyze a screenshot.
    ///
    /// # Arguments
    ///
    /// * `input` - The screenshot, in any accepted shape
    /// * `detail_level` - Overrides the configured detail level when set
    ///
    /// # Returns
    ///
    /// The raw reply plus a parsed game state, or a text fallback when the
    /// reply carried no usable JSON.
    pub async fn analyze(
        &self,
        input: ImageInput,
        detail_level: Option<DetailLevel>,
    ) -> AnalysisResult<VisionAnalysis> {
        let data_url = self.prepare_data_url(input).await?;
        let level = detail_level.unwrap_or(self.config.detail_level);

        let request = ChatRequest {
            model: self.model.model_id().to_string(),
            messages: vec![
                Message::system(SYSTEM_PROMPT),
                Message::user_with_image(data_url.into_string(), build_prompt(level)),
            ],
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
            debug!("vision analysis reply: {}", response.content);
        }

        let outcome = parse_outcome(&response.content);
        if let VisionOutcome::Text { parsing_status, .. } = &outcome {
            warn!("vision reply kept as text: {:?}", parsing_status);
        }

        Ok(VisionAnalysis {
            raw_response: response.content,
            outcome,
            detail_level: level,
            timestamp: Utc::now(),
        })
    }

    /// Turn any accepted input shape into a data URL.
    ///
    /// Raw bytes and files are verified here (format allowlist, size cap,
    /// decodability); an input that was already a data URL went through the
    /// selection pipeline's checks and passes through untouched.
    async fn prepare_data_url(&self, input: ImageInput) -> AnalysisResult<EncodedImage> {
        match input {
            ImageInput::DataUrl(encoded) => Ok(encoded),
            ImageInput::Path(path) => {
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|e| AnalysisError::InvalidPayload(e.to_string()))?;
                self.verify_and_encode(&bytes)
            }
            ImageInput::Bytes(bytes) => self.verify_and_encode(&bytes),
        }
    }

    fn verify_and_encode(&self, bytes: &[u8]) -> AnalysisResult<EncodedImage> {
        if bytes.len() as u64 > self.config.max_file_size {
            return Err(AnalysisError::InvalidPayload(format!(
                "screenshot too large: {} bytes",
                bytes.len()
            )));
        }

        let format = ImageFormat::detect_from_bytes(bytes)?;
        let supported = self
            .config
            .supported_formats
            .iter()
            .any(|ext| format.matches_extension(ext));
        if !supported {
            return Err(AnalysisError::InvalidPayload(format!(
                "unsupported screenshot format: {}",
                format.as_str()
            )));
        }

        // The header can lie; make sure the payload actually decodes.
        image::load_from_memory(bytes)
            .map_err(|e| AnalysisError::InvalidPayload(format!("undecodable image: {e}")))?;

        Ok(encode_data_url(format.mime_type(), bytes))
    }
}

/// Build the analysis prompt for a detail level.
fn build_prompt(detail_level: DetailLevel) -> String {
    let mut prompt = format!(
        "请分析这张俄罗斯方块游戏截图，提供详细的游戏状态信息。\n\n\
         需要分析的内容：\n\
         1. 当前游戏状态（playing-进行中, paused-暂停, game_over-游戏结束）\n\
         2. 当前分数、等级和已消除行数\n\
         3. 下一个方块预览和Hold区域中的方块\n\
         4. 游戏区域中现有的方块布局（10x20网格）\n\
         5. 当前活跃的方块位置、类型和方向\n\
         6. 潜在的风险和机会分析\n\
         7. 建议的最佳移动策略\n\n\
         详细程度要求: {}\n\n\
         请用严格的JSON格式回复。",
        detail_level.as_str()
    );

    match detail_level {
        DetailLevel::Expert => {
            prompt.push_str("\n\n额外要求：提供未来3步的预测和详细的策略分析。");
        }
        DetailLevel::Detailed => {
            prompt.push_str("\n\n提供中等详细程度的分析，包括主要风险和机会。");
        }
        DetailLevel::Basic => {}
    }

    prompt
}

/// Extract a [`GameState`] from a free-form model reply.
///
/// Finds the first `{...}` block and parses it; anything else degrades to a
/// text outcome carrying the raw reply and a parsing-status marker.
fn parse_outcome(reply: &str) -> VisionOutcome {
    // Greedy across newlines, like the reply contract expects.
    static JSON_BLOCK: OnceLock<Regex> = OnceLock::new();
    let json_block = JSON_BLOCK
        .get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("valid literal regex"))
        .find(reply)
        .map(|m| m.as_str());

    let Some(json_str) = json_block else {
        return VisionOutcome::Text {
            analysis: reply.to_string(),
            parsing_status: ParsingStatus::JsonNotFound,
        };
    };

    match serde_json::from_str::<GameState>(json_str) {
        Ok(state) => VisionOutcome::Parsed(state),
        Err(_) => VisionOutcome::Text {
            analysis: reply.to_string(),
            parsing_status: ParsingStatus::JsonParseError,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::ChatResponse;
    use async_trait::async_trait;
    use std::io::Cursor;

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

    fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::new(2, 2);
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_parse_outcome_extracts_embedded_json() {
        let reply = "分析如下：\n{\"current_score\": 1200, \"game_status\": \"playing\"}\n请注意堆叠高度。";
        match parse_outcome(reply) {
            VisionOutcome::Parsed(state) => {
                assert_eq!(state.current_score, Some(1200));
                assert_eq!(state.game_status.as_deref(), Some("playing"));
            }
            VisionOutcome::Text { .. } => panic!("expected parsed state"),
        }
    }

    #[test]
    fn test_parse_outcome_without_json_keeps_text() {
        match parse_outcome("棋盘左侧偏高，建议清理。") {
            VisionOutcome::Text {
                analysis,
                parsing_status,
            } => {
                assert_eq!(parsing_status, ParsingStatus::JsonNotFound);
                assert!(analysis.contains("棋盘"));
            }
            VisionOutcome::Parsed(_) => panic!("expected text fallback"),
        }
    }

    #[test]
    fn test_parse_outcome_malformed_json_keeps_text() {
        match parse_outcome("{\"current_score\": }") {
            VisionOutcome::Text { parsing_status, .. } => {
                assert_eq!(parsing_status, ParsingStatus::JsonParseError);
            }
            VisionOutcome::Parsed(_) => panic!("expected text fallback"),
        }
    }

    #[test]
    fn test_prompt_carries_detail_level() {
        let prompt = build_prompt(DetailLevel::Expert);
        assert!(prompt.contains("expert"));
        assert!(prompt.contains("额外要求"));

        let prompt = build_prompt(DetailLevel::Basic);
        assert!(prompt.contains("basic"));
        assert!(!prompt.contains("额外要求"));
    }

    #[test]
    fn test_verify_rejects_wrong_format() {
        let analyzer = VisionAnalyzer::with_config(
            VisionConfig {
                supported_formats: vec!["jpg".to_string()],
                ..VisionConfig::default()
            },
            ScriptedModel {
                reply: String::new(),
            },
        );

        let result = analyzer.verify_and_encode(&tiny_png());
        assert!(matches!(result, Err(AnalysisError::InvalidPayload(_))));
    }

    #[test]
    fn test_verify_rejects_oversized_payload() {
        let analyzer = VisionAnalyzer::with_config(
            VisionConfig {
                max_file_size: 16,
                ..VisionConfig::default()
            },
            ScriptedModel {
                reply: String::new(),
            },
        );

        let result = analyzer.verify_and_encode(&tiny_png());
        assert!(matches!(result, Err(AnalysisError::InvalidPayload(_))));
    }

    #[test]
    fn test_verify_rejects_header_only_payload() {
        let analyzer = VisionAnalyzer::new(ScriptedModel {
            reply: String::new(),
        });

        // A PNG header with no image behind it.
        let result = analyzer.verify_and_encode(&[0x89, 0x50, 0x4e, 0x47, 0x0d, 0x0a, 0x1a, 0x0a]);
        assert!(matches!(result, Err(AnalysisError::InvalidPayload(_))));
    }

    #[tokio::test]
    async fn test_analyze_round_trip() {
        let analyzer = VisionAnalyzer::new(ScriptedModel {
            reply: "{\"current_score\": 900, \"next_piece\": \"T\"}".to_string(),
        });

        let analysis = analyzer
            .analyze(ImageInput::Bytes(tiny_png()), Some(DetailLevel::Basic))
            .await
            .unwrap();

        assert_eq!(analysis.detail_level, DetailLevel::Basic);
        let state = analysis.game_state().unwrap();
        assert_eq!(state.current_score, Some(900));
        assert_eq!(state.next_piece.as_deref(), Some("T"));
    }

    #[tokio::test]
    async fn test_analyze_reads_screenshot_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.png");
        std::fs::write(&path, tiny_png()).unwrap();

        let analyzer = VisionAnalyzer::new(ScriptedModel {
            reply: "{\"game_status\": \"playing\"}".to_string(),
        });

        let analysis = analyzer
            .analyze(ImageInput::Path(path), None)
            .await
            .unwrap();
        assert_eq!(
            analysis.game_state().unwrap().game_status.as_deref(),
            Some("playing")
        );
    }

    #[tokio::test]
    async fn test_analyze_accepts_preencoded_data_url() {
        let analyzer = VisionAnalyzer::new(ScriptedModel {
            reply: "{}".to_string(),
        });

        let encoded = encode_data_url("image/png", &tiny_png());
        let analysis = analyzer
            .analyze(ImageInput::DataUrl(encoded), None)
            .await
            .unwrap();
        assert!(analysis.game_state().is_some());
    }
}
