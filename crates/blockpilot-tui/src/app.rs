//! Application state and event loop.
//!
//! One screen: a transcript, a composer with the attach control, and the
//! picker/alert overlays. Attachment reads and board analysis run on spawned
//! tasks and come back through the app's event channel.

use std::io::{self, Stdout};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use blockpilot_analysis::{
    AnalysisConfig, AnalysisResult, Difficulty, GameState, ImageInput, OpenAiCompatibleModel,
    StrategyAdvisor, VisionAnalyzer,
};
use blockpilot_images::{
    EncodedImage, FsImageReader, ImageConfig, ImageReader, ImageSelector, SelectedFile,
};
use crossterm::event::{
    DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::Text;
use ratatui::widgets::{Block, Borders, List, ListItem, Paragraph};
use ratatui::{Frame, Terminal};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::alert;
use crate::attach::AttachControl;
use crate::composer::Composer;
use crate::event::{spawn_input_thread, AppEvent};
use crate::picker::{ImagePickerWidget, PickerOutcome};

const SPINNER_FRAMES: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Connection settings for the external agent backend.
#[derive(Debug, Clone)]
pub struct BackendSettings {
    /// Base URL of the OpenAI-compatible endpoint
    pub base_url: String,
    /// Model id requests are sent for
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_var: String,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8001/v1".to_string(),
            model: "gpt-4o".to_string(),
            api_key_var: "BLOCKPILOT_API_KEY".to_string(),
        }
    }
}

impl BackendSettings {
    /// Read settings from the environment, with defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            base_url: std::env::var("BLOCKPILOT_BASE_URL").unwrap_or(defaults.base_url),
            model: std::env::var("BLOCKPILOT_MODEL").unwrap_or(defaults.model),
            api_key_var: defaults.api_key_var,
        }
    }
}

struct Analyzers {
    vision: VisionAnalyzer<OpenAiCompatibleModel>,
    strategy: StrategyAdvisor<OpenAiCompatibleModel>,
}

/// Who said a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Speaker {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone)]
struct ChatLine {
    speaker: Speaker,
    text: String,
}

impl ChatLine {
    fn user(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
        }
    }

    fn assistant(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
        }
    }

    fn system(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::System,
            text: text.into(),
        }
    }
}

/// The blockpilot TUI application.
pub struct App {
    selector: ImageSelector<FsImageReader>,
    picker: ImagePickerWidget,
    attach_control: AttachControl,
    composer: Composer,
    transcript: Vec<ChatLine>,
    analyzers: Arc<Analyzers>,
    tx: UnboundedSender<AppEvent>,
    rx: UnboundedReceiver<AppEvent>,
    analysis_pending: bool,
    spinner_frame: usize,
    should_quit: bool,
}

impl App {
    /// Build the app: configuration, selection pipeline, analyzers.
    pub fn new() -> Result<Self> {
        let (tx, rx) = mpsc::unbounded_channel();

        let config = ImageConfig::load_with_hierarchy().context("loading image configuration")?;

        let callback_tx = tx.clone();
        let selector = ImageSelector::with_config(
            &config,
            FsImageReader,
            Box::new(move |file, encoded| {
                let _ = callback_tx.send(AppEvent::ImageAttached { file, encoded });
            }),
        );

        let picker = ImagePickerWidget::new(config.formats.supported.clone());

        let settings = BackendSettings::from_env();
        let vision_model = OpenAiCompatibleModel::from_env(
            settings.base_url.clone(),
            settings.model.clone(),
            &settings.api_key_var,
        )?;
        let strategy_model = OpenAiCompatibleModel::from_env(
            settings.base_url.clone(),
            settings.model.clone(),
            &settings.api_key_var,
        )?;

        let analysis_config =
            AnalysisConfig::load_with_hierarchy().context("loading analysis configuration")?;
        let analyzers = Arc::new(Analyzers {
            vision: VisionAnalyzer::with_config(analysis_config.vision, vision_model),
            strategy: StrategyAdvisor::with_config(analysis_config.strategy, strategy_model),
        });

        Ok(Self {
            selector,
            picker,
            attach_control: AttachControl::new(),
            composer: Composer::new(),
            transcript: vec![ChatLine::system(
                "欢迎使用 blockpilot：附加棋盘截图，获取局面分析与策略建议。Ctrl+I 选择图片，Enter 发送。",
            )],
            analyzers,
            tx,
            rx,
            analysis_pending: false,
            spinner_frame: 0,
            should_quit: false,
        })
    }

    /// Run the event loop until quit.
    pub async fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        spawn_input_thread(self.tx.clone());

        let result = self.event_loop(&mut terminal).await;
        restore_terminal(&mut terminal)?;
        result
    }

    async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        while !self.should_quit {
            terminal.draw(|frame| self.render(frame))?;
            let Some(event) = self.rx.recv().await else {
                break;
            };
            self.handle_event(event);
        }
        Ok(())
    }

    fn handle_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Input(Event::Key(key)) if key.kind == KeyEventKind::Press => {
                self.handle_key(key)
            }
            AppEvent::Input(Event::Mouse(mouse)) => self.handle_mouse(mouse),
            AppEvent::Input(_) => {}
            AppEvent::Tick => {
                if self.analysis_pending {
                    self.spinner_frame = self.spinner_frame.wrapping_add(1);
                }
            }
            AppEvent::ReadComplete { file, result } => {
                self.selector.complete_read(file, result);
            }
            AppEvent::ImageAttached { file, encoded } => {
                tracing::debug!(name = %file.name, "attachment ready");
                self.composer.attach(file, encoded);
            }
            AppEvent::AnalysisComplete { lines } => {
                self.analysis_pending = false;
                self.selector.set_disabled(false);
                for text in lines {
                    self.transcript.push(ChatLine::assistant(text));
                }
            }
            AppEvent::AnalysisFailed(message) => {
                self.analysis_pending = false;
                self.selector.set_disabled(false);
                self.transcript
                    .push(ChatLine::system(format!("分析失败：{message}")));
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) {
        // A pending alert blocks everything until dismissed.
        if self.selector.pending_alert().is_some() {
            if alert::dismisses(&key) {
                self.selector.dismiss_alert();
            }
            return;
        }

        if self.picker.is_visible() {
            match self.picker.handle_key(key) {
                PickerOutcome::Chosen(path) => self.file_chosen(path),
                PickerOutcome::Cancelled => self.selector.dismiss_prompt(),
                PickerOutcome::Pending => {}
            }
            return;
        }

        match (key.code, key.modifiers) {
            (KeyCode::Char('c'), KeyModifiers::CONTROL) => self.should_quit = true,
            (KeyCode::Char('i'), KeyModifiers::CONTROL) => self.activate_attach(),
            (KeyCode::Esc, _) => self.should_quit = true,
            (KeyCode::Enter, _) => self.send_message(),
            (KeyCode::Backspace, _) => self.composer.backspace(),
            (KeyCode::Char(c), modifiers)
                if modifiers.is_empty() || modifiers == KeyModifiers::SHIFT =>
            {
                self.composer.insert_char(c)
            }
            _ => {}
        }
    }

    fn handle_mouse(&mut self, mouse: MouseEvent) {
        if self.picker.is_visible() || self.selector.pending_alert().is_some() {
            return;
        }

        match mouse.kind {
            MouseEventKind::Moved => {
                let hovered = self.attach_control.hit(mouse.column, mouse.row);
                self.selector.set_hovered(hovered);
            }
            MouseEventKind::Down(MouseButton::Left) => {
                if self.attach_control.hit(mouse.column, mouse.row) {
                    self.activate_attach();
                }
            }
            _ => {}
        }
    }

    fn activate_attach(&mut self) {
        if self.selector.activate() {
            self.picker.show();
        }
    }

    /// The picker confirmed a file: validate and kick off the read.
    fn file_chosen(&mut self, path: PathBuf) {
        let file = match SelectedFile::from_path(&path) {
            Ok(file) => file,
            Err(err) => {
                tracing::warn!("chosen file unusable: {err}");
                self.selector.dismiss_prompt();
                return;
            }
        };

        if let Some(file) = self.selector.begin_read(Some(file)) {
            let reader = *self.selector.reader();
            let tx = self.tx.clone();
            tokio::spawn(async move {
                let result = reader.read_as_data_url(&file).await;
                let _ = tx.send(AppEvent::ReadComplete { file, result });
            });
        }
    }

    fn send_message(&mut self) {
        if self.analysis_pending {
            self.transcript
                .push(ChatLine::system("分析进行中，请稍候。"));
            return;
        }

        let Some((text, attachment)) = self.composer.take_message() else {
            return;
        };

        let shown = match &attachment {
            Some(att) if text.is_empty() => format!("📷 {}", att.file.name),
            Some(att) => format!("{} 📷 {}", text, att.file.name),
            None => text.clone(),
        };
        self.transcript.push(ChatLine::user(shown));

        let Some(attachment) = attachment else {
            self.transcript.push(ChatLine::system(
                "请先通过 Ctrl+I 附加棋盘截图，再发送进行分析。",
            ));
            return;
        };

        self.analysis_pending = true;
        self.selector.set_disabled(true);

        let analyzers = Arc::clone(&self.analyzers);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let event = match run_analysis(analyzers, attachment.encoded).await {
                Ok(lines) => AppEvent::AnalysisComplete { lines },
                Err(err) => AppEvent::AnalysisFailed(err.to_string()),
            };
            let _ = tx.send(event);
        });
    }

    fn render(&mut self, frame: &mut Frame) {
        let full = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(5),
                Constraint::Length(3),
                Constraint::Length(1),
            ])
            .split(full);

        self.render_transcript(frame, chunks[0]);

        let composer_row = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(10), Constraint::Length(9)])
            .split(chunks[1]);
        self.composer.render(frame, composer_row[0]);

        // Center the control in the composer's middle row.
        let control_area = Rect::new(
            composer_row[1].x,
            composer_row[1].y + 1,
            composer_row[1].width,
            1,
        );
        self.attach_control.render(
            frame,
            control_area,
            self.selector.is_disabled(),
            self.selector.is_hovered(),
        );

        self.render_status(frame, chunks[2]);

        self.picker.render(frame, full);
        if let Some(message) = self.selector.pending_alert() {
            alert::render(frame, full, message);
        }
    }

    fn render_transcript(&self, frame: &mut Frame, area: Rect) {
        let capacity = area.height.saturating_sub(2).max(1) as usize;
        let start = self.transcript.len().saturating_sub(capacity);

        let items: Vec<ListItem> = self.transcript[start..]
            .iter()
            .map(|line| {
                let (prefix, style) = match line.speaker {
                    Speaker::User => ("你: ", Style::default().fg(Color::Yellow)),
                    Speaker::Assistant => ("助手: ", Style::default().fg(Color::Green)),
                    Speaker::System => ("· ", Style::default().fg(Color::Gray)),
                };
                ListItem::new(Text::from(format!("{}{}", prefix, line.text))).style(style)
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .title("blockpilot")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
        frame.render_widget(list, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let status = if self.analysis_pending {
            format!(
                "{} 分析中...",
                SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
            )
        } else {
            "Ctrl+I: 附加图片 | Enter: 发送 | Ctrl+C: 退出".to_string()
        };
        frame.render_widget(
            Paragraph::new(status).style(Style::default().fg(Color::Gray)),
            area,
        );
    }
}

/// Vision analysis, then strategy advice when a state was extracted.
async fn run_analysis(
    analyzers: Arc<Analyzers>,
    encoded: EncodedImage,
) -> AnalysisResult<Vec<String>> {
    let analysis = analyzers
        .vision
        .analyze(ImageInput::DataUrl(encoded), None)
        .await?;

    let mut lines = Vec::new();
    match analysis.game_state() {
        Some(state) => {
            lines.push(format_game_state(state));
            let advice = analyzers
                .strategy
                .advise(state, Difficulty::default(), 3)
                .await?;
            lines.push(advice.analysis);
        }
        None => lines.push(analysis.raw_response.clone()),
    }
    Ok(lines)
}

fn format_game_state(state: &GameState) -> String {
    let num = |v: Option<i64>| v.map(|n| n.to_string()).unwrap_or_else(|| "?".to_string());

    let mut out = format!(
        "局面分析：分数 {} · 等级 {} · 已消除 {} 行\n状态: {} · 下一块: {} · Hold: {}",
        num(state.current_score),
        num(state.current_level),
        num(state.lines_cleared),
        state.game_status.as_deref().unwrap_or("?"),
        state.next_piece.as_deref().unwrap_or("?"),
        state.hold_piece.as_deref().unwrap_or("-"),
    );

    if let Some(board) = &state.board_state {
        out.push_str(&format!("\n棋盘: {board}"));
    }
    if !state.risks.is_empty() {
        out.push_str(&format!("\n风险: {}", state.risks.join("；")));
    }
    if !state.opportunities.is_empty() {
        out.push_str(&format!("\n机会: {}", state.opportunities.join("；")));
    }
    if !state.recommended_actions.is_empty() {
        out.push_str(&format!("\n建议: {}", state.recommended_actions.join("；")));
    }
    out
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use blockpilot_images::encode_data_url;
    use std::io::Write;
    use tempfile::TempDir;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn app() -> App {
        App::new().unwrap()
    }

    fn png_file(dir: &TempDir) -> SelectedFile {
        let path = dir.path().join("board.png");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(&[0x89, 0x50, 0x4e, 0x47]).unwrap();
        SelectedFile::from_path(&path).unwrap()
    }

    #[test]
    fn test_attached_event_fills_composer() {
        let dir = TempDir::new().unwrap();
        let mut app = app();
        let file = png_file(&dir);

        app.handle_event(AppEvent::ImageAttached {
            file: file.clone(),
            encoded: encode_data_url(&file.mime, b"x"),
        });

        assert_eq!(app.composer.attachment().unwrap().file, file);
    }

    #[test]
    fn test_send_without_attachment_asks_for_one() {
        let mut app = app();
        for c in "怎么摆".chars() {
            app.handle_key(key(KeyCode::Char(c)));
        }
        app.handle_key(key(KeyCode::Enter));

        let last = app.transcript.last().unwrap();
        assert_eq!(last.speaker, Speaker::System);
        assert!(last.text.contains("附加棋盘截图"));
        assert!(!app.analysis_pending);
    }

    #[test]
    fn test_validation_alert_blocks_input_until_dismissed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("notes.txt");
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(b"hello").unwrap();

        let mut app = app();
        app.activate_attach();
        assert!(app.picker.is_visible());

        app.picker.hide();
        app.file_chosen(path);
        assert_eq!(app.selector.pending_alert(), Some("只支持图片文件"));

        // Composer input is swallowed while the alert is up.
        app.handle_key(key(KeyCode::Char('a')));
        assert!(app.composer.input().is_empty());

        app.handle_key(key(KeyCode::Enter));
        assert!(app.selector.pending_alert().is_none());
    }

    #[test]
    fn test_ctrl_i_opens_picker_unless_disabled() {
        let mut app = app();
        app.selector.set_disabled(true);
        app.handle_key(KeyEvent::new(KeyCode::Char('i'), KeyModifiers::CONTROL));
        assert!(!app.picker.is_visible());

        app.selector.set_disabled(false);
        app.handle_key(KeyEvent::new(KeyCode::Char('i'), KeyModifiers::CONTROL));
        assert!(app.picker.is_visible());
    }

    #[test]
    fn test_game_state_formatting() {
        let state = GameState {
            current_score: Some(1200),
            current_level: Some(3),
            lines_cleared: Some(14),
            game_status: Some("playing".to_string()),
            next_piece: Some("T".to_string()),
            recommended_actions: vec!["左移两格".to_string(), "旋转一次".to_string()],
            ..GameState::default()
        };

        let text = format_game_state(&state);
        assert!(text.contains("分数 1200"));
        assert!(text.contains("下一块: T"));
        assert!(text.contains("左移两格；旋转一次"));
    }
}
