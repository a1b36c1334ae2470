//! Message composer with an attachment slot.

use blockpilot_images::{EncodedImage, SelectedFile};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::util::format_file_size;

/// An encoded image waiting to go out with the next message.
#[derive(Debug, Clone)]
pub struct Attachment {
    /// The chosen file's handle
    pub file: SelectedFile,
    /// The ready-to-send data URL
    pub encoded: EncodedImage,
}

/// Composer state: the draft text and at most one attachment.
#[derive(Debug, Default)]
pub struct Composer {
    input: String,
    attachment: Option<Attachment>,
}

impl Composer {
    /// Create an empty composer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a character to the draft.
    pub fn insert_char(&mut self, c: char) {
        self.input.push(c);
    }

    /// Remove the last character of the draft.
    pub fn backspace(&mut self) {
        self.input.pop();
    }

    /// Current draft text.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Current attachment, if any.
    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    /// Attach an encoded image, replacing any previous one.
    pub fn attach(&mut self, file: SelectedFile, encoded: EncodedImage) {
        self.attachment = Some(Attachment { file, encoded });
    }

    /// Drop the pending attachment.
    pub fn clear_attachment(&mut self) {
        self.attachment = None;
    }

    /// Take the composed message, clearing the composer.
    ///
    /// Returns `None` when there is nothing to send (no text and no
    /// attachment).
    pub fn take_message(&mut self) -> Option<(String, Option<Attachment>)> {
        if self.input.trim().is_empty() && self.attachment.is_none() {
            return None;
        }
        let text = std::mem::take(&mut self.input).trim().to_string();
        let attachment = self.attachment.take();
        Some((text, attachment))
    }

    /// Render the input field, with the attachment chip in the title row.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let title = match &self.attachment {
            Some(attachment) => Line::from(vec![
                Span::raw("消息 "),
                Span::styled(
                    format!(
                        "📷 {} ({})",
                        attachment.file.name,
                        format_file_size(attachment.file.size_bytes)
                    ),
                    Style::default().fg(Color::Green),
                ),
            ]),
            None => Line::from("消息"),
        };

        let input = Paragraph::new(self.input.as_str()).block(
            Block::default()
                .title(title)
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Yellow)),
        );
        frame.render_widget(input, area);
    }
}
