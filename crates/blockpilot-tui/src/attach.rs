//! The image attach trigger control.
//!
//! A small control in the composer row. Dimmed while disabled, highlighted
//! while the pointer is over it, with a tooltip line above when hovered and
//! enabled. Activation itself is decided by the selection pipeline.

use ratatui::{
    layout::{Position, Rect},
    style::{Color, Modifier, Style},
    widgets::{Clear, Paragraph},
    Frame,
};

/// Tooltip shown while hovering the enabled control.
pub const TOOLTIP: &str = "上传图片";

/// Label rendered inside the control.
pub const LABEL: &str = "[+图片]";

/// The attach trigger control.
#[derive(Debug, Default)]
pub struct AttachControl {
    /// Where the control was last rendered, for pointer hit-testing
    rect: Rect,
}

impl AttachControl {
    /// Create the control.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a pointer position is over the control.
    pub fn hit(&self, column: u16, row: u16) -> bool {
        self.rect.contains(Position::new(column, row))
    }

    /// Style for the current disabled/hovered combination.
    fn style(disabled: bool, hovered: bool) -> Style {
        if disabled {
            Style::default().fg(Color::DarkGray)
        } else if hovered {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::Cyan)
        }
    }

    /// Render the control into `area` and remember it for hit-testing.
    pub fn render(&mut self, frame: &mut Frame, area: Rect, disabled: bool, hovered: bool) {
        self.rect = area;

        let control = Paragraph::new(LABEL).style(Self::style(disabled, hovered));
        frame.render_widget(control, area);

        if hovered && !disabled && area.y > 0 {
            let tooltip_width = (TOOLTIP.chars().count() as u16) * 2;
            let tooltip_area = Rect::new(
                area.x,
                area.y - 1,
                tooltip_width.min(frame.area().width.saturating_sub(area.x)),
                1,
            );
            frame.render_widget(Clear, tooltip_area);
            frame.render_widget(
                Paragraph::new(TOOLTIP).style(Style::default().fg(Color::Black).bg(Color::White)),
                tooltip_area,
            );
        }
    }
}
