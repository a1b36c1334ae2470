//! Blocking alert modal.
//!
//! Rendered over everything else while a selection attempt has an
//! undismissed alert. The app routes all input here until the user
//! acknowledges it.

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::util::centered_rect;

/// Whether a key press dismisses the alert.
pub fn dismisses(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' '))
}

/// Render the alert modal with the given message.
pub fn render(frame: &mut Frame, area: Rect, message: &str) {
    let popup_area = centered_rect(50, 25, area);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .title("提示")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red));
    frame.render_widget(block, popup_area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .margin(1)
        .split(popup_area);

    let body = Paragraph::new(message)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true });
    frame.render_widget(body, chunks[0]);

    let footer = Paragraph::new("Enter 确定")
        .alignment(Alignment::Center)
        .style(Style::default().fg(Color::Gray));
    frame.render_widget(footer, chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    #[test]
    fn test_dismissal_keys() {
        assert!(dismisses(&KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)));
        assert!(dismisses(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(dismisses(&KeyEvent::new(
            KeyCode::Char(' '),
            KeyModifiers::NONE
        )));
        assert!(!dismisses(&KeyEvent::new(
            KeyCode::Char('a'),
            KeyModifiers::NONE
        )));
    }
}
