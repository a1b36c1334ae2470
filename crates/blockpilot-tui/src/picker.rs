//! Image picker overlay: the file-selection surface.
//!
//! Lists the current directory with fuzzy search and keyboard navigation,
//! filtered to image extensions. The filter is advisory, like a file
//! dialog's `image/*` hint; the MIME check in the selection pipeline is what
//! actually enforces image-ness.

use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Margin, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph},
    Frame,
};

use crate::util::{centered_rect, format_file_size};

/// What a key press did to the picker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerOutcome {
    /// Still open
    Pending,
    /// Dismissed without a choice
    Cancelled,
    /// A file was chosen
    Chosen(PathBuf),
}

#[derive(Debug, Clone)]
struct Entry {
    path: PathBuf,
    is_dir: bool,
    size: u64,
}

/// Single-select image picker widget state.
#[derive(Debug, Clone)]
pub struct ImagePickerWidget {
    /// Current search query
    search_query: String,
    /// Entries surviving the filter and search
    entries: Vec<Entry>,
    /// Highlighted entry index
    highlighted: usize,
    /// Whether the picker is visible
    visible: bool,
    /// Directory being browsed
    cwd: PathBuf,
    /// Extensions the advisory filter lets through
    allowed_extensions: Vec<String>,
    /// Maximum number of visible items
    max_visible_items: usize,
    /// Scroll offset
    scroll_offset: usize,
}

impl ImagePickerWidget {
    /// Create a picker filtered to the given extensions.
    pub fn new(allowed_extensions: Vec<String>) -> Self {
        Self {
            search_query: String::new(),
            entries: Vec::new(),
            highlighted: 0,
            visible: false,
            cwd: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            allowed_extensions,
            max_visible_items: 15,
            scroll_offset: 0,
        }
    }

    /// Show the picker, rescanning the current directory.
    pub fn show(&mut self) {
        self.visible = true;
        self.refresh();
    }

    /// Hide the picker and drop its transient state.
    pub fn hide(&mut self) {
        self.visible = false;
        self.search_query.clear();
        self.highlighted = 0;
        self.scroll_offset = 0;
    }

    /// Whether the picker is currently shown.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Directory being browsed.
    pub fn cwd(&self) -> &PathBuf {
        &self.cwd
    }

    /// Handle a key press while the picker is open.
    pub fn handle_key(&mut self, key: KeyEvent) -> PickerOutcome {
        match key.code {
            KeyCode::Esc => {
                self.hide();
                return PickerOutcome::Cancelled;
            }
            KeyCode::Enter => {
                if let Some(entry) = self.entries.get(self.highlighted).cloned() {
                    if entry.is_dir {
                        self.cwd = entry.path;
                        self.search_query.clear();
                        self.refresh();
                    } else {
                        let path = entry.path;
                        self.hide();
                        return PickerOutcome::Chosen(path);
                    }
                }
            }
            KeyCode::Up => self.navigate_up(),
            KeyCode::Down => self.navigate_down(),
            KeyCode::Backspace => {
                if self.search_query.pop().is_none() {
                    // Empty query: go up one directory instead.
                    if let Some(parent) = self.cwd.parent() {
                        self.cwd = parent.to_path_buf();
                    }
                }
                self.refresh();
            }
            KeyCode::Char(c) => {
                self.search_query.push(c);
                self.refresh();
            }
            _ => {}
        }
        PickerOutcome::Pending
    }

    /// Navigate up one entry.
    fn navigate_up(&mut self) {
        if self.highlighted > 0 {
            self.highlighted -= 1;
            self.adjust_scroll();
        }
    }

    /// Navigate down one entry.
    fn navigate_down(&mut self) {
        if self.highlighted + 1 < self.entries.len() {
            self.highlighted += 1;
            self.adjust_scroll();
        }
    }

    /// Whether the advisory filter lets a file through.
    fn passes_filter(&self, path: &PathBuf) -> bool {
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        let ext = ext.to_ascii_lowercase();
        self.allowed_extensions.iter().any(|a| a == &ext)
    }

    /// Rescan the directory, applying the filter and the search query.
    fn refresh(&mut self) {
        self.entries.clear();
        self.highlighted = 0;
        self.scroll_offset = 0;

        if let Ok(read_dir) = std::fs::read_dir(&self.cwd) {
            for entry in read_dir.flatten() {
                let path = entry.path();
                let name = entry.file_name().to_string_lossy().to_string();

                // Skip hidden entries unless the search asks for them.
                if name.starts_with('.') && !self.search_query.starts_with('.') {
                    continue;
                }

                let is_dir = path.is_dir();
                if !is_dir && !self.passes_filter(&path) {
                    continue;
                }

                if !self.search_query.is_empty() {
                    let query = self.search_query.to_lowercase();
                    if fuzzy_match(&query, &name.to_lowercase()).is_none() {
                        continue;
                    }
                }

                let size = if is_dir {
                    0
                } else {
                    std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0)
                };

                self.entries.push(Entry { path, is_dir, size });
            }
        }

        // Directories first, then files, alphabetically.
        self.entries.sort_by(|a, b| {
            b.is_dir.cmp(&a.is_dir).then_with(|| {
                a.path
                    .file_name()
                    .unwrap_or_default()
                    .cmp(b.path.file_name().unwrap_or_default())
            })
        });
    }

    /// Keep the highlighted entry inside the scroll window.
    fn adjust_scroll(&mut self) {
        if self.highlighted < self.scroll_offset {
            self.scroll_offset = self.highlighted;
        } else if self.highlighted >= self.scroll_offset + self.max_visible_items {
            self.scroll_offset = self.highlighted.saturating_sub(self.max_visible_items - 1);
        }
    }

    /// Render the picker overlay.
    pub fn render(&self, frame: &mut Frame, area: Rect) {
        if !self.visible {
            return;
        }

        let popup_area = centered_rect(80, 80, area);
        frame.render_widget(Clear, popup_area);

        let main_block = Block::default()
            .title("选择图片 - 输入搜索，↑↓ 移动，Enter 选择，Esc 取消")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan));
        frame.render_widget(main_block, popup_area);

        let inner_area = popup_area.inner(Margin {
            horizontal: 1,
            vertical: 1,
        });

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Search input
                Constraint::Min(5),    // File list
                Constraint::Length(1), // Footer
            ])
            .split(inner_area);

        self.render_search_input(frame, chunks[0]);
        self.render_file_list(frame, chunks[1]);
        self.render_footer(frame, chunks[2]);
    }

    fn render_search_input(&self, frame: &mut Frame, area: Rect) {
        let search_text = if self.search_query.is_empty() {
            "搜索图片文件...".to_string()
        } else {
            self.search_query.clone()
        };

        let input = Paragraph::new(search_text)
            .block(
                Block::default()
                    .title(self.cwd.display().to_string())
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Yellow)),
            )
            .style(Style::default().fg(Color::White));

        frame.render_widget(input, area);
    }

    fn render_file_list(&self, frame: &mut Frame, area: Rect) {
        let items: Vec<ListItem> = self
            .entries
            .iter()
            .enumerate()
            .skip(self.scroll_offset)
            .take(self.max_visible_items)
            .map(|(idx, entry)| {
                let name = entry
                    .path
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string();

                let mut spans = Vec::new();
                if entry.is_dir {
                    spans.push(Span::styled("▸ ", Style::default().fg(Color::Blue)));
                    spans.push(Span::styled(name, Style::default().fg(Color::Blue)));
                } else {
                    spans.push(Span::raw("  "));
                    spans.push(Span::raw(name));
                    spans.push(Span::styled(
                        format!(" ({})", format_file_size(entry.size)),
                        Style::default().fg(Color::Gray),
                    ));
                }

                let mut style = Style::default();
                if idx == self.highlighted {
                    style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
                }

                ListItem::new(Line::from(spans)).style(style)
            })
            .collect();

        let list = List::new(items).block(
            Block::default()
                .title(format!("文件 ({})", self.entries.len()))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Blue)),
        );

        frame.render_widget(list, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let footer = Paragraph::new("↑↓: 移动 | Enter: 选择 | Backspace: 上级目录 | Esc: 取消")
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center);
        frame.render_widget(footer, area);
    }

    #[cfg(test)]
    fn entry_names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| {
                e.path
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
                    .to_string()
            })
            .collect()
    }
}

/// Simple fuzzy matching: every query char must appear in order.
pub fn fuzzy_match(query: &str, text: &str) -> Option<Vec<usize>> {
    if query.is_empty() {
        return Some(Vec::new());
    }

    let mut positions = Vec::new();
    let mut text_iter = text.char_indices();

    'outer: for qc in query.chars() {
        for (idx, tc) in text_iter.by_ref() {
            if qc.eq_ignore_ascii_case(&tc) {
                positions.push(idx);
                continue 'outer;
            }
        }
        return None;
    }

    Some(positions)
}
