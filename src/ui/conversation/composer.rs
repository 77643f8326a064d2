use crate::ui::conversation::commands::{parse_slash_command, ParsedCommand};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Result returned when the user interacts with the composer
#[derive(Debug, PartialEq)]
pub enum ComposerResult {
    Submitted(String),
    Command(ParsedCommand),
    None,
}

/// Cursor state for the single-line input.
///
/// The text itself lives in the conversation controller, which decides when
/// it is cleared. The cursor is a char index and is clamped on every edit.
#[derive(Debug, Clone, Default)]
pub struct Composer {
    cursor: usize,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor position, clamped to `text`
    pub fn cursor(&self, text: &str) -> usize {
        self.cursor.min(text.chars().count())
    }

    /// Handle key input against the current input text
    pub fn handle_key(&mut self, key: KeyEvent, text: &mut String) -> ComposerResult {
        if key.kind != KeyEventKind::Press {
            return ComposerResult::None;
        }

        self.cursor = self.cursor(text);

        match key.code {
            KeyCode::Enter => {
                if text.trim().is_empty() {
                    return ComposerResult::None;
                }
                if let Some(command) = parse_slash_command(text) {
                    text.clear();
                    self.cursor = 0;
                    return ComposerResult::Command(command);
                }
                return ComposerResult::Submitted(text.clone());
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                text.insert(byte_index(text, self.cursor), c);
                self.cursor += 1;
            }
            KeyCode::Backspace => {
                if self.cursor > 0 {
                    self.cursor -= 1;
                    text.remove(byte_index(text, self.cursor));
                }
            }
            KeyCode::Delete => {
                if self.cursor < text.chars().count() {
                    text.remove(byte_index(text, self.cursor));
                }
            }
            KeyCode::Left => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            KeyCode::Right => {
                if self.cursor < text.chars().count() {
                    self.cursor += 1;
                }
            }
            KeyCode::Home => {
                self.cursor = 0;
            }
            KeyCode::End => {
                self.cursor = text.chars().count();
            }
            _ => {}
        }

        ComposerResult::None
    }
}

fn byte_index(text: &str, char_position: usize) -> usize {
    text.char_indices()
        .nth(char_position)
        .map(|(index, _)| index)
        .unwrap_or(text.len())
}

/// Input line widget
pub struct ComposerView<'a> {
    pub text: &'a str,
    pub cursor: usize,
    pub placeholder: &'a str,
    pub has_focus: bool,
}

impl Widget for ComposerView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title("Ask a question (Enter to send, /help for commands)")
            .style(if self.has_focus {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::Gray)
            });

        let inner_area = block.inner(area);
        block.render(area, buf);

        if inner_area.height == 0 {
            return;
        }

        if self.text.is_empty() {
            let placeholder_line = Line::from(vec![Span::styled(
                self.placeholder,
                Style::default().fg(Color::DarkGray),
            )]);
            buf.set_line(inner_area.x, inner_area.y, &placeholder_line, inner_area.width);
            return;
        }

        let mut content = self.text.to_string();
        if self.has_focus {
            content.insert(byte_index(&content, self.cursor), '▌');
        }

        // Keep the cursor in view on long input
        let width = inner_area.width as usize;
        let skip = (self.cursor + 1).saturating_sub(width);
        let visible: String = content.chars().skip(skip).collect();

        let line = Line::from(vec![Span::styled(visible, Style::default().fg(Color::White))]);
        buf.set_line(inner_area.x, inner_area.y, &line, inner_area.width);
    }
}
