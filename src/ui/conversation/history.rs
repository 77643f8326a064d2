//! Conversation log with per-answer reference panels

use crate::config::Config;
use crate::controller::Exchange;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};
use std::collections::HashSet;

/// Which exchange is selected and which reference panels are open.
///
/// `selected == None` means "follow the newest exchange".
#[derive(Debug, Clone, Default)]
pub struct HistoryState {
    selected: Option<usize>,
    expanded: HashSet<usize>,
}

impl HistoryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index of the selected exchange in a history of `len` entries
    pub fn selected_index(&self, len: usize) -> Option<usize> {
        if len == 0 {
            return None;
        }
        Some(self.selected.unwrap_or(len - 1).min(len - 1))
    }

    pub fn select_previous(&mut self, len: usize) {
        if let Some(current) = self.selected_index(len) {
            self.selected = Some(current.saturating_sub(1));
        }
    }

    pub fn select_next(&mut self, len: usize) {
        if let Some(current) = self.selected_index(len) {
            self.selected = if current + 2 >= len {
                None
            } else {
                Some(current + 1)
            };
        }
    }

    /// Open or close the reference panel of exchange `index`
    pub fn toggle_references(&mut self, index: usize) {
        if !self.expanded.remove(&index) {
            self.expanded.insert(index);
        }
    }

    pub fn is_expanded(&self, index: usize) -> bool {
        self.expanded.contains(&index)
    }
}

/// Conversation history display component
pub struct HistoryView<'a> {
    pub exchanges: &'a [Exchange],
    pub state: &'a HistoryState,
    pub config: &'a Config,
}

impl Widget for HistoryView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title("Conversation");
        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.exchanges.is_empty() {
            let welcome_lines = vec![
                Line::from(vec![Span::styled(
                    "Ask anything about the reference documents.",
                    Style::default().fg(Color::Green),
                )]),
                Line::from(vec![Span::raw("")]),
                Line::from(vec![Span::styled(
                    "Answers list the pages they are based on; Ctrl+R shows them.",
                    Style::default().fg(Color::DarkGray),
                )]),
            ];
            for (i, line) in welcome_lines.iter().enumerate() {
                if i < inner_area.height as usize {
                    buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
                }
            }
            return;
        }

        let selected = self.state.selected_index(self.exchanges.len());
        let width = inner_area.width.saturating_sub(2) as usize;

        // Lay out everything up to the end of the selected exchange, then keep
        // the bottom of it on screen.
        let mut all_lines: Vec<Line> = Vec::new();
        for (index, exchange) in self.exchanges.iter().enumerate() {
            all_lines.extend(self.exchange_lines(index, exchange, selected == Some(index), width));
            all_lines.push(Line::from(""));
            if Some(index) == selected {
                break;
            }
        }

        let height = inner_area.height as usize;
        let start = all_lines.len().saturating_sub(height);
        for (i, line) in all_lines[start..].iter().enumerate() {
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}

impl<'a> HistoryView<'a> {
    fn exchange_lines(
        &self,
        index: usize,
        exchange: &'a Exchange,
        is_selected: bool,
        width: usize,
    ) -> Vec<Line<'a>> {
        let mut lines = Vec::new();

        let marker = if is_selected { "▶" } else { " " };
        let header = format!(
            "{} #{} {} {}",
            marker,
            index + 1,
            exchange.asked_at.format("%H:%M:%S"),
            "─".repeat(20)
        );
        let header_style = if is_selected {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        lines.push(Line::from(vec![Span::styled(header, header_style)]));

        push_labelled(&mut lines, "Question: ", &exchange.question, Color::Blue, width);
        push_labelled(&mut lines, "Answer: ", &exchange.answer.answer, Color::Green, width);

        let expanded = self.state.is_expanded(index);
        let toggle = if expanded {
            "[-] Hide references".to_string()
        } else {
            format!("[+] Show references ({})", exchange.answer.citations.len())
        };
        lines.push(Line::from(vec![
            Span::raw("  "),
            Span::styled(toggle, Style::default().fg(Color::Yellow)),
        ]));

        if expanded {
            for group in exchange.answer.grouped_citations() {
                lines.push(Line::from(vec![
                    Span::raw("    • "),
                    Span::styled(
                        format!("{} - Pages {}", group.document_id, group.pages_label()),
                        Style::default().fg(Color::White),
                    ),
                ]));
                lines.push(Line::from(vec![
                    Span::raw("      "),
                    Span::styled(
                        self.config.document_url(&group.document_id),
                        Style::default()
                            .fg(Color::DarkGray)
                            .add_modifier(Modifier::UNDERLINED),
                    ),
                ]));
            }
        }

        lines
    }
}

fn push_labelled(
    lines: &mut Vec<Line<'_>>,
    label: &'static str,
    text: &str,
    color: Color,
    width: usize,
) {
    let body_width = width.saturating_sub(label.chars().count());
    for (i, row) in wrap_text(text, body_width).into_iter().enumerate() {
        let prefix = if i == 0 {
            Span::styled(label, Style::default().add_modifier(Modifier::BOLD))
        } else {
            Span::raw(" ".repeat(label.chars().count()))
        };
        lines.push(Line::from(vec![
            Span::raw("  "),
            prefix,
            Span::styled(row, Style::default().fg(color)),
        ]));
    }
}

/// Wrap text to fit within the given width, keeping explicit line breaks
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }

    let mut lines = Vec::new();

    for paragraph in text.split('\n') {
        let mut current_line = String::new();
        let mut current_width = 0;

        for word in paragraph.split_whitespace() {
            let word_width = word.chars().count();
            if current_width > 0 && current_width + word_width + 1 > width {
                lines.push(std::mem::take(&mut current_line));
                current_width = 0;
            }
            if current_width > 0 {
                current_line.push(' ');
                current_width += 1;
            }
            current_line.push_str(word);
            current_width += word_width;
        }

        lines.push(current_line);
    }

    lines
}
