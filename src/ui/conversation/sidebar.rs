use crate::config::Config;
use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Widget},
};

/// Width of the sidebar when expanded and when collapsed to its toggle
pub const EXPANDED_WIDTH: u16 = 34;
pub const COLLAPSED_WIDTH: u16 = 5;

/// Static list of reference documents, linked relative to the documents base URL
pub struct SidebarView<'a> {
    pub config: &'a Config,
    pub collapsed: bool,
}

impl SidebarView<'_> {
    pub fn width(collapsed: bool) -> u16 {
        if collapsed {
            COLLAPSED_WIDTH
        } else {
            EXPANDED_WIDTH
        }
    }
}

impl Widget for SidebarView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let toggle = if self.collapsed { ">" } else { "<" };
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Line::from(vec![Span::styled(
                format!(" {} ", toggle),
                Style::default().fg(Color::Cyan),
            )]));

        let inner_area = block.inner(area);
        block.render(area, buf);

        if self.collapsed || inner_area.height == 0 {
            return;
        }

        let mut lines = vec![
            Line::from(vec![Span::styled(
                "Resources",
                Style::default().add_modifier(Modifier::BOLD),
            )]),
            Line::from(""),
        ];

        for document in &self.config.documents {
            lines.push(Line::from(vec![
                Span::raw("• "),
                Span::styled(document.as_str(), Style::default().fg(Color::White)),
            ]));
            lines.push(Line::from(vec![
                Span::raw("  "),
                Span::styled(
                    format!("/pdfs/{}", document),
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::UNDERLINED),
                ),
            ]));
        }

        for (i, line) in lines.iter().enumerate() {
            if i >= inner_area.height as usize {
                break;
            }
            buf.set_line(inner_area.x, inner_area.y + i as u16, line, inner_area.width);
        }
    }
}
