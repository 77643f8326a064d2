use crate::config::Config;
use crate::controller::{ConversationController, PendingSubmission};
use crate::ui::conversation::{
    get_help_text, Composer, ComposerResult, ComposerView, HistoryState, HistoryView,
    ParsedCommand, SidebarView, SlashCommand,
};
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Actions the event loop has to carry out for the conversation
pub enum ConversationAction {
    None,
    Submit(PendingSubmission),
    Exit,
}

/// Ties the controller to the terminal widgets
pub struct ConversationManager {
    controller: ConversationController,
    config: Config,
    composer: Composer,
    history: HistoryState,
    notice: Option<String>,
}

impl ConversationManager {
    pub fn new(controller: ConversationController, config: Config) -> Self {
        Self {
            controller,
            config,
            composer: Composer::new(),
            history: HistoryState::new(),
            notice: None,
        }
    }

    pub fn controller(&self) -> &ConversationController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut ConversationController {
        &mut self.controller
    }

    pub fn history_state(&self) -> &HistoryState {
        &self.history
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Handle key input
    pub fn handle_key(&mut self, key: KeyEvent) -> ConversationAction {
        if key.kind != KeyEventKind::Press {
            return ConversationAction::None;
        }

        let len = self.controller.history().len();
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Esc => return ConversationAction::Exit,
            KeyCode::Char('c') if ctrl => return ConversationAction::Exit,
            KeyCode::Char('b') if ctrl => {
                self.controller.toggle_sidebar();
                return ConversationAction::None;
            }
            KeyCode::Char('r') if ctrl => {
                self.toggle_references(None);
                return ConversationAction::None;
            }
            KeyCode::PageUp => {
                self.history.select_previous(len);
                return ConversationAction::None;
            }
            KeyCode::PageDown => {
                self.history.select_next(len);
                return ConversationAction::None;
            }
            _ => {}
        }

        match self.composer.handle_key(key, self.controller.input_mut()) {
            ComposerResult::Submitted(question) => {
                self.notice = None;
                match self.controller.begin_submit(&question) {
                    Some(pending) => ConversationAction::Submit(pending),
                    None => ConversationAction::None,
                }
            }
            ComposerResult::Command(command) => {
                self.notice = None;
                self.handle_slash_command(command)
            }
            ComposerResult::None => ConversationAction::None,
        }
    }

    fn handle_slash_command(&mut self, command: ParsedCommand) -> ConversationAction {
        match command.command {
            SlashCommand::Sidebar => {
                self.controller.toggle_sidebar();
            }
            SlashCommand::Refs => {
                if command.argument().is_some() && command.exchange_index().is_none() {
                    self.notice = Some("Usage: /refs [answer number]".to_string());
                } else {
                    self.toggle_references(command.exchange_index());
                }
            }
            SlashCommand::Session => {
                self.notice = Some(match self.controller.session_id() {
                    Some(session_id) => format!("Session: {}", session_id),
                    None => "No session yet; one is assigned with the first answer.".to_string(),
                });
            }
            SlashCommand::Help => {
                self.notice = Some(get_help_text());
            }
            SlashCommand::Quit => return ConversationAction::Exit,
        }
        ConversationAction::None
    }

    fn toggle_references(&mut self, index: Option<usize>) {
        let len = self.controller.history().len();
        match index.or_else(|| self.history.selected_index(len)) {
            Some(index) if index < len => self.history.toggle_references(index),
            Some(index) => self.notice = Some(format!("No answer #{}", index + 1)),
            None => self.notice = Some("No answers yet".to_string()),
        }
    }

    /// Render the whole screen
    pub fn render(&self, frame: &mut Frame) {
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(5)])
            .split(frame.size());

        self.render_header(frame, rows[0]);

        let collapsed = self.controller.is_sidebar_collapsed();
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([
                Constraint::Length(SidebarView::width(collapsed)),
                Constraint::Min(20),
            ])
            .split(rows[1]);

        frame.render_widget(
            SidebarView {
                config: &self.config,
                collapsed,
            },
            columns[0],
        );

        let status_lines = self.status_lines();
        let chat = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(3),
                Constraint::Length(status_lines.len() as u16),
                Constraint::Length(3),
            ])
            .split(columns[1]);

        frame.render_widget(
            HistoryView {
                exchanges: self.controller.history(),
                state: &self.history,
                config: &self.config,
            },
            chat[0],
        );

        frame.render_widget(Paragraph::new(status_lines), chat[1]);

        let text = self.controller.input();
        frame.render_widget(
            ComposerView {
                text,
                cursor: self.composer.cursor(text),
                placeholder: "Send a message",
                has_focus: true,
            },
            chat[2],
        );
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let session = match self.controller.session_id() {
            Some(_) => "session active",
            None => "new session",
        };
        let header = Line::from(vec![
            Span::styled(
                format!(" {} ", self.config.title),
                Style::default()
                    .fg(Color::Black)
                    .bg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(format!("  {}", session), Style::default().fg(Color::DarkGray)),
        ]);
        frame.render_widget(Paragraph::new(header), area);
    }

    fn status_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        if self.controller.is_loading() {
            lines.push(Line::from(vec![Span::styled(
                "Loading...",
                Style::default().fg(Color::Yellow),
            )]));
        }
        if let Some(notice) = &self.notice {
            for row in notice.lines().take(10) {
                lines.push(Line::from(vec![Span::styled(
                    row.to_string(),
                    Style::default().fg(Color::Gray),
                )]));
            }
        }
        lines
    }
}
