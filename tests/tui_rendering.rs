//! Renders the chat screen into ratatui's TestBackend and inspects the text.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::backend::TestBackend;
use ratatui::Terminal;

use citechat::citations::Citation;
use citechat::client::{AnswerError, AnswerService, QueryReply};
use citechat::config::Config;
use citechat::controller::{AnswerResult, ConversationController, FALLBACK_ANSWER};
use citechat::storage::MemorySessionStore;
use citechat::ui::conversation::{ConversationAction, ConversationManager};

/// Answers from a fixed queue; an empty queue behaves like a down service
#[derive(Default)]
struct QueuedAnswers {
    replies: Mutex<VecDeque<AnswerResult>>,
}

impl QueuedAnswers {
    fn with(replies: Vec<AnswerResult>) -> Self {
        QueuedAnswers {
            replies: Mutex::new(replies.into()),
        }
    }
}

#[async_trait]
impl AnswerService for QueuedAnswers {
    async fn query(
        &self,
        _question: &str,
        _session_id: Option<&str>,
    ) -> Result<QueryReply, AnswerError> {
        match self.replies.lock().unwrap().pop_front() {
            Some(answer) => Ok(QueryReply {
                answer,
                session_id: None,
            }),
            None => Err(AnswerError::Status(reqwest::StatusCode::BAD_GATEWAY)),
        }
    }
}

fn manager_with(replies: Vec<AnswerResult>) -> ConversationManager {
    let config = Config {
        endpoint: "http://docs.test".to_string(),
        ..Config::default()
    };
    let controller = ConversationController::new(
        Arc::new(QueuedAnswers::with(replies)),
        Arc::new(MemorySessionStore::new()),
    );
    ConversationManager::new(controller, config)
}

fn itas_answer() -> AnswerResult {
    AnswerResult {
        answer: "La risposta è nel primo volume.".to_string(),
        citations: vec![
            Citation::new("ITAS-1.pdf", 1),
            Citation::new("ITAS-2.pdf", 5),
            Citation::new("ITAS-1.pdf", 2),
            Citation::new("ITAS-1.pdf", 1),
        ],
    }
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

/// Draw the manager and return the screen as text, rows joined by newlines
fn screen(manager: &ConversationManager) -> String {
    let mut terminal = Terminal::new(TestBackend::new(110, 32)).unwrap();
    terminal.draw(|frame| manager.render(frame)).unwrap();

    let buf = terminal.backend().buffer();
    (0..buf.area.height)
        .map(|y| {
            (0..buf.area.width)
                .map(|x| buf.get(x, y).symbol().to_string())
                .collect::<String>()
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn empty_screen_shows_title_sidebar_and_placeholder() {
    let manager = manager_with(vec![]);
    let text = screen(&manager);

    assert!(text.contains("Poc - Assistente digitale"), "got:\n{text}");
    assert!(text.contains("Resources"), "got:\n{text}");
    assert!(text.contains("ITAS-8-per-CP.pdf"), "got:\n{text}");
    assert!(text.contains("/pdfs/ITAS-1.pdf"), "got:\n{text}");
    assert!(text.contains("Send a message"), "got:\n{text}");
}

#[test]
fn collapsed_sidebar_hides_documents() {
    let mut manager = manager_with(vec![]);
    manager.handle_key(ctrl('b'));
    let text = screen(&manager);

    assert!(manager.controller().is_sidebar_collapsed());
    assert!(!text.contains("ITAS-1.pdf"), "got:\n{text}");

    manager.handle_key(ctrl('b'));
    assert!(screen(&manager).contains("ITAS-1.pdf"));
}

#[tokio::test]
async fn references_are_grouped_when_expanded() {
    let mut manager = manager_with(vec![itas_answer()]);
    manager.controller_mut().submit("Dove trovo ITAS?").await.unwrap();

    let collapsed = screen(&manager);
    assert!(collapsed.contains("Question: Dove trovo ITAS?"), "got:\n{collapsed}");
    assert!(collapsed.contains("Answer: La risposta è nel primo volume."), "got:\n{collapsed}");
    assert!(collapsed.contains("[+] Show references (4)"), "got:\n{collapsed}");
    assert!(!collapsed.contains("Pages"), "got:\n{collapsed}");

    manager.handle_key(ctrl('r'));
    let expanded = screen(&manager);
    assert!(expanded.contains("[-] Hide references"), "got:\n{expanded}");
    assert!(expanded.contains("ITAS-1.pdf - Pages 1, 2, 1"), "got:\n{expanded}");
    assert!(expanded.contains("ITAS-2.pdf - Pages 5"), "got:\n{expanded}");
    assert!(
        expanded.find("ITAS-1.pdf - Pages").unwrap() < expanded.find("ITAS-2.pdf - Pages").unwrap()
    );
}

#[tokio::test]
async fn typed_question_shows_loading_until_settled() {
    let mut manager = manager_with(vec![]);
    for c in "anyone there?".chars() {
        manager.handle_key(key(KeyCode::Char(c)));
    }

    let pending = match manager.handle_key(key(KeyCode::Enter)) {
        ConversationAction::Submit(pending) => pending,
        _ => panic!("enter should submit the question"),
    };
    assert!(screen(&manager).contains("Loading..."));

    let settled = pending.resolve().await;
    manager.controller_mut().settle(settled);

    let text = screen(&manager);
    assert!(!text.contains("Loading..."), "got:\n{text}");
    assert!(text.contains(FALLBACK_ANSWER), "got:\n{text}");
    // The failed question stays in the input line for another try
    assert_eq!(manager.controller().input(), "anyone there?");
}

#[test]
fn blank_enter_and_escape() {
    let mut manager = manager_with(vec![]);
    assert!(matches!(
        manager.handle_key(key(KeyCode::Enter)),
        ConversationAction::None
    ));
    assert!(manager.controller().history().is_empty());
    assert!(matches!(
        manager.handle_key(key(KeyCode::Esc)),
        ConversationAction::Exit
    ));
}

#[test]
fn slash_commands_show_notices() {
    let mut manager = manager_with(vec![]);
    for c in "/session".chars() {
        manager.handle_key(key(KeyCode::Char(c)));
    }
    manager.handle_key(key(KeyCode::Enter));
    assert!(manager.notice().unwrap().starts_with("No session yet"));
    assert_eq!(manager.controller().input(), "");

    for c in "/refs 4".chars() {
        manager.handle_key(key(KeyCode::Char(c)));
    }
    manager.handle_key(key(KeyCode::Enter));
    assert_eq!(manager.notice(), Some("No answer #4"));

    for c in "/help".chars() {
        manager.handle_key(key(KeyCode::Char(c)));
    }
    manager.handle_key(key(KeyCode::Enter));
    assert!(screen(&manager).contains("/sidebar"));
}

#[tokio::test]
async fn page_up_selects_earlier_answer() {
    let first = AnswerResult {
        answer: "first answer".to_string(),
        citations: vec![Citation::new("ITAS-3.pdf", 7)],
    };
    let second = AnswerResult {
        answer: "second answer".to_string(),
        citations: vec![],
    };
    let mut manager = manager_with(vec![first, second]);
    manager.controller_mut().submit("one").await.unwrap();
    manager.controller_mut().submit("two").await.unwrap();

    manager.handle_key(key(KeyCode::PageUp));
    assert_eq!(manager.history_state().selected_index(2), Some(0));

    manager.handle_key(ctrl('r'));
    let text = screen(&manager);
    assert!(text.contains("ITAS-3.pdf - Pages 7"), "got:\n{text}");
    assert!(text.contains("▶ #1"), "got:\n{text}");
}
