use crate::controller::SettledSubmission;
use crate::ui::conversation::{ConversationAction, ConversationManager};
use anyhow::{Context, Result};
use crossterm::{
    event::{Event, EventStream},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::future::BoxFuture;
use futures::stream::{FuturesUnordered, StreamExt};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};

type ChatTerminal = Terminal<CrosstermBackend<Stdout>>;

/// Run the chat screen until the user quits.
///
/// Submissions still pending at exit are dropped and their answers discarded.
pub async fn run(manager: &mut ConversationManager) -> Result<()> {
    let mut terminal = setup_terminal()?;
    let result = event_loop(&mut terminal, manager).await;
    restore_terminal(&mut terminal)?;
    result
}

fn setup_terminal() -> Result<ChatTerminal> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    Terminal::new(CrosstermBackend::new(stdout)).context("Failed to create terminal")
}

fn restore_terminal(terminal: &mut ChatTerminal) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

async fn event_loop(terminal: &mut ChatTerminal, manager: &mut ConversationManager) -> Result<()> {
    let mut events = EventStream::new();
    let mut pending: FuturesUnordered<BoxFuture<'static, SettledSubmission>> =
        FuturesUnordered::new();

    loop {
        terminal
            .draw(|frame| manager.render(frame))
            .context("Failed to draw frame")?;

        tokio::select! {
            event = events.next() => {
                let Some(event) = event else {
                    tracing::info!("terminal event stream closed");
                    return Ok(());
                };
                if let Event::Key(key) = event.context("Failed to read terminal event")? {
                    match manager.handle_key(key) {
                        ConversationAction::Submit(submission) => {
                            tracing::debug!(
                                question = %submission.question(),
                                "question submitted"
                            );
                            pending.push(Box::pin(submission.resolve()));
                        }
                        ConversationAction::Exit => {
                            if !pending.is_empty() {
                                tracing::info!(
                                    pending = pending.len(),
                                    "discarding unanswered questions"
                                );
                            }
                            return Ok(());
                        }
                        ConversationAction::None => {}
                    }
                }
            }
            Some(settled) = pending.next(), if !pending.is_empty() => {
                manager.controller_mut().settle(settled);
            }
        }
    }
}
