//! Conversation state and the question submission flow

use crate::citations::{group_citations, Citation, GroupedCitation};
use crate::client::{AnswerError, AnswerService, QueryReply};
use crate::storage::SessionStore;
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Answer shown whenever the answering service cannot be reached or fails
pub const FALLBACK_ANSWER: &str = "service unavailable, try again later";

/// An answer and the citations supporting it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    #[serde(rename = "resources", default)]
    pub citations: Vec<Citation>,
}

impl AnswerResult {
    pub fn fallback() -> Self {
        AnswerResult {
            answer: FALLBACK_ANSWER.to_string(),
            citations: Vec::new(),
        }
    }

    pub fn grouped_citations(&self) -> Vec<GroupedCitation> {
        group_citations(&self.citations)
    }
}

/// One question paired with the answer shown for it
#[derive(Debug, Clone)]
pub struct Exchange {
    pub question: String,
    pub answer: AnswerResult,
    pub asked_at: DateTime<Local>,
}

/// A question that has been accepted and is waiting on the answering service
pub struct PendingSubmission {
    question: String,
    session_id: Option<String>,
    service: Arc<dyn AnswerService>,
}

impl PendingSubmission {
    pub fn question(&self) -> &str {
        &self.question
    }

    /// Token that will be sent with the request
    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    /// Perform the request
    pub async fn resolve(self) -> SettledSubmission {
        let outcome = self
            .service
            .query(&self.question, self.session_id.as_deref())
            .await;

        SettledSubmission {
            question: self.question,
            outcome,
        }
    }
}

/// The outcome of a pending submission, ready to be recorded
#[derive(Debug)]
pub struct SettledSubmission {
    pub question: String,
    pub outcome: Result<QueryReply, AnswerError>,
}

/// Holds the conversation and talks to the answering service
pub struct ConversationController {
    service: Arc<dyn AnswerService>,
    sessions: Arc<dyn SessionStore>,
    input: String,
    history: Vec<Exchange>,
    loading: bool,
    sidebar_collapsed: bool,
}

impl ConversationController {
    pub fn new(service: Arc<dyn AnswerService>, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            service,
            sessions,
            input: String::new(),
            history: Vec::new(),
            loading: false,
            sidebar_collapsed: false,
        }
    }

    /// Ask a question and record the exchange.
    ///
    /// Returns `None` without contacting the service when the question is
    /// blank. Failures are never returned; they become a fallback exchange.
    pub async fn submit(&mut self, question: &str) -> Option<&Exchange> {
        let pending = self.begin_submit(question)?;
        let settled = pending.resolve().await;
        Some(self.settle(settled))
    }

    /// Submit whatever is currently in the input line
    pub async fn submit_input(&mut self) -> Option<&Exchange> {
        let question = self.input.clone();
        self.submit(&question).await
    }

    /// First half of `submit`: validate, raise the loading flag and pick up
    /// the stored session token.
    pub fn begin_submit(&mut self, question: &str) -> Option<PendingSubmission> {
        if question.trim().is_empty() {
            return None;
        }

        self.loading = true;

        Some(PendingSubmission {
            question: question.to_string(),
            session_id: self.sessions.get(),
            service: Arc::clone(&self.service),
        })
    }

    /// Second half of `submit`: record the exchange and lower the loading flag
    pub fn settle(&mut self, settled: SettledSubmission) -> &Exchange {
        let SettledSubmission { question, outcome } = settled;

        let answer = match outcome {
            Ok(reply) => {
                if let Some(session_id) = reply.session_id {
                    self.remember_session(&session_id);
                }
                self.input.clear();
                reply.answer
            }
            Err(e) => {
                tracing::warn!(question = %question, "answering service failed: {}", e);
                AnswerResult::fallback()
            }
        };

        self.history.push(Exchange {
            question,
            answer,
            asked_at: Local::now(),
        });
        // A single flag, not a counter: with overlapping submissions the
        // first one to settle clears it while later ones are still pending.
        self.loading = false;

        &self.history[self.history.len() - 1]
    }

    fn remember_session(&self, session_id: &str) {
        match self.sessions.set_if_absent(session_id) {
            Ok(true) => tracing::info!("stored new session token"),
            Ok(false) => {}
            Err(e) => tracing::warn!("failed to store session token: {:#}", e),
        }
    }

    pub fn toggle_sidebar(&mut self) {
        self.sidebar_collapsed = !self.sidebar_collapsed;
    }

    pub fn is_sidebar_collapsed(&self) -> bool {
        self.sidebar_collapsed
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn history(&self) -> &[Exchange] {
        &self.history
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut String {
        &mut self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn session_id(&self) -> Option<String> {
        self.sessions.get()
    }
}
