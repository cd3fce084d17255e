//! Per-visitor chat state.
//!
//! A session alternates between two states derived from its transcript:
//! `Idle` when the last turn is the assistant's, `AwaitingAnswer` when it is
//! the user's. Only [`ChatSession::submit`] and [`ChatSession::resolve`]
//! append turns, so the transcript always alternates after the greeting.

use confassist_chatbot::{Answerer, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Who wrote a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One message in the transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Append-only list of turns, opened by an assistant greeting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<ChatTurn>,
}

impl Transcript {
    /// Start a transcript with the greeting as its only turn.
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            turns: vec![ChatTurn::assistant(greeting)],
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&ChatTurn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    fn push(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }
}

/// Whether a session is waiting for the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    AwaitingAnswer,
}

/// Result of [`ChatSession::submit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A user turn was appended.
    Accepted,
    /// Empty or whitespace-only input; nothing changed.
    Ignored,
    /// An earlier question is still unanswered; nothing changed.
    Busy,
}

/// One visitor's conversation.
#[derive(Debug, Clone)]
pub struct ChatSession {
    transcript: Transcript,
}

impl ChatSession {
    pub fn new(greeting: impl Into<String>) -> Self {
        Self {
            transcript: Transcript::new(greeting),
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn state(&self) -> SessionState {
        match self.transcript.last() {
            Some(turn) if turn.role == Role::User => SessionState::AwaitingAnswer,
            _ => SessionState::Idle,
        }
    }

    /// Record a user message.
    pub fn submit(&mut self, text: &str) -> SubmitOutcome {
        if text.trim().is_empty() {
            debug!("Ignoring empty message");
            return SubmitOutcome::Ignored;
        }
        if self.state() == SessionState::AwaitingAnswer {
            warn!("Rejecting message while an answer is pending");
            return SubmitOutcome::Busy;
        }

        self.transcript.push(ChatTurn::user(text));
        SubmitOutcome::Accepted
    }

    /// Answer the pending user turn, if there is one.
    ///
    /// Returns `Ok(true)` when an assistant turn was appended. On error the
    /// transcript is untouched, so the same question is asked again next time.
    pub async fn resolve(&mut self, answerer: &dyn Answerer) -> Result<bool> {
        let question = match self.transcript.last() {
            Some(turn) if turn.role == Role::User => turn.content.clone(),
            _ => return Ok(false),
        };

        let answer = answerer.answer(&question).await?;
        self.transcript.push(ChatTurn::assistant(answer));
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use confassist_chatbot::ChatBotError;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    const GREETING: &str = "Welcome!";

    /// Answers from a script, recording each question.
    struct Scripted {
        answers: Mutex<Vec<Result<String>>>,
        questions: Mutex<Vec<String>>,
    }

    impl Scripted {
        fn new(answers: Vec<Result<String>>) -> Self {
            Self {
                answers: Mutex::new(answers),
                questions: Mutex::new(Vec::new()),
            }
        }

        fn questions(&self) -> Vec<String> {
            self.questions.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Answerer for Scripted {
        async fn answer(&self, question: &str) -> Result<String> {
            self.questions.lock().unwrap().push(question.to_string());
            self.answers.lock().unwrap().remove(0)
        }
    }

    fn failure() -> ChatBotError {
        ChatBotError::InvalidResponse("boom".to_string())
    }

    #[test]
    fn test_new_session_is_idle_with_greeting() {
        let session = ChatSession::new(GREETING);
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(session.transcript().turns(), [ChatTurn::assistant(GREETING)]);
    }

    #[test]
    fn test_submit_transitions() {
        let mut session = ChatSession::new(GREETING);

        assert_eq!(session.submit(""), SubmitOutcome::Ignored);
        assert_eq!(session.submit(" \n\t"), SubmitOutcome::Ignored);
        assert_eq!(session.transcript().len(), 1);

        assert_eq!(session.submit("Any Rust talks?"), SubmitOutcome::Accepted);
        assert_eq!(session.state(), SessionState::AwaitingAnswer);

        assert_eq!(session.submit("Hello?"), SubmitOutcome::Busy);
        assert_eq!(
            session.transcript().last(),
            Some(&ChatTurn::user("Any Rust talks?"))
        );
    }

    #[tokio::test]
    async fn test_resolve_appends_answer_verbatim() {
        let answerer = Scripted::new(vec![Ok("  Try *Rust 101*.\n".to_string())]);
        let mut session = ChatSession::new(GREETING);
        session.submit("Any Rust talks?");

        assert!(session.resolve(&answerer).await.unwrap());
        assert_eq!(session.state(), SessionState::Idle);
        assert_eq!(
            session.transcript().turns(),
            [
                ChatTurn::assistant(GREETING),
                ChatTurn::user("Any Rust talks?"),
                ChatTurn::assistant("  Try *Rust 101*.\n"),
            ]
        );
    }

    #[tokio::test]
    async fn test_resolve_when_idle_is_a_no_op() {
        let answerer = Scripted::new(Vec::new());
        let mut session = ChatSession::new(GREETING);

        assert!(!session.resolve(&answerer).await.unwrap());
        assert!(!session.resolve(&answerer).await.unwrap());
        assert_eq!(session.transcript().len(), 1);
        assert!(answerer.questions().is_empty());
    }

    #[tokio::test]
    async fn test_failed_turn_is_retried_with_same_question() {
        let answerer = Scripted::new(vec![Err(failure()), Ok("Salon A at 9.".to_string())]);
        let mut session = ChatSession::new(GREETING);
        session.submit("Where is the keynote?");

        assert!(session.resolve(&answerer).await.is_err());
        assert_eq!(session.state(), SessionState::AwaitingAnswer);
        assert_eq!(session.transcript().len(), 2);

        assert!(session.resolve(&answerer).await.unwrap());
        assert_eq!(
            answerer.questions(),
            vec!["Where is the keynote?", "Where is the keynote?"]
        );
        assert_eq!(
            session.transcript().last(),
            Some(&ChatTurn::assistant("Salon A at 9."))
        );
    }

    #[tokio::test]
    async fn test_turns_alternate() {
        let answerer = Scripted::new(vec![Ok("one".to_string()), Ok("two".to_string())]);
        let mut session = ChatSession::new(GREETING);

        for question in ["first", "second"] {
            assert_eq!(session.submit(question), SubmitOutcome::Accepted);
            session.resolve(&answerer).await.unwrap();
        }

        let roles: Vec<Role> = session.transcript().turns().iter().map(|t| t.role).collect();
        assert_eq!(
            roles,
            vec![
                Role::Assistant,
                Role::User,
                Role::Assistant,
                Role::User,
                Role::Assistant
            ]
        );
    }
}
