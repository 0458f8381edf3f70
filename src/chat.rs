//! Conversational cooking assistant. The history lives only as long as the session.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::api_connection::endpoints::{ChatRequest, ChatResponse};
use crate::api_connection::{ApiClient, ApiConnectionError};
use crate::progress::{CookingSession, ProgressStore};

/// Prior turns sent along with each question.
pub const CONTEXT_TURNS: usize = 5;
pub const FALLBACK_REPLY: &str = "Sorry, I'm having trouble responding right now. Please try again.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggestions: Vec<String>,
}

impl ChatTurn {
    fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            timestamp: Utc::now(),
            suggestions: Vec::new(),
        }
    }

    fn assistant(content: impl Into<String>, suggestions: Vec<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
            suggestions,
        }
    }
}

#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn ask(&self, request: &ChatRequest) -> Result<ChatResponse, ApiConnectionError>;
}

#[async_trait]
impl ChatApi for ApiClient {
    async fn ask(&self, request: &ChatRequest) -> Result<ChatResponse, ApiConnectionError> {
        self.chat(request).await
    }
}

/// Where the cook currently is, as told to the assistant.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub recipe_title: &'a str,
    /// 0-based index into the step list.
    pub current_step: usize,
    pub total_steps: usize,
    pub current_instruction: Option<&'a str>,
}

impl<'a> StepContext<'a> {
    pub fn from_session<S: ProgressStore>(session: &'a CookingSession<S>) -> Self {
        Self {
            recipe_title: &session.recipe().title,
            current_step: session.current_step(),
            total_steps: session.steps().len(),
            current_instruction: session.current_instruction(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ChatSession {
    turns: Vec<ChatTurn>,
    handled: HashSet<(usize, usize)>,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    /// Sends a question; blank messages are ignored.
    ///
    /// Returns the assistant's turn, which is a fallback apology if the service failed.
    pub async fn send<A: ChatApi + ?Sized>(
        &mut self,
        api: &A,
        message: &str,
        context: &StepContext<'_>,
    ) -> Option<&ChatTurn> {
        let message = message.trim();
        if message.is_empty() {
            return None;
        }

        let history = self.turns[self.turns.len().saturating_sub(CONTEXT_TURNS)..].to_vec();
        self.turns.push(ChatTurn::user(message));

        let request = ChatRequest {
            message: message.to_string(),
            recipe: context.recipe_title.to_string(),
            current_step: context.current_step + 1,
            total_steps: context.total_steps,
            current_instruction: context.current_instruction.map(str::to_string),
            chat_history: history,
        };

        let reply = match api.ask(&request).await {
            Ok(response) => ChatTurn::assistant(response.response, response.suggestions),
            Err(e) => {
                tracing::warn!(error = %e, "chat assistant unavailable");
                ChatTurn::assistant(FALLBACK_REPLY, Vec::new())
            }
        };
        self.turns.push(reply);
        self.turns.last()
    }

    /// Marks a suggestion as handled and asks it as the next question.
    pub async fn accept_suggestion<A: ChatApi + ?Sized>(
        &mut self,
        api: &A,
        turn: usize,
        suggestion: usize,
        context: &StepContext<'_>,
    ) -> Option<&ChatTurn> {
        let text = self.turns.get(turn)?.suggestions.get(suggestion)?.clone();
        self.handled.insert((turn, suggestion));
        self.send(api, &text, context).await
    }

    pub fn reject_suggestion(&mut self, turn: usize, suggestion: usize) -> bool {
        let exists = self
            .turns
            .get(turn)
            .is_some_and(|t| suggestion < t.suggestions.len());
        if exists {
            self.handled.insert((turn, suggestion));
        }
        exists
    }

    pub fn is_handled(&self, turn: usize, suggestion: usize) -> bool {
        self.handled.contains(&(turn, suggestion))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct ScriptedAssistant {
        fail: bool,
        requests: Mutex<Vec<ChatRequest>>,
    }

    #[async_trait]
    impl ChatApi for ScriptedAssistant {
        async fn ask(&self, request: &ChatRequest) -> Result<ChatResponse, ApiConnectionError> {
            self.requests.lock().unwrap().push(request.clone());
            if self.fail {
                return Err(ApiConnectionError::MissingToken);
            }
            Ok(ChatResponse {
                response: format!("About '{}'", request.message),
                suggestions: vec!["Can I use ghee?".to_string(), "How spicy is it?".to_string()],
            })
        }
    }

    fn context() -> StepContext<'static> {
        StepContext {
            recipe_title: "Dal Tadka",
            current_step: 1,
            total_steps: 4,
            current_instruction: Some("Temper the spices"),
        }
    }

    #[tokio::test]
    async fn send_records_both_turns_and_step_context() {
        let api = ScriptedAssistant::default();
        let mut chat = ChatSession::new();

        let reply = chat.send(&api, "  What oil?  ", &context()).await.unwrap();
        assert_eq!(reply.role, ChatRole::Assistant);
        assert_eq!(reply.content, "About 'What oil?'");
        assert_eq!(chat.turns().len(), 2);

        let requests = api.requests.lock().unwrap();
        assert_eq!(requests[0].current_step, 2);
        assert_eq!(requests[0].total_steps, 4);
        assert_eq!(requests[0].current_instruction.as_deref(), Some("Temper the spices"));
        assert!(requests[0].chat_history.is_empty());
    }

    #[tokio::test]
    async fn blank_messages_are_ignored() {
        let api = ScriptedAssistant::default();
        let mut chat = ChatSession::new();
        assert!(chat.send(&api, "   ", &context()).await.is_none());
        assert!(chat.turns().is_empty());
        assert!(api.requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn history_is_limited_to_recent_turns() {
        let api = ScriptedAssistant::default();
        let mut chat = ChatSession::new();
        for i in 0..4 {
            chat.send(&api, &format!("question {}", i), &context()).await;
        }

        let requests = api.requests.lock().unwrap();
        let last = requests.last().unwrap();
        assert_eq!(last.chat_history.len(), CONTEXT_TURNS);
        assert_eq!(last.chat_history[0].content, "About 'question 0'");
    }

    #[tokio::test]
    async fn failures_fall_back_to_apology() {
        let api = ScriptedAssistant {
            fail: true,
            ..ScriptedAssistant::default()
        };
        let mut chat = ChatSession::new();
        let reply = chat.send(&api, "Help", &context()).await.unwrap();
        assert_eq!(reply.content, FALLBACK_REPLY);
        assert!(reply.suggestions.is_empty());
    }

    #[tokio::test]
    async fn suggestions_can_be_accepted_or_rejected() {
        let api = ScriptedAssistant::default();
        let mut chat = ChatSession::new();
        chat.send(&api, "Any tips?", &context()).await;

        let reply = chat.accept_suggestion(&api, 1, 0, &context()).await.unwrap();
        assert_eq!(reply.content, "About 'Can I use ghee?'");
        assert!(chat.is_handled(1, 0));
        assert!(!chat.is_handled(1, 1));

        assert!(chat.reject_suggestion(1, 1));
        assert!(chat.is_handled(1, 1));
        assert!(!chat.reject_suggestion(0, 0));
        assert!(chat.accept_suggestion(&api, 1, 9, &context()).await.is_none());
    }
}
