//! Application state shared by the terminal UI and the one-shot commands.
//!
//! [`ChatApp`] is constructed once at start-up with the transport injected,
//! owns the session, model, conversation and composer state, and is only
//! reset through an explicit logout.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{ChatBackend, ChatResponse, EndpointModels, UserWithHistory};
use crate::core::error::{ApiError, ExchangeError};
use crate::core::conversations::ConversationList;
use crate::core::exchange::{Composer, MessageExchange, PendingSend, SendOutcome};
use crate::core::models::ModelSelection;
use crate::core::session::SessionStore;

/// Which main pane the view layer should draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewState {
    /// The start-up session probe has not settled.
    Loading,
    /// Nothing selected and nothing said: greeting and model picker.
    Landing,
    Transcript,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// One-line message for the status bar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

pub struct ChatApp {
    backend: Arc<dyn ChatBackend>,
    pub session: SessionStore,
    pub models: ModelSelection,
    pub conversations: ConversationList,
    pub composer: Composer,
    pub exchange: MessageExchange,
    notice: Option<Notice>,
}

impl ChatApp {
    pub fn new(backend: Arc<dyn ChatBackend>, preferred_model: Option<String>) -> Self {
        Self {
            backend,
            session: SessionStore::new(),
            models: ModelSelection::with_preferred(preferred_model),
            conversations: ConversationList::new(),
            composer: Composer::new(),
            exchange: MessageExchange::new(),
            notice: None,
        }
    }

    pub fn backend(&self) -> Arc<dyn ChatBackend> {
        Arc::clone(&self.backend)
    }

    pub fn apply_session_check(&mut self, result: Result<Option<UserWithHistory>, ApiError>) {
        if let Some(user) = self.session.apply_session_check(result) {
            self.conversations.apply_history(user.chat_history);
        }
    }

    pub fn apply_catalog(&mut self, result: Result<Vec<EndpointModels>, ApiError>) {
        match result {
            Ok(endpoints) => self.models.apply_catalog(endpoints),
            Err(err) => {
                warn!(error = %err, "Failed to fetch model catalog");
                self.notify_error(format!("Could not load models: {err}"));
            }
        }
    }

    pub fn view(&self) -> ViewState {
        if self.session.is_loading() {
            ViewState::Loading
        } else if self.conversations.is_new_chat() {
            ViewState::Landing
        } else {
            ViewState::Transcript
        }
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn notify_info(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            kind: NoticeKind::Info,
            text: text.into(),
        });
    }

    pub fn notify_error(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            kind: NoticeKind::Error,
            text: text.into(),
        });
    }

    pub fn clear_notice(&mut self) {
        self.notice = None;
    }

    /// Navigation abandons an in-flight send and resets the composer context.
    fn leave_current_chat(&mut self) {
        if self.exchange.abandon().is_some() {
            self.notify_info("Previous reply abandoned");
        }
        self.composer.reset_context();
    }

    pub fn select_conversation(&mut self, id: &str) {
        self.leave_current_chat();
        self.conversations.select(id);
    }

    pub fn new_chat(&mut self) {
        self.leave_current_chat();
        self.conversations.start_new_chat();
    }

    pub fn begin_send(&mut self) -> Result<PendingSend, ExchangeError> {
        let result = self.exchange.begin(
            &self.session,
            &self.models,
            &mut self.composer,
            &mut self.conversations,
        );
        match &result {
            Ok(_) => self.clear_notice(),
            Err(err) => self.notify_error(err.to_string()),
        }
        result
    }

    pub fn complete_send(
        &mut self,
        pending: &PendingSend,
        result: Result<ChatResponse, ApiError>,
    ) -> SendOutcome {
        let outcome = self
            .exchange
            .complete(pending, result, &mut self.conversations);
        if let SendOutcome::Failed(err) = &outcome {
            self.notify_error(format!("Send failed: {err}"));
        }
        outcome
    }

    pub fn apply_history(&mut self, result: Result<Option<UserWithHistory>, ApiError>) {
        match result {
            Ok(user) => self
                .conversations
                .apply_history(user.map(|u| u.chat_history).unwrap_or_default()),
            Err(err) => {
                warn!(error = %err, "Failed to refresh conversation history");
                self.notify_error(format!("Could not refresh history: {err}"));
            }
        }
    }

    /// Email of the logged-in user, or a notice explaining why not.
    pub fn require_email(&mut self) -> Option<String> {
        let email = self.session.user().map(|user| user.email.clone());
        if email.is_none() {
            self.notify_error(ExchangeError::NotAuthenticated.to_string());
        }
        email
    }

    pub fn apply_delete(&mut self, id: &str, result: Result<(), ApiError>) {
        match result {
            Ok(()) => {
                if self.conversations.active_id() == Some(id) {
                    self.leave_current_chat();
                }
                self.conversations.confirm_deleted(id);
                self.notify_info("Conversation deleted");
            }
            Err(err) => {
                warn!(conversation_id = %id, error = %err, "Failed to delete conversation");
                self.notify_error(format!("Could not delete conversation: {err}"));
            }
        }
    }

    pub async fn logout(&mut self) -> Result<(), ApiError> {
        self.leave_current_chat();
        let result = self.session.logout(self.backend.as_ref()).await;
        self.conversations = ConversationList::new();
        info!("Local state reset after logout");
        result
    }
}
