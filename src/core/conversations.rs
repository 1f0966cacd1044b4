//! Conversation history, the active selection, and the visible transcript.
//!
//! The list owns every [`Conversation`]; the active selection is only an id.
//! The transcript is what the view renders: the active conversation's
//! messages plus any entries appended by an exchange that has not yet been
//! reconciled with the server.

use tracing::{debug, info};

use crate::core::message::{Conversation, Message};

#[derive(Debug, Default)]
pub struct ConversationList {
    conversations: Vec<Conversation>,
    active_id: Option<String>,
    transcript: Vec<Message>,
    /// Entries of the in-flight exchange, re-appended after every resync.
    unconfirmed: Vec<Message>,
}

impl ConversationList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent first.
    pub fn conversations(&self) -> &[Conversation] {
        &self.conversations
    }

    pub fn get(&self, id: &str) -> Option<&Conversation> {
        self.conversations.iter().find(|c| c.id == id)
    }

    pub fn active_id(&self) -> Option<&str> {
        self.active_id.as_deref()
    }

    pub fn active(&self) -> Option<&Conversation> {
        self.active_id.as_deref().and_then(|id| self.get(id))
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// No conversation is active and nothing has been said yet.
    pub fn is_new_chat(&self) -> bool {
        self.active_id.is_none() && self.transcript.is_empty()
    }

    /// Replaces the list wholesale with the server's history.
    ///
    /// The service stores history oldest-first; the list keeps it
    /// most-recent-first.
    pub fn apply_history(&mut self, mut history: Vec<Conversation>) {
        history.reverse();
        debug!(count = history.len(), "Conversation history replaced");
        self.conversations = history;
        self.sync_transcript();
    }

    /// Makes `id` active. An id missing from the list renders empty.
    pub fn select(&mut self, id: &str) {
        self.active_id = Some(id.to_string());
        self.unconfirmed.clear();
        self.sync_transcript();
    }

    /// Clears the active selection and the transcript.
    pub fn start_new_chat(&mut self) {
        self.active_id = None;
        self.transcript.clear();
        self.unconfirmed.clear();
    }

    /// Applies a delete the server has acknowledged.
    pub fn confirm_deleted(&mut self, id: &str) {
        self.conversations.retain(|c| c.id != id);
        if self.active_id.as_deref() == Some(id) {
            self.start_new_chat();
        }
        info!(conversation_id = %id, "Conversation deleted");
    }

    /// Appends an entry the server has not confirmed yet.
    pub(crate) fn push_unconfirmed(&mut self, message: Message) {
        self.unconfirmed.push(message.clone());
        self.transcript.push(message);
    }

    /// Settles the unconfirmed entries and appends the assistant's entry.
    pub(crate) fn push_settled(&mut self, message: Message) {
        self.unconfirmed.clear();
        self.transcript.push(message);
    }

    /// Makes a conversation the server just created the active one.
    pub(crate) fn adopt(&mut self, conversation: Conversation) {
        debug!(conversation_id = %conversation.id, "Adopting new conversation");
        self.active_id = Some(conversation.id.clone());
        if let Some(existing) = self
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation.id)
        {
            *existing = conversation;
        } else {
            self.conversations.insert(0, conversation);
        }
    }

    /// Mirrors a confirmed exchange onto the stored conversation it belongs to.
    pub(crate) fn record_exchange(&mut self, conversation_id: &str, user: Message, reply: Message) {
        if let Some(conversation) = self
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
        {
            conversation.messages.push(user);
            conversation.messages.push(reply);
        }
    }

    fn sync_transcript(&mut self) {
        let Some(active_id) = self.active_id.as_deref() else {
            return;
        };
        let mut transcript = self
            .conversations
            .iter()
            .find(|c| c.id == active_id)
            .map(|c| c.messages.clone())
            .unwrap_or_default();
        transcript.extend(self.unconfirmed.iter().cloned());
        self.transcript = transcript;
    }
}
