//! Sending a message and reconciling the reply.
//!
//! A send is two explicit phases:
//!
//! 1. [`MessageExchange::begin`] validates, appends the tentative user entry to
//!    the transcript, consumes the composer's attachment and returns a
//!    [`PendingSend`] carrying the fully built request.
//! 2. [`MessageExchange::complete`] appends the assistant entry, either the
//!    server's answer or the fixed apology, and adopts a newly created
//!    conversation.
//!
//! Between the two phases the caller owns the network call through
//! [`PendingSend::dispatch`], which lets the terminal UI run it on a
//! background task.

use tracing::{debug, warn};

use crate::api::{ChatBackend, ChatResponse, InvokeRequest, InvokeRoute, PayloadKind};
use crate::core::attachment::Attachment;
use crate::core::conversations::ConversationList;
use crate::core::error::{ApiError, ExchangeError};
use crate::core::message::{Message, CONNECTION_APOLOGY};
use crate::core::models::ModelSelection;
use crate::core::session::SessionStore;

/// Unsent input: text, at most one attachment, and the RAG toggle.
#[derive(Debug, Default, Clone)]
pub struct Composer {
    pub text: String,
    attachment: Option<Attachment>,
    rag: bool,
}

impl Composer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attachment(&self) -> Option<&Attachment> {
        self.attachment.as_ref()
    }

    /// Queues an attachment, replacing whatever was pending.
    pub fn attach(&mut self, attachment: Attachment) {
        if let Some(previous) = self.attachment.replace(attachment) {
            debug!(file = %previous.file_name, "Replaced pending attachment");
        }
    }

    pub fn detach(&mut self) -> Option<Attachment> {
        self.attachment.take()
    }

    pub fn rag_enabled(&self) -> bool {
        self.rag
    }

    pub fn set_rag(&mut self, enabled: bool) {
        self.rag = enabled;
    }

    pub fn toggle_rag(&mut self) -> bool {
        self.rag = !self.rag;
        self.rag
    }

    /// Blank text is only sendable alongside an attachment.
    pub fn can_submit(&self) -> bool {
        !self.text.trim().is_empty() || self.attachment.is_some()
    }

    /// Drops the pending attachment and turns RAG off, as on navigation.
    pub fn reset_context(&mut self) {
        self.attachment = None;
        self.rag = false;
    }
}

/// A send whose user entry is already in the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSend {
    pub id: u64,
    pub request: InvokeRequest,
    /// The tentative user entry, as appended.
    pub user_message: Message,
}

impl PendingSend {
    pub async fn dispatch(&self, backend: &dyn ChatBackend) -> Result<ChatResponse, ApiError> {
        backend.invoke(&self.request).await
    }
}

/// What [`MessageExchange::complete`] did with a settled send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The reply was appended; `refresh_history` asks the caller to reload
    /// the conversation list because the server created a conversation.
    Replied { refresh_history: bool },
    /// The apology was appended in place of a reply.
    Failed(ApiError),
    /// The send had been abandoned; nothing was appended.
    Discarded,
}

#[derive(Debug, Default)]
pub struct MessageExchange {
    next_id: u64,
    in_flight: Option<u64>,
}

impl MessageExchange {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_sending(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<u64> {
        self.in_flight
    }

    /// Phase one. On error nothing is appended and the composer is untouched.
    pub fn begin(
        &mut self,
        session: &SessionStore,
        models: &ModelSelection,
        composer: &mut Composer,
        conversations: &mut ConversationList,
    ) -> Result<PendingSend, ExchangeError> {
        let user = session.user().ok_or(ExchangeError::NotAuthenticated)?;
        if self.in_flight.is_some() {
            return Err(ExchangeError::SendInFlight);
        }
        if !composer.can_submit() {
            return Err(ExchangeError::EmptyMessage);
        }

        let text = std::mem::take(&mut composer.text);
        let attachment = composer.detach();
        let user_content = match &attachment {
            Some(attachment) if text.trim().is_empty() => {
                attachment.kind.placeholder().to_string()
            }
            _ => text.clone(),
        };

        let route = InvokeRoute::new(
            PayloadKind::for_attachment(attachment.as_ref().map(|a| a.kind)),
            composer.rag_enabled(),
        );
        let request = InvokeRequest {
            route,
            user_email: user.email.clone(),
            model: models.active_model().to_string(),
            text,
            attachment,
            conversation_id: conversations.active_id().map(str::to_owned),
        };

        let user_message = Message::user(user_content);
        conversations.push_unconfirmed(user_message.clone());

        self.next_id += 1;
        let id = self.next_id;
        self.in_flight = Some(id);
        debug!(send_id = id, route = request.route.path(), "Send started");

        Ok(PendingSend {
            id,
            request,
            user_message,
        })
    }

    /// Phase two: appends exactly one assistant entry for the in-flight send.
    pub fn complete(
        &mut self,
        pending: &PendingSend,
        result: Result<ChatResponse, ApiError>,
        conversations: &mut ConversationList,
    ) -> SendOutcome {
        if self.in_flight != Some(pending.id) {
            debug!(send_id = pending.id, "Dropping result of abandoned send");
            return SendOutcome::Discarded;
        }
        self.in_flight = None;

        match result {
            Ok(response) => {
                let reply = Message::assistant(response.ai_response);
                conversations.push_settled(reply.clone());

                match response.new_conversation {
                    Some(conversation) => {
                        conversations.adopt(conversation);
                        SendOutcome::Replied {
                            refresh_history: true,
                        }
                    }
                    None => {
                        if let Some(id) = pending.request.conversation_id.as_deref() {
                            conversations.record_exchange(
                                id,
                                pending.user_message.clone(),
                                reply,
                            );
                        }
                        SendOutcome::Replied {
                            refresh_history: false,
                        }
                    }
                }
            }
            Err(err) => {
                warn!(send_id = pending.id, error = %err, "Send failed");
                conversations.push_settled(Message::assistant(CONNECTION_APOLOGY));
                SendOutcome::Failed(err)
            }
        }
    }

    /// Forgets the in-flight send; its late result will be discarded.
    pub fn abandon(&mut self) -> Option<u64> {
        let abandoned = self.in_flight.take();
        if let Some(id) = abandoned {
            debug!(send_id = id, "Send abandoned");
        }
        abandoned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::attachment::AttachmentKind;
    use crate::core::message::{Conversation, Role, FILE_PLACEHOLDER, IMAGE_PLACEHOLDER};
    use crate::utils::test_utils::{
        conversation, sample_catalog, sample_probe, ScriptedBackend,
    };

    struct Fixture {
        backend: ScriptedBackend,
        session: SessionStore,
        models: ModelSelection,
        composer: Composer,
        conversations: ConversationList,
        exchange: MessageExchange,
    }

    impl Fixture {
        fn new(backend: ScriptedBackend) -> Self {
            let mut session = SessionStore::new();
            session.apply_session_check(Ok(Some(sample_probe())));
            let mut models = ModelSelection::new();
            models.apply_catalog(sample_catalog());
            Self {
                backend,
                session,
                models,
                composer: Composer::new(),
                conversations: ConversationList::new(),
                exchange: MessageExchange::new(),
            }
        }

        async fn send(&mut self, text: &str) -> Result<SendOutcome, ExchangeError> {
            let pending = self.begin(text)?;
            let result = pending.dispatch(&self.backend).await;
            Ok(self
                .exchange
                .complete(&pending, result, &mut self.conversations))
        }

        fn begin(&mut self, text: &str) -> Result<PendingSend, ExchangeError> {
            self.composer.text = text.to_string();
            self.exchange.begin(
                &self.session,
                &self.models,
                &mut self.composer,
                &mut self.conversations,
            )
        }
    }

    fn created(id: &str, title: &str) -> Conversation {
        Conversation {
            id: id.into(),
            title: title.into(),
            rag_mode: false,
            messages: vec![Message::user(title), Message::assistant("server text")],
        }
    }

    #[tokio::test]
    async fn first_send_creates_and_adopts_conversation() {
        let backend = ScriptedBackend::new().with_reply(ChatResponse {
            ai_response: "server text".into(),
            new_conversation: Some(created("c-new", "Hello")),
        });
        let mut fx = Fixture::new(backend);

        let outcome = fx.send("Hello").await.expect("send");
        assert_eq!(
            outcome,
            SendOutcome::Replied {
                refresh_history: true
            }
        );
        assert_eq!(
            fx.conversations.transcript(),
            [Message::user("Hello"), Message::assistant("server text")]
        );
        assert_eq!(fx.conversations.active_id(), Some("c-new"));
        assert!(fx.conversations.get("c-new").is_some());
        assert_eq!(fx.conversations.conversations()[0].id, "c-new");

        let request = &fx.backend.invocations()[0];
        assert_eq!(request.route.path(), "chat/invoke");
        assert_eq!(request.user_email, "a@x.com");
        assert_eq!(request.model, "gpt-4o");
        assert_eq!(request.conversation_id, None);
        assert_eq!(fx.backend.user_fetches(), 0);
    }

    #[tokio::test]
    async fn network_failure_appends_apology_only() {
        let backend =
            ScriptedBackend::new().with_invoke_error(ApiError::Network("refused".into()));
        let mut fx = Fixture::new(backend);

        let outcome = fx.send("Hello").await.expect("send");
        assert!(matches!(outcome, SendOutcome::Failed(ApiError::Network(_))));
        assert_eq!(
            fx.conversations.transcript(),
            [
                Message::user("Hello"),
                Message::assistant("Sorry, I couldn't connect to the server.")
            ]
        );
        assert!(!fx.exchange.is_sending());
    }

    #[tokio::test]
    async fn http_error_status_is_a_failure_too() {
        let backend = ScriptedBackend::new().with_invoke_error(ApiError::http(500, None));
        let mut fx = Fixture::new(backend);

        fx.send("Hello").await.expect("send");
        let last = fx.conversations.transcript().last().expect("reply");
        assert_eq!(last.content, CONNECTION_APOLOGY);
    }

    #[tokio::test]
    async fn every_send_grows_transcript_by_two() {
        let backend = ScriptedBackend::new()
            .with_invoke_error(ApiError::Network("flaky".into()));
        let mut fx = Fixture::new(backend);

        for (round, text) in ["one", "two", "three"].iter().enumerate() {
            let before = fx.conversations.transcript().len();
            fx.send(text).await.expect("send");
            assert_eq!(fx.conversations.transcript().len(), before + 2, "round {round}");
        }
    }

    #[tokio::test]
    async fn send_without_user_touches_nothing() {
        let mut fx = Fixture::new(ScriptedBackend::new());
        fx.session.clear();

        let err = fx.send("Hello").await.expect_err("anonymous");
        assert_eq!(err, ExchangeError::NotAuthenticated);
        assert!(fx.conversations.transcript().is_empty());
        assert_eq!(fx.backend.call_count(), 0);
    }

    #[tokio::test]
    async fn blank_text_without_attachment_is_rejected() {
        let mut fx = Fixture::new(ScriptedBackend::new());

        let err = fx.send("   ").await.expect_err("blank");
        assert_eq!(err, ExchangeError::EmptyMessage);
        assert!(fx.conversations.transcript().is_empty());
        assert_eq!(fx.backend.call_count(), 0);
    }

    #[tokio::test]
    async fn image_without_text_uses_placeholder_and_image_route() {
        let mut fx = Fixture::new(ScriptedBackend::new());
        fx.composer.attach(Attachment::image("cat.png", vec![1, 2, 3]));

        fx.send("").await.expect("send");
        assert_eq!(fx.conversations.transcript()[0].content, IMAGE_PLACEHOLDER);
        let request = &fx.backend.invocations()[0];
        assert_eq!(request.route.path(), "chat/invoke_with_image");
        assert_eq!(request.text, "");
        assert!(fx.composer.attachment().is_none());
    }

    #[tokio::test]
    async fn document_with_rag_uses_rag_file_route() {
        let mut fx = Fixture::new(ScriptedBackend::new());
        fx.composer.attach(Attachment::document("notes.txt", b"x".to_vec()));
        fx.composer.set_rag(true);

        fx.send("").await.expect("send");
        assert_eq!(fx.conversations.transcript()[0].content, FILE_PLACEHOLDER);
        assert_eq!(
            fx.backend.invocations()[0].route.path(),
            "chat/invoke_rag_with_text_file"
        );
    }

    #[test]
    fn attaching_image_after_document_keeps_only_the_image() {
        let mut composer = Composer::new();
        composer.attach(Attachment::document("notes.txt", vec![]));
        composer.attach(Attachment::image("cat.png", vec![]));

        let pending = composer.attachment().expect("attachment");
        assert_eq!(pending.kind, AttachmentKind::Image);
        assert_eq!(pending.file_name, "cat.png");
    }

    #[tokio::test]
    async fn attachment_is_discarded_after_failed_send() {
        let backend = ScriptedBackend::new().with_invoke_error(ApiError::http(502, None));
        let mut fx = Fixture::new(backend);
        fx.composer.attach(Attachment::image("cat.png", vec![]));

        fx.send("look").await.expect("send");
        assert!(fx.composer.attachment().is_none());
        assert_eq!(fx.conversations.transcript()[0].content, "look");
    }

    #[tokio::test]
    async fn existing_conversation_records_exchange_without_refresh() {
        let mut fx = Fixture::new(ScriptedBackend::new());
        fx.conversations
            .apply_history(vec![conversation("c1", "First", 2)]);
        fx.conversations.select("c1");

        let outcome = fx.send("more").await.expect("send");
        assert_eq!(
            outcome,
            SendOutcome::Replied {
                refresh_history: false
            }
        );
        assert_eq!(fx.conversations.transcript().len(), 4);
        assert_eq!(fx.conversations.get("c1").map(|c| c.messages.len()), Some(4));
        assert_eq!(
            fx.backend.invocations()[0].conversation_id.as_deref(),
            Some("c1")
        );
        assert_eq!(fx.backend.user_fetches(), 0);
    }

    #[test]
    fn two_phases_are_observable_separately() {
        let mut fx = Fixture::new(ScriptedBackend::new());

        let pending = fx.begin("Hello").expect("begin");
        assert_eq!(fx.conversations.transcript(), [Message::user("Hello")]);
        assert!(fx.exchange.is_sending());
        assert_eq!(fx.begin("again"), Err(ExchangeError::SendInFlight));
        assert_eq!(fx.conversations.transcript().len(), 1);

        let outcome = fx.exchange.complete(
            &pending,
            Ok(ChatResponse {
                ai_response: "Hi".into(),
                new_conversation: None,
            }),
            &mut fx.conversations,
        );
        assert_eq!(
            outcome,
            SendOutcome::Replied {
                refresh_history: false
            }
        );
        assert_eq!(fx.conversations.transcript()[1].role, Role::Assistant);
    }

    #[test]
    fn abandoned_send_result_is_discarded() {
        let mut fx = Fixture::new(ScriptedBackend::new());
        let pending = fx.begin("Hello").expect("begin");

        fx.exchange.abandon();
        fx.conversations.start_new_chat();
        let outcome = fx.exchange.complete(
            &pending,
            Err(ApiError::Network("late".into())),
            &mut fx.conversations,
        );
        assert_eq!(outcome, SendOutcome::Discarded);
        assert!(fx.conversations.transcript().is_empty());
    }

    #[test]
    fn reset_context_clears_attachment_and_rag() {
        let mut composer = Composer::new();
        composer.attach(Attachment::image("cat.png", vec![]));
        composer.toggle_rag();

        composer.reset_context();
        assert!(composer.attachment().is_none());
        assert!(!composer.rag_enabled());
    }
}
