use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::api::{
    ChatBackend, ChatResponse, EndpointModels, InvokeRequest, LoginResponse, RegisterResponse,
    UserWithHistory,
};
use crate::core::app::ChatApp;
use crate::core::error::ApiError;
use crate::core::message::{Conversation, Message, User};

pub fn sample_user() -> User {
    User {
        id: "u1".to_string(),
        name: "Ada".to_string(),
        email: "a@x.com".to_string(),
    }
}

/// A conversation whose messages alternate user / assistant.
pub fn conversation(id: &str, title: &str, message_count: usize) -> Conversation {
    let messages = (0..message_count)
        .map(|i| {
            if i % 2 == 0 {
                Message::user(format!("{title} question {i}"))
            } else {
                Message::assistant(format!("{title} answer {i}"))
            }
        })
        .collect();
    Conversation {
        id: id.to_string(),
        title: title.to_string(),
        rag_mode: false,
        messages,
    }
}

/// Session probe with two conversations, oldest first as the service sends them.
pub fn sample_probe() -> UserWithHistory {
    let user = sample_user();
    UserWithHistory {
        id: user.id,
        name: user.name,
        email: user.email,
        chat_history: vec![conversation("c1", "First", 2), conversation("c2", "Second", 2)],
    }
}

/// Settles the session and loads the catalog in the order the chat loop does.
pub async fn start_up(app: &mut ChatApp) {
    let backend = app.backend();
    app.apply_session_check(backend.current_user().await);
    app.apply_catalog(backend.fetch_catalog().await);
}

pub fn sample_catalog() -> Vec<EndpointModels> {
    vec![
        EndpointModels {
            provider: "openAI".to_string(),
            models: vec!["gpt-4o".to_string(), "gpt-4-turbo".to_string()],
        },
        EndpointModels {
            provider: "google".to_string(),
            models: vec!["gemini-pro".to_string()],
        },
        EndpointModels {
            provider: "anthropic".to_string(),
            models: vec!["claude-3-haiku-20240307".to_string()],
        },
    ]
}

#[derive(Default)]
struct Script {
    user: Option<Result<Option<UserWithHistory>, ApiError>>,
    register_error: Option<ApiError>,
    login_error: Option<ApiError>,
    logout_error: Option<ApiError>,
    catalog: Option<Result<Vec<EndpointModels>, ApiError>>,
    replies: VecDeque<Result<ChatResponse, ApiError>>,
    delete_error: Option<ApiError>,
}

#[derive(Default)]
struct Recorded {
    calls: usize,
    user_fetches: usize,
    invocations: Vec<InvokeRequest>,
    deleted: Vec<(String, String)>,
}

/// In-memory [`ChatBackend`] that replays canned results and records calls.
///
/// Unscripted calls succeed: login returns a user for the given email,
/// invokes echo the text without creating a conversation.
#[derive(Default)]
pub struct ScriptedBackend {
    script: Mutex<Script>,
    recorded: Mutex<Recorded>,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn scripted(self, edit: impl FnOnce(&mut Script)) -> Self {
        edit(&mut self.script.lock().unwrap());
        self
    }

    pub fn with_user(self, user: Option<UserWithHistory>) -> Self {
        self.scripted(|s| s.user = Some(Ok(user)))
    }

    pub fn with_user_error(self, err: ApiError) -> Self {
        self.scripted(|s| s.user = Some(Err(err)))
    }

    pub fn with_register_error(self, err: ApiError) -> Self {
        self.scripted(|s| s.register_error = Some(err))
    }

    pub fn with_login_error(self, err: ApiError) -> Self {
        self.scripted(|s| s.login_error = Some(err))
    }

    pub fn with_logout_error(self, err: ApiError) -> Self {
        self.scripted(|s| s.logout_error = Some(err))
    }

    pub fn with_catalog(self, catalog: Vec<EndpointModels>) -> Self {
        self.scripted(|s| s.catalog = Some(Ok(catalog)))
    }

    pub fn with_catalog_error(self, err: ApiError) -> Self {
        self.scripted(|s| s.catalog = Some(Err(err)))
    }

    /// Queues a reply; queued results are consumed in order.
    pub fn with_reply(self, reply: ChatResponse) -> Self {
        self.scripted(|s| s.replies.push_back(Ok(reply)))
    }

    pub fn with_invoke_error(self, err: ApiError) -> Self {
        self.scripted(|s| s.replies.push_back(Err(err)))
    }

    pub fn with_delete_error(self, err: ApiError) -> Self {
        self.scripted(|s| s.delete_error = Some(err))
    }

    pub fn call_count(&self) -> usize {
        self.recorded.lock().unwrap().calls
    }

    pub fn user_fetches(&self) -> usize {
        self.recorded.lock().unwrap().user_fetches
    }

    pub fn invocations(&self) -> Vec<InvokeRequest> {
        self.recorded.lock().unwrap().invocations.clone()
    }

    pub fn deleted(&self) -> Vec<(String, String)> {
        self.recorded.lock().unwrap().deleted.clone()
    }

    fn record(&self, edit: impl FnOnce(&mut Recorded)) {
        let mut recorded = self.recorded.lock().unwrap();
        recorded.calls += 1;
        edit(&mut recorded);
    }
}

#[async_trait]
impl ChatBackend for ScriptedBackend {
    async fn current_user(&self) -> Result<Option<UserWithHistory>, ApiError> {
        self.record(|r| r.user_fetches += 1);
        self.script
            .lock()
            .unwrap()
            .user
            .clone()
            .unwrap_or(Ok(None))
    }

    async fn register(
        &self,
        _name: &str,
        _email: &str,
        _password: &str,
    ) -> Result<RegisterResponse, ApiError> {
        self.record(|_| {});
        match self.script.lock().unwrap().register_error.clone() {
            Some(err) => Err(err),
            None => Ok(RegisterResponse {
                message: Some("User registered successfully".to_string()),
            }),
        }
    }

    async fn login(&self, email: &str, _password: &str) -> Result<LoginResponse, ApiError> {
        self.record(|_| {});
        match self.script.lock().unwrap().login_error.clone() {
            Some(err) => Err(err),
            None => Ok(LoginResponse {
                user: User {
                    email: email.to_string(),
                    ..sample_user()
                },
            }),
        }
    }

    async fn logout(&self) -> Result<(), ApiError> {
        self.record(|_| {});
        match self.script.lock().unwrap().logout_error.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn fetch_catalog(&self) -> Result<Vec<EndpointModels>, ApiError> {
        self.record(|_| {});
        self.script
            .lock()
            .unwrap()
            .catalog
            .clone()
            .unwrap_or_else(|| Ok(sample_catalog()))
    }

    async fn invoke(&self, request: &InvokeRequest) -> Result<ChatResponse, ApiError> {
        self.record(|r| r.invocations.push(request.clone()));
        self.script
            .lock()
            .unwrap()
            .replies
            .pop_front()
            .unwrap_or_else(|| {
                Ok(ChatResponse {
                    ai_response: format!("Echo: {}", request.text),
                    new_conversation: None,
                })
            })
    }

    async fn delete_conversation(
        &self,
        user_email: &str,
        conversation_id: &str,
    ) -> Result<(), ApiError> {
        self.record(|r| {
            r.deleted
                .push((user_email.to_string(), conversation_id.to_string()))
        });
        match self.script.lock().unwrap().delete_error.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
