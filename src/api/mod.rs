//! Wire payloads and transport for the chat service.

pub mod client;
pub mod routes;

use serde::{Deserialize, Serialize};

use crate::core::attachment::Attachment;
use crate::core::message::{Conversation, User};

pub use client::{ChatBackend, HttpBackend};
pub use routes::{InvokeRoute, PayloadKind};

#[derive(Serialize)]
pub struct RegisterRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user: User,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of `GET /api/user` for a live session.
#[derive(Debug, Clone, Deserialize)]
pub struct UserWithHistory {
    #[serde(alias = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub chat_history: Vec<Conversation>,
}

impl UserWithHistory {
    pub fn user(&self) -> User {
        User {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// JSON body of the text invoke endpoints.
#[derive(Serialize)]
pub struct InvokeTextPayload<'a> {
    pub human_text: &'a str,
    pub user_email: &'a str,
    pub user_model: &'a str,
    pub conversation_id: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ChatResponse {
    pub ai_response: String,
    #[serde(default)]
    pub new_conversation: Option<Conversation>,
}

#[derive(Serialize)]
pub struct DeleteChatRequest<'a> {
    pub user_email: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct ConfigResponse {
    #[serde(default)]
    pub endpoints: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct EndpointConfig {
    #[serde(default)]
    models: Vec<String>,
}

/// Models offered by one provider, in the order the server lists them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointModels {
    pub provider: String,
    pub models: Vec<String>,
}

impl ConfigResponse {
    /// Keeps server order; providers whose entry is malformed are skipped.
    pub(crate) fn into_endpoints(self) -> Vec<EndpointModels> {
        self.endpoints
            .into_iter()
            .filter_map(|(provider, value)| {
                serde_json::from_value::<EndpointConfig>(value)
                    .ok()
                    .map(|config| EndpointModels {
                        provider,
                        models: config.models,
                    })
            })
            .collect()
    }
}

/// Everything the transport needs to perform one chat invoke.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeRequest {
    pub route: InvokeRoute,
    pub user_email: String,
    pub model: String,
    pub text: String,
    pub attachment: Option<Attachment>,
    pub conversation_id: Option<String>,
}
