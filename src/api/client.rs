use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::{CookieStore, Jar};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{
    ChatResponse, ConfigResponse, DeleteChatRequest, EndpointModels, InvokeRequest,
    InvokeTextPayload, LoginRequest, LoginResponse, RegisterRequest, RegisterResponse,
    UserWithHistory,
};
use crate::core::error::ApiError;
use crate::utils::url::construct_api_url;

/// Operations the client performs against the chat service.
///
/// Stores only talk to the service through this trait so the view layer can
/// inject the reqwest transport and tests can inject a scripted one.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Current session's user with history, `None` when anonymous.
    async fn current_user(&self) -> Result<Option<UserWithHistory>, ApiError>;

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisterResponse, ApiError>;

    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError>;

    async fn logout(&self) -> Result<(), ApiError>;

    async fn fetch_catalog(&self) -> Result<Vec<EndpointModels>, ApiError>;

    async fn invoke(&self, request: &InvokeRequest) -> Result<ChatResponse, ApiError>;

    async fn delete_conversation(
        &self,
        user_email: &str,
        conversation_id: &str,
    ) -> Result<(), ApiError>;
}

/// reqwest transport with a cookie jar holding the session cookie.
pub struct HttpBackend {
    client: Client,
    base_url: String,
    origin: Url,
    jar: Arc<Jar>,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, Box<dyn Error>> {
        let origin = Url::parse(base_url)?;
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(Arc::clone(&jar))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            origin,
            jar,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn api_url(&self, path: &str) -> String {
        construct_api_url(&self.base_url, path)
    }

    /// Cookies the jar would send to the service, as a `Cookie` header value.
    pub fn session_cookie(&self) -> Option<String> {
        self.jar
            .cookies(&self.origin)
            .and_then(|value| value.to_str().ok().map(str::to_owned))
            .filter(|value| !value.is_empty())
    }

    /// Seeds the jar from a value previously returned by [`session_cookie`].
    ///
    /// [`session_cookie`]: HttpBackend::session_cookie
    pub fn restore_session_cookie(&self, header: &str) {
        for pair in cookie_pairs(header) {
            self.jar.add_cookie_str(pair, &self.origin);
        }
    }

    /// Expires every cookie held for the service.
    pub fn forget_session_cookie(&self) {
        let Some(header) = self.session_cookie() else {
            return;
        };
        for pair in cookie_pairs(&header) {
            if let Some((name, _)) = pair.split_once('=') {
                self.jar
                    .add_cookie_str(&format!("{name}=; Max-Age=0; Path=/"), &self.origin);
            }
        }
    }
}

fn cookie_pairs(header: &str) -> impl Iterator<Item = &str> {
    header
        .split(';')
        .map(str::trim)
        .filter(|pair| pair.contains('='))
}

fn network(err: reqwest::Error) -> ApiError {
    ApiError::Network(err.to_string())
}

/// Turns a non-success response into [`ApiError::Http`], keeping the
/// service's `detail` text when present.
async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    debug!(status = status.as_u16(), body = %body, "Chat service returned an error");
    Err(ApiError::http(status.as_u16(), extract_detail(&body)))
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = ensure_success(response).await?;
    response
        .json::<T>()
        .await
        .map_err(|err| ApiError::Decode(err.to_string()))
}

pub(crate) fn extract_detail(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(value) => match value.get("detail") {
            Some(serde_json::Value::String(detail)) => Some(detail.clone()),
            Some(serde_json::Value::Null) | None => value
                .get("message")
                .and_then(|message| message.as_str())
                .map(str::to_owned),
            Some(other) => Some(other.to_string()),
        },
        Err(_) => Some(trimmed.to_string()),
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn current_user(&self) -> Result<Option<UserWithHistory>, ApiError> {
        let response = self
            .client
            .get(self.api_url("api/user"))
            .send()
            .await
            .map_err(network)?;
        decode(response).await
    }

    async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<RegisterResponse, ApiError> {
        let response = self
            .client
            .post(self.api_url("api/auth/register"))
            .json(&RegisterRequest {
                name,
                email,
                password,
            })
            .send()
            .await
            .map_err(network)?;
        decode(response).await
    }

    async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let response = self
            .client
            .post(self.api_url("api/auth/login"))
            .json(&LoginRequest { email, password })
            .send()
            .await
            .map_err(network)?;
        decode(response).await
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let result: Result<(), ApiError> = async {
            let response = self
                .client
                .post(self.api_url("api/auth/logout"))
                .json(&serde_json::json!({}))
                .send()
                .await
                .map_err(network)?;
            ensure_success(response).await.map(|_| ())
        }
        .await;

        // The jar must not keep an authenticated cookie even if the call failed.
        self.forget_session_cookie();
        result
    }

    async fn fetch_catalog(&self) -> Result<Vec<EndpointModels>, ApiError> {
        let response = self
            .client
            .get(self.api_url("api/config"))
            .send()
            .await
            .map_err(network)?;
        let config: ConfigResponse = decode(response).await?;
        Ok(config.into_endpoints())
    }

    async fn invoke(&self, request: &InvokeRequest) -> Result<ChatResponse, ApiError> {
        let url = self.api_url(&format!("api/{}", request.route.path()));
        debug!(
            url = %url,
            rag = request.route.rag,
            conversation_id = ?request.conversation_id,
            "Invoking chat endpoint"
        );

        let builder = match (request.route.file_field(), request.attachment.as_ref()) {
            (Some(field), Some(attachment)) => {
                let part = Part::bytes(attachment.bytes.clone())
                    .file_name(attachment.file_name.clone())
                    .mime_str(&attachment.mime)
                    .map_err(|err| ApiError::Request(err.to_string()))?;

                let mut form = Form::new()
                    .text("user_email", request.user_email.clone())
                    .text("model_name", request.model.clone())
                    .text("user_message", request.text.clone())
                    .part(field, part);
                if let Some(conversation_id) = &request.conversation_id {
                    form = form.text("conversation_id", conversation_id.clone());
                }
                self.client.post(url).multipart(form)
            }
            (Some(field), None) => {
                return Err(ApiError::Request(format!(
                    "{} requires a file in '{field}'",
                    request.route.path()
                )));
            }
            (None, _) => self.client.post(url).json(&InvokeTextPayload {
                human_text: &request.text,
                user_email: &request.user_email,
                user_model: &request.model,
                conversation_id: request.conversation_id.as_deref(),
            }),
        };

        let response = builder.send().await.map_err(network)?;
        decode(response).await
    }

    async fn delete_conversation(
        &self,
        user_email: &str,
        conversation_id: &str,
    ) -> Result<(), ApiError> {
        let response = self
            .client
            .delete(self.api_url(&format!("api/chats/{conversation_id}")))
            .json(&DeleteChatRequest { user_email })
            .send()
            .await
            .map_err(network)?;
        ensure_success(response).await.map(|_| ())
    }
}
