use std::error::Error;
use std::fmt;

/// Failure of a single call to the chat service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The request never produced a response (connection refused, timeout, ...).
    Network(String),
    /// The service answered with a non-success status.
    Http { status: u16, detail: Option<String> },
    /// The response body did not have the expected shape.
    Decode(String),
    /// The request could not be assembled locally.
    Request(String),
}

impl ApiError {
    pub fn http(status: u16, detail: Option<String>) -> Self {
        ApiError::Http { status, detail }
    }

    /// Server-provided explanation, when the service sent one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            ApiError::Http { detail, .. } => detail.as_deref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(message) => write!(f, "network error: {message}"),
            ApiError::Http {
                status,
                detail: Some(detail),
            } => write!(f, "request failed with status {status}: {detail}"),
            ApiError::Http { status, detail: None } => {
                write!(f, "request failed with status {status}")
            }
            ApiError::Decode(message) => write!(f, "unexpected response: {message}"),
            ApiError::Request(message) => write!(f, "invalid request: {message}"),
        }
    }
}

impl Error for ApiError {}

/// Login and registration failures, phrased for display next to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    MissingField(&'static str),
    /// The service refused the credentials; carries its message.
    Rejected(String),
    Transport(ApiError),
}

impl AuthError {
    /// Maps a failed auth call, preferring the server's `detail` text.
    pub(crate) fn from_api(err: ApiError, fallback: &str) -> Self {
        match err {
            ApiError::Http { detail, .. } => {
                AuthError::Rejected(detail.unwrap_or_else(|| fallback.to_string()))
            }
            other => AuthError::Transport(other),
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::MissingField(field) => write!(f, "{field} is required"),
            AuthError::Rejected(message) => write!(f, "{message}"),
            AuthError::Transport(err) => write!(f, "{err}"),
        }
    }
}

impl Error for AuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            AuthError::Transport(err) => Some(err),
            _ => None,
        }
    }
}

/// Reasons a send is refused before anything reaches the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExchangeError {
    NotAuthenticated,
    EmptyMessage,
    SendInFlight,
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeError::NotAuthenticated => write!(f, "you need to log in before sending"),
            ExchangeError::EmptyMessage => write!(f, "type a message or attach a file first"),
            ExchangeError::SendInFlight => write!(f, "still waiting for the previous reply"),
        }
    }
}

impl Error for ExchangeError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSelectionError {
    UnknownModel(String),
}

impl fmt::Display for ModelSelectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelSelectionError::UnknownModel(name) => {
                write!(f, "model '{name}' is not offered by the server")
            }
        }
    }
}

impl Error for ModelSelectionError {}
