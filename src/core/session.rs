//! Authenticated-user state.
//!
//! The store starts in [`SessionState::Checking`] and leaves it exactly once,
//! when the start-up probe settles. Afterwards it only moves between
//! anonymous and authenticated through [`SessionStore::login`] and
//! [`SessionStore::logout`].

use tracing::{debug, info, warn};

use crate::api::{ChatBackend, LoginResponse, UserWithHistory};
use crate::core::error::{ApiError, AuthError};
use crate::core::message::User;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Checking,
    Anonymous,
    Authenticated(User),
}

#[derive(Debug)]
pub struct SessionStore {
    state: SessionState,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            state: SessionState::Checking,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// True until the start-up session probe has settled.
    pub fn is_loading(&self) -> bool {
        matches!(self.state, SessionState::Checking)
    }

    pub fn user(&self) -> Option<&User> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.user().is_some()
    }

    /// Settles the start-up session check. Failures are treated as
    /// anonymous.
    ///
    /// Returns the user's history so callers can seed the conversation list
    /// without a second request.
    pub fn apply_session_check(
        &mut self,
        result: Result<Option<UserWithHistory>, ApiError>,
    ) -> Option<UserWithHistory> {
        match result {
            Ok(Some(probe)) => {
                debug!(email = %probe.email, "Existing session found");
                self.state = SessionState::Authenticated(probe.user());
                Some(probe)
            }
            Ok(None) => {
                debug!("No active session");
                self.state = SessionState::Anonymous;
                None
            }
            Err(err) => {
                warn!(error = %err, "Session check failed; continuing anonymously");
                self.state = SessionState::Anonymous;
                None
            }
        }
    }

    /// Creates an account. Does not log in.
    pub async fn register(
        &self,
        backend: &dyn ChatBackend,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<String, AuthError> {
        require("name", name)?;
        require("email", email)?;
        require("password", password)?;

        let response = backend
            .register(name.trim(), email.trim(), password)
            .await
            .map_err(|err| AuthError::from_api(err, "Registration failed"))?;

        info!(email = %email.trim(), "Account registered");
        Ok(response
            .message
            .unwrap_or_else(|| "User registered successfully".to_string()))
    }

    pub async fn login(
        &mut self,
        backend: &dyn ChatBackend,
        email: &str,
        password: &str,
    ) -> Result<LoginResponse, AuthError> {
        require("email", email)?;
        require("password", password)?;

        let response = backend
            .login(email.trim(), password)
            .await
            .map_err(|err| AuthError::from_api(err, "Login failed"))?;

        info!(email = %response.user.email, "Logged in");
        self.state = SessionState::Authenticated(response.user.clone());
        Ok(response)
    }

    /// Ends the session. The local user is cleared even when the server call
    /// fails; that failure is still returned for reporting.
    pub async fn logout(&mut self, backend: &dyn ChatBackend) -> Result<(), ApiError> {
        let result = backend.logout().await;
        self.clear();
        match &result {
            Ok(()) => info!("Logged out"),
            Err(err) => warn!(error = %err, "Logout call failed; local session cleared"),
        }
        result
    }

    pub fn clear(&mut self) {
        self.state = SessionState::Anonymous;
    }
}

fn require(field: &'static str, value: &str) -> Result<(), AuthError> {
    if value.trim().is_empty() {
        Err(AuthError::MissingField(field))
    } else {
        Ok(())
    }
}
