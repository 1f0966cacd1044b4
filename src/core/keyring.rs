//! Session cookie persistence in the platform keyring.
//!
//! Each service address gets its own entry so switching `base-url` does not
//! replay a cookie to the wrong server.

use std::error::Error;
use std::fmt;

use keyring::Entry;
use tracing::{debug, warn};

const KEYRING_SERVICE: &str = "chatterm";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VaultAction {
    Read,
    Save,
    Remove,
}

impl VaultAction {
    fn verb(self) -> &'static str {
        match self {
            VaultAction::Read => "read",
            VaultAction::Save => "save",
            VaultAction::Remove => "remove",
        }
    }
}

/// A keyring call for one service address failed.
#[derive(Debug)]
pub struct SessionVaultError {
    pub action: VaultAction,
    pub account: String,
    source: keyring::Error,
}

impl fmt::Display for SessionVaultError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not {} the saved session for {}: {}",
            self.action.verb(),
            self.account,
            self.source
        )
    }
}

impl Error for SessionVaultError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}

/// Stores the session cookie for one service address.
pub struct SessionVault {
    account: String,
    enabled: bool,
}

impl SessionVault {
    pub fn new(base_url: &str, enabled: bool) -> Self {
        Self {
            account: crate::utils::url::normalize_base_url(base_url),
            enabled,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn failure(&self, action: VaultAction, source: keyring::Error) -> SessionVaultError {
        SessionVaultError {
            action,
            account: self.account.clone(),
            source,
        }
    }

    fn entry(&self, action: VaultAction) -> Result<Entry, SessionVaultError> {
        Entry::new(KEYRING_SERVICE, &self.account).map_err(|err| self.failure(action, err))
    }

    pub fn load(&self) -> Result<Option<String>, SessionVaultError> {
        if !self.enabled {
            return Ok(None);
        }
        match self.entry(VaultAction::Read)?.get_password() {
            Ok(cookie) => {
                debug!(account = %self.account, "Restored session cookie");
                Ok(Some(cookie))
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(self.failure(VaultAction::Read, err)),
        }
    }

    pub fn store(&self, cookie: &str) -> Result<(), SessionVaultError> {
        if !self.enabled {
            return Ok(());
        }
        self.entry(VaultAction::Save)?
            .set_password(cookie)
            .map_err(|err| self.failure(VaultAction::Save, err))?;
        debug!(account = %self.account, "Stored session cookie");
        Ok(())
    }

    pub fn clear(&self) -> Result<(), SessionVaultError> {
        if !self.enabled {
            return Ok(());
        }
        match self.entry(VaultAction::Remove)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(self.failure(VaultAction::Remove, err)),
        }
    }

    /// [`load`](Self::load) that degrades to "nothing stored" with a warning.
    pub fn load_or_warn(&self) -> Option<String> {
        self.load().unwrap_or_else(|err| {
            warn!(error = %err, "Could not read saved session");
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_vault_never_touches_the_keyring() {
        let vault = SessionVault::new("http://localhost:8000/", false);
        assert!(!vault.is_enabled());
        assert_eq!(vault.load().expect("load"), None);
        vault.store("token=abc").expect("store");
        vault.clear().expect("clear");
    }

    #[test]
    fn account_is_normalized_base_url() {
        let vault = SessionVault::new("http://localhost:8000///", false);
        assert_eq!(vault.account, "http://localhost:8000");
    }

    #[test]
    fn failures_name_the_action_and_address() {
        let vault = SessionVault::new("http://localhost:8000/", true);
        let err = vault.failure(
            VaultAction::Save,
            keyring::Error::NoStorageAccess("locked".to_string().into()),
        );
        assert_eq!(err.action, VaultAction::Save);
        let text = err.to_string();
        assert!(text.starts_with("could not save the saved session for http://localhost:8000: "));
        assert!(err.source().is_some());
    }
}
