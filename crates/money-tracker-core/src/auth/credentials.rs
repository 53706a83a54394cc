use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{Context, Result};
use keyring::Entry;
use tracing::warn;

const SERVICE_NAME: &str = "money-tracker";

/// The three values the session client persists between requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    AccessToken,
    RefreshToken,
    CsrfToken,
}

impl CredentialKey {
    pub const ALL: [CredentialKey; 3] = [
        CredentialKey::AccessToken,
        CredentialKey::RefreshToken,
        CredentialKey::CsrfToken,
    ];

    /// Cookie name shared with the web frontend.
    pub fn cookie_name(&self) -> &'static str {
        match self {
            CredentialKey::AccessToken => "jwt-auth",
            CredentialKey::RefreshToken => "refresh-auth",
            CredentialKey::CsrfToken => "csrftoken",
        }
    }

    pub fn from_cookie_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.cookie_name() == name)
    }
}

/// Shared, process-wide token storage.
///
/// Values are read immediately before every request and never cached by the
/// client, so implementations must return whatever was last written by anyone.
pub trait CredentialStore: Send + Sync {
    fn get(&self, key: CredentialKey) -> Option<String>;

    fn set(&self, key: CredentialKey, value: &str) -> Result<()>;

    fn remove(&self, key: CredentialKey) -> Result<()>;

    /// Remove access and refresh tokens together.
    fn clear_tokens(&self) -> Result<()> {
        let access = self.remove(CredentialKey::AccessToken);
        let refresh = self.remove(CredentialKey::RefreshToken);
        access.and(refresh)
    }
}

/// In-process store, the default for tests and short-lived tools.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    values: RwLock<HashMap<CredentialKey, String>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values<'a>(values: impl IntoIterator<Item = (CredentialKey, &'a str)>) -> Self {
        let store = Self::new();
        {
            let mut map = store.values.write().unwrap_or_else(|p| p.into_inner());
            for (key, value) in values {
                map.insert(key, value.to_string());
            }
        }
        store
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self, key: CredentialKey) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(&key)
            .cloned()
    }

    fn set(&self, key: CredentialKey, value: &str) -> Result<()> {
        self.values
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: CredentialKey) -> Result<()> {
        self.values
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(&key);
        Ok(())
    }
}

/// Tokens kept in the OS keychain, one entry per key.
pub struct KeyringCredentialStore {
    service: String,
}

impl KeyringCredentialStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    /// Use a custom keychain service name (e.g. one per backend).
    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: CredentialKey) -> Result<Entry> {
        Entry::new(&self.service, key.cookie_name()).context("Failed to create keyring entry")
    }
}

impl Default for KeyringCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for KeyringCredentialStore {
    fn get(&self, key: CredentialKey) -> Option<String> {
        let entry = match self.entry(key) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key = key.cookie_name(), error = %e, "Keyring unavailable");
                return None;
            }
        };
        match entry.get_password() {
            Ok(value) => Some(value),
            Err(keyring::Error::NoEntry) => None,
            Err(e) => {
                warn!(key = key.cookie_name(), error = %e, "Failed to read keychain entry");
                None
            }
        }
    }

    fn set(&self, key: CredentialKey, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .context("Failed to store token in keychain")
    }

    fn remove(&self, key: CredentialKey) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(anyhow::Error::new(e).context("Failed to delete token from keychain")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cookie_names() {
        assert_eq!(CredentialKey::AccessToken.cookie_name(), "jwt-auth");
        assert_eq!(CredentialKey::RefreshToken.cookie_name(), "refresh-auth");
        assert_eq!(CredentialKey::CsrfToken.cookie_name(), "csrftoken");
        assert_eq!(
            CredentialKey::from_cookie_name("refresh-auth"),
            Some(CredentialKey::RefreshToken)
        );
        assert_eq!(CredentialKey::from_cookie_name("sessionid"), None);
    }

    #[test]
    fn test_memory_store_clear_tokens_keeps_csrf() {
        let store = MemoryCredentialStore::with_values([
            (CredentialKey::AccessToken, "a"),
            (CredentialKey::RefreshToken, "r"),
            (CredentialKey::CsrfToken, "c"),
        ]);

        store.clear_tokens().unwrap();

        assert_eq!(store.get(CredentialKey::AccessToken), None);
        assert_eq!(store.get(CredentialKey::RefreshToken), None);
        assert_eq!(store.get(CredentialKey::CsrfToken).as_deref(), Some("c"));
    }

    #[test]
    fn test_memory_store_overwrite() {
        let store = MemoryCredentialStore::new();
        store.set(CredentialKey::AccessToken, "old").unwrap();
        store.set(CredentialKey::AccessToken, "new").unwrap();
        assert_eq!(store.get(CredentialKey::AccessToken).as_deref(), Some("new"));
    }
}
