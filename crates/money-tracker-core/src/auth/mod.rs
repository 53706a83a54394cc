//! Credential storage and session state.
//!
//! This module provides:
//! - `CredentialStore`: where the access, refresh and CSRF tokens live
//!   (memory, a JSON file, or the OS keychain via keyring)
//! - `SessionTracker`: the anonymous / authenticated / refreshing state

pub mod cookie_jar;
pub mod credentials;
pub mod session;

pub use cookie_jar::FileCredentialStore;
pub use credentials::{CredentialKey, CredentialStore, KeyringCredentialStore, MemoryCredentialStore};
pub use session::{SessionState, SessionTracker};
