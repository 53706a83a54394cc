use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::{CredentialKey, CredentialStore};

#[derive(Debug, Default, Serialize, Deserialize)]
struct JarContents {
    /// Keyed by cookie name
    cookies: BTreeMap<String, String>,
    updated_at: Option<DateTime<Utc>>,
}

/// Credentials persisted as a JSON file on disk.
///
/// The file is re-read on every `get`, so a token written by another process
/// (or removed by a logout elsewhere) is picked up by the next request.
pub struct FileCredentialStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When the jar was last written, if it exists.
    pub fn updated_at(&self) -> Result<Option<DateTime<Utc>>> {
        Ok(self.load()?.updated_at)
    }

    fn load(&self) -> Result<JarContents> {
        if !self.path.exists() {
            return Ok(JarContents::default());
        }
        let contents = std::fs::read_to_string(&self.path)
            .context("Failed to read credentials file")?;
        serde_json::from_str(&contents).context("Failed to parse credentials file")
    }

    fn save(&self, jar: &JarContents) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(jar)?;
        std::fs::write(&self.path, contents).context("Failed to write credentials file")?;
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut BTreeMap<String, String>)) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|p| p.into_inner());
        let mut jar = self.load()?;
        apply(&mut jar.cookies);
        jar.updated_at = Some(Utc::now());
        self.save(&jar)
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self, key: CredentialKey) -> Option<String> {
        match self.load() {
            Ok(mut jar) => jar.cookies.remove(key.cookie_name()),
            Err(e) => {
                warn!(path = ?self.path, error = %e, "Ignoring unreadable credentials file");
                None
            }
        }
    }

    fn set(&self, key: CredentialKey, value: &str) -> Result<()> {
        self.update(|cookies| {
            cookies.insert(key.cookie_name().to_string(), value.to_string());
        })
    }

    fn remove(&self, key: CredentialKey) -> Result<()> {
        self.update(|cookies| {
            cookies.remove(key.cookie_name());
        })
    }

    fn clear_tokens(&self) -> Result<()> {
        // Single write so the two tokens never diverge on disk
        self.update(|cookies| {
            cookies.remove(CredentialKey::AccessToken.cookie_name());
            cookies.remove(CredentialKey::RefreshToken.cookie_name());
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCredentialStore::new(dir.path().join("credentials.json"));
        assert_eq!(store.get(CredentialKey::AccessToken), None);
        assert_eq!(store.updated_at().unwrap(), None);
    }

    #[test]
    fn test_set_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("credentials.json");

        let store = FileCredentialStore::new(&path);
        store.set(CredentialKey::AccessToken, "access").unwrap();
        store.set(CredentialKey::RefreshToken, "refresh").unwrap();

        let reopened = FileCredentialStore::new(&path);
        assert_eq!(reopened.get(CredentialKey::AccessToken).as_deref(), Some("access"));
        assert_eq!(reopened.get(CredentialKey::RefreshToken).as_deref(), Some("refresh"));
        assert!(reopened.updated_at().unwrap().is_some());

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("jwt-auth"));
    }

    #[test]
    fn test_external_logout_is_observed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");

        let ours = FileCredentialStore::new(&path);
        let theirs = FileCredentialStore::new(&path);
        ours.set(CredentialKey::AccessToken, "a").unwrap();
        ours.set(CredentialKey::RefreshToken, "r").unwrap();
        ours.set(CredentialKey::CsrfToken, "c").unwrap();

        theirs.clear_tokens().unwrap();

        assert_eq!(ours.get(CredentialKey::AccessToken), None);
        assert_eq!(ours.get(CredentialKey::RefreshToken), None);
        assert_eq!(ours.get(CredentialKey::CsrfToken).as_deref(), Some("c"));
    }

    #[test]
    fn test_corrupt_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("credentials.json");
        std::fs::write(&path, "not json").unwrap();

        let store = FileCredentialStore::new(&path);
        assert_eq!(store.get(CredentialKey::AccessToken), None);
        assert!(store.set(CredentialKey::AccessToken, "a").is_err());
    }
}
