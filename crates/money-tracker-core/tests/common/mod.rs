//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use money_tracker_core::auth::{CredentialKey, MemoryCredentialStore};
use money_tracker_core::notify::{Navigator, Notifier};
use money_tracker_core::SessionClient;
use wiremock::MockServer;

pub const ACCESS_TOKEN: &str = "access_token";
pub const REFRESH_TOKEN: &str = "refresh_token";
pub const CSRF_TOKEN: &str = "csrf_token";
pub const REFRESH_PATH: &str = "/dj-rest-auth/token/refresh/";

#[derive(Default)]
pub struct RecordingNotifier {
    errors: Mutex<Vec<String>>,
    successes: Mutex<Vec<String>>,
}

impl RecordingNotifier {
    pub fn errors(&self) -> Vec<String> {
        self.errors.lock().unwrap().clone()
    }

    pub fn successes(&self) -> Vec<String> {
        self.successes.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn error(&self, message: &str) {
        self.errors.lock().unwrap().push(message.to_string());
    }

    fn success(&self, message: &str) {
        self.successes.lock().unwrap().push(message.to_string());
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<(String, bool)>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<(String, bool)> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str, replace: bool) {
        self.routes.lock().unwrap().push((route.to_string(), replace));
    }
}

pub struct Harness {
    pub server: MockServer,
    pub client: SessionClient,
    pub store: Arc<MemoryCredentialStore>,
    pub notifier: Arc<RecordingNotifier>,
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    /// Logged-in client: access, refresh and CSRF tokens are stored.
    pub async fn start() -> Self {
        Self::build(logged_in_store(), Duration::from_secs(5)).await
    }

    pub async fn anonymous() -> Self {
        Self::build(MemoryCredentialStore::new(), Duration::from_secs(5)).await
    }

    pub async fn with_timeout(timeout: Duration) -> Self {
        Self::build(logged_in_store(), timeout).await
    }

    async fn build(store: MemoryCredentialStore, timeout: Duration) -> Self {
        init_tracing();
        let server = MockServer::start().await;
        let store = Arc::new(store);
        let notifier = Arc::new(RecordingNotifier::default());
        let navigator = Arc::new(RecordingNavigator::default());

        let client = SessionClient::builder(server.uri())
            .timeout(timeout)
            .credential_store(store.clone())
            .notifier(notifier.clone())
            .navigator(navigator.clone())
            .build()
            .expect("client should build");

        Self {
            server,
            client,
            store,
            notifier,
            navigator,
        }
    }
}

fn logged_in_store() -> MemoryCredentialStore {
    MemoryCredentialStore::with_values([
        (CredentialKey::AccessToken, ACCESS_TOKEN),
        (CredentialKey::RefreshToken, REFRESH_TOKEN),
        (CredentialKey::CsrfToken, CSRF_TOKEN),
    ])
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
