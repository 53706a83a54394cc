//! Session client for the money-tracker REST API.
//!
//! Every API call goes through [`SessionClient::send`], which attaches the
//! CSRF and bearer headers, transparently refreshes an expired access token
//! (single-flight, one replay per request) and reports failures through the
//! configured `Notifier`.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::auth::{
    CredentialKey, CredentialStore, MemoryCredentialStore, SessionState, SessionTracker,
};
use crate::config::Config;
use crate::notify::{Navigator, Notifier, TracingNavigator, TracingNotifier};

use super::refresh::{RefreshCoordinator, RefreshOutcome};
use super::request::{ApiRequest, Attempt, PendingRequest, RequestBody, REFRESH_PATH};
use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

const CSRF_HEADER: &str = "x-csrftoken";

/// Shown when the refresh token is missing, the refresh response is unusable,
/// or the tokens disappeared while a request was in flight.
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Please log in again.";

#[derive(Debug, Serialize)]
struct RefreshRequest<'a> {
    refresh: &'a str,
}

#[derive(Debug, Deserialize)]
struct RefreshResponse {
    access: Option<String>,
    /// Present when the backend rotates refresh tokens
    refresh: Option<String>,
}

/// What to do with a failed attempt.
enum Recovery {
    Replay(PendingRequest),
    Reject(ApiError),
}

pub struct SessionClientBuilder {
    base_url: String,
    timeout: Duration,
    http: Option<Client>,
    store: Option<Arc<dyn CredentialStore>>,
    notifier: Option<Arc<dyn Notifier>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl SessionClientBuilder {
    fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
            http: None,
            store: None,
            notifier: None,
            navigator: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Use an existing reqwest client (its own timeout applies).
    pub fn http_client(mut self, client: Client) -> Self {
        self.http = Some(client);
        self
    }

    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    pub fn build(self) -> Result<SessionClient, ApiError> {
        let base_url = self.base_url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ApiError::Configuration("Base URL is required".to_string()));
        }
        reqwest::Url::parse(&base_url)
            .map_err(|e| ApiError::Configuration(format!("Invalid base URL {}: {}", base_url, e)))?;

        let http = match self.http {
            Some(client) => client,
            None => Client::builder().timeout(self.timeout).build()?,
        };
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryCredentialStore::new()));
        let session = SessionTracker::from_store(store.as_ref());

        Ok(SessionClient {
            inner: Arc::new(Inner {
                http,
                base_url,
                store,
                notifier: self.notifier.unwrap_or_else(|| Arc::new(TracingNotifier)),
                navigator: self.navigator.unwrap_or_else(|| Arc::new(TracingNavigator)),
                refresh: RefreshCoordinator::new(),
                session,
            }),
        })
    }
}

/// Authenticated client for the backend.
/// Clone is cheap - clones share the connection pool, credentials and
/// refresh coordination.
#[derive(Clone)]
pub struct SessionClient {
    inner: Arc<Inner>,
}

struct Inner {
    http: Client,
    base_url: String,
    store: Arc<dyn CredentialStore>,
    notifier: Arc<dyn Notifier>,
    navigator: Arc<dyn Navigator>,
    refresh: RefreshCoordinator,
    session: SessionTracker,
}

impl SessionClient {
    pub fn builder(base_url: impl Into<String>) -> SessionClientBuilder {
        SessionClientBuilder::new(base_url)
    }

    /// Client with an in-memory credential store and log-only side channels.
    pub fn new(base_url: impl Into<String>) -> Result<Self, ApiError> {
        Self::builder(base_url).build()
    }

    /// Builder preconfigured from `config`.
    pub fn from_config(config: &Config) -> Result<SessionClientBuilder, ApiError> {
        let base_url = config
            .api_url()
            .map_err(|e| ApiError::Configuration(e.to_string()))?;
        Ok(Self::builder(base_url).timeout(Duration::from_secs(config.request_timeout_secs)))
    }

    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    pub fn state(&self) -> SessionState {
        self.inner.session.state()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() != SessionState::Anonymous
    }

    pub fn credential_store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    pub(crate) fn notifier(&self) -> &dyn Notifier {
        self.inner.notifier.as_ref()
    }

    pub(crate) fn session(&self) -> &SessionTracker {
        &self.inner.session
    }

    // ===== Request pipeline =====

    /// Send a request and return the parsed JSON body (`Null` when empty).
    pub async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let mut pending = PendingRequest::original(request);
        loop {
            let (builder, sent_token) = self.inner.prepare(&pending)?;
            let result = match builder.send().await {
                Ok(response) => self.inner.read_response(response).await,
                Err(e) => Err(ApiError::from(e)),
            };

            match result {
                Ok(value) => return Ok(value),
                Err(err) => match self.recover(pending, sent_token, err).await {
                    Recovery::Replay(next) => pending = next,
                    Recovery::Reject(err) => return Err(err),
                },
            }
        }
    }

    /// Send a request and decode the response into `T`.
    pub async fn send_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        let path = request.path.clone();
        let value = self.send(request).await?;
        serde_json::from_value(value).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", path, e))
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send_json(ApiRequest::get(path)).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(ApiRequest::post(path).with_json(body)?).await
    }

    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(ApiRequest::put(path).with_json(body)?).await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        self.send_json(ApiRequest::patch(path).with_json(body)?).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(ApiRequest::delete(path)).await.map(|_| ())
    }

    /// Decide between replaying a failed attempt and rejecting it.
    async fn recover(
        &self,
        pending: PendingRequest,
        sent_token: Option<String>,
        err: ApiError,
    ) -> Recovery {
        if !err.is_unauthorized() || pending.request.is_auth_endpoint() {
            self.inner.report(&pending.request, &err);
            return Recovery::Reject(err);
        }

        if pending.is_retried() {
            warn!(path = %pending.request.path, "Request unauthorized again after token refresh");
            self.inner.report(&pending.request, &err);
            self.inner.end_session();
            return Recovery::Reject(ApiError::SessionExpired {
                reason: err.message(),
                response: err.body().cloned(),
            });
        }

        match self.inner.store.get(CredentialKey::AccessToken) {
            // Someone else already replaced the token this request carried
            Some(current) if sent_token.as_deref() != Some(current.as_str()) => {
                debug!(path = %pending.request.path, "Access token changed in flight, replaying");
                return Recovery::Replay(pending.retried(current));
            }
            // The tokens were removed while this request was in flight
            None if sent_token.is_some() => {
                debug!(path = %pending.request.path, "Session ended in flight, not refreshing");
                if self.inner.end_session() {
                    self.inner.notifier.error(SESSION_EXPIRED_MESSAGE);
                }
                return Recovery::Reject(ApiError::SessionExpired {
                    reason: SESSION_EXPIRED_MESSAGE.to_string(),
                    response: err.body().cloned(),
                });
            }
            _ => {}
        }

        let inner = Arc::clone(&self.inner);
        let outcome = self
            .inner
            .refresh
            .run(move || async move { inner.refresh_access_token().await })
            .await;

        match outcome {
            RefreshOutcome::Refreshed { access_token } => {
                Recovery::Replay(pending.retried(access_token))
            }
            RefreshOutcome::Failed { reason } => Recovery::Reject(ApiError::SessionExpired {
                reason,
                response: err.body().cloned(),
            }),
        }
    }
}

impl Inner {
    fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Attach headers and body for this attempt. Returns the access token the
    /// attempt carries.
    fn prepare(&self, pending: &PendingRequest) -> Result<(RequestBuilder, Option<String>), ApiError> {
        let request = &pending.request;
        let access_token = match &pending.attempt {
            Attempt::Original => self.store.get(CredentialKey::AccessToken),
            Attempt::Retried { access_token } => Some(access_token.clone()),
        };
        let csrf_token = self.store.get(CredentialKey::CsrfToken);
        let headers = build_headers(request, access_token.as_deref(), csrf_token.as_deref())?;

        let builder = self
            .http
            .request(request.method.clone(), self.url(&request.path))
            .headers(headers);
        let builder = match &request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(body),
            RequestBody::Multipart(parts) => builder.multipart(RequestBody::to_form(parts)?),
        };

        debug!(
            method = %request.method,
            path = %request.path,
            retried = pending.is_retried(),
            authenticated = access_token.is_some(),
            "Sending request"
        );
        Ok((builder, access_token))
    }

    async fn read_response(&self, response: Response) -> Result<Value, ApiError> {
        if let Some(csrf) = csrf_from_set_cookie(response.headers()) {
            if self.store.get(CredentialKey::CsrfToken).as_deref() != Some(csrf.as_str()) {
                if let Err(e) = self.store.set(CredentialKey::CsrfToken, &csrf) {
                    warn!(error = %e, "Failed to store CSRF token");
                }
            }
        }

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            debug!(status = %status, "Request failed");
            return Err(ApiError::from_status(status, &body));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON response: {}", e)))
    }

    /// Forward a failure to the notifier unless the request opted out.
    fn report(&self, request: &ApiRequest, err: &ApiError) {
        if request.is_auth_endpoint() || request.suppress_global_error {
            return;
        }
        self.notifier.error(&err.message());
    }

    /// Exchange the refresh token for a new access token. Runs at most once
    /// per in-flight refresh; its side effects are shared by all waiters.
    async fn refresh_access_token(&self) -> RefreshOutcome {
        self.session.begin_refresh();

        let Some(refresh_token) = self.store.get(CredentialKey::RefreshToken) else {
            return self.fail_refresh(SESSION_EXPIRED_MESSAGE.to_string());
        };

        match self.request_new_tokens(&refresh_token).await {
            Ok((access, rotated_refresh)) => {
                if let Err(e) = self.store.set(CredentialKey::AccessToken, &access) {
                    warn!(error = %e, "Failed to persist refreshed access token");
                }
                if let Some(refresh) = rotated_refresh {
                    if let Err(e) = self.store.set(CredentialKey::RefreshToken, &refresh) {
                        warn!(error = %e, "Failed to persist rotated refresh token");
                    }
                }
                self.session.authenticate();
                info!("Access token refreshed");
                RefreshOutcome::Refreshed {
                    access_token: access,
                }
            }
            Err(ApiError::InvalidResponse(detail)) => {
                debug!(detail = %detail, "Unusable refresh response");
                self.fail_refresh(SESSION_EXPIRED_MESSAGE.to_string())
            }
            Err(err) => self.fail_refresh(err.message()),
        }
    }

    async fn request_new_tokens(
        &self,
        refresh_token: &str,
    ) -> Result<(String, Option<String>), ApiError> {
        let response = self
            .http
            .post(self.url(REFRESH_PATH))
            .json(&RefreshRequest {
                refresh: refresh_token,
            })
            .send()
            .await?;
        let value = self.read_response(response).await?;

        let tokens: RefreshResponse = serde_json::from_value(value)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse refresh response: {}", e)))?;
        let access = tokens
            .access
            .filter(|a| !a.is_empty())
            .ok_or_else(|| {
                ApiError::InvalidResponse("Refresh response did not include an access token".to_string())
            })?;
        Ok((access, tokens.refresh.filter(|r| !r.is_empty())))
    }

    fn fail_refresh(&self, reason: String) -> RefreshOutcome {
        warn!(reason = %reason, "Token refresh failed, ending session");
        if let Err(e) = self.store.clear_tokens() {
            warn!(error = %e, "Failed to clear tokens");
        }
        self.session.end();
        self.notifier.error(&reason);
        self.navigator.navigate_to_login();
        RefreshOutcome::Failed { reason }
    }

    /// Clear tokens and send the user to login, once per session. Returns
    /// true if this call ended the session.
    fn end_session(&self) -> bool {
        if let Err(e) = self.store.clear_tokens() {
            warn!(error = %e, "Failed to clear tokens");
        }
        let ended = self.session.end();
        if ended {
            self.navigator.navigate_to_login();
        }
        ended
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ApiError> {
    HeaderValue::from_str(value)
        .map_err(|e| ApiError::InvalidRequest(format!("Invalid header value: {}", e)))
}

/// Headers for one attempt. Missing tokens simply omit their header.
fn build_headers(
    request: &ApiRequest,
    access_token: Option<&str>,
    csrf_token: Option<&str>,
) -> Result<HeaderMap, ApiError> {
    let mut headers = HeaderMap::new();
    if !request.body.is_multipart() {
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }
    if let Some(csrf) = csrf_token {
        headers.insert(HeaderName::from_static(CSRF_HEADER), header_value(csrf)?);
    }
    if let Some(token) = access_token {
        let mut value = header_value(&format!("Bearer {}", token))?;
        value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, value);
    }
    for (name, value) in &request.headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid header name {}: {}", name, e)))?;
        headers.insert(name, header_value(value)?);
    }
    Ok(headers)
}

/// The CSRF token from a `Set-Cookie: csrftoken=...` header, if any.
fn csrf_from_set_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find_map(|cookie| {
            let pair = cookie.split(';').next()?.trim();
            let (name, value) = pair.split_once('=')?;
            (name.trim() == CredentialKey::CsrfToken.cookie_name())
                .then(|| value.trim().trim_matches('"').to_string())
        })
        .filter(|value| !value.is_empty())
}
