//! Account endpoints (dj-rest-auth).
//!
//! Login and logout own the token lifecycle: login stores both tokens,
//! logout removes them together with the CSRF token.

use serde::Serialize;
use serde_json::json;
use tracing::{info, warn};

use crate::auth::CredentialKey;
use crate::models::user::LoginRequest;
use crate::models::{
    DetailResponse, LoginResponse, PasswordChange, PasswordResetConfirm, ProfileUpdate,
    Registration, User,
};

use super::request::LOGIN_PATH;
use super::{ApiError, ApiRequest, SessionClient};

const LOGOUT_PATH: &str = "/dj-rest-auth/logout/";
const USER_PATH: &str = "/dj-rest-auth/user/";
const PASSWORD_CHANGE_PATH: &str = "/dj-rest-auth/password/change/";
const PASSWORD_RESET_PATH: &str = "/dj-rest-auth/password/reset/";
const PASSWORD_RESET_CONFIRM_PATH: &str = "/dj-rest-auth/password/reset/confirm/";
const VERIFY_EMAIL_PATH: &str = "/dj-rest-auth/registration/verify-email/";
const REGISTRATION_PATH: &str = "/dj-rest-auth/registration/";

const LOGOUT_FAILED_MESSAGE: &str = "Logout failed. Please try again.";

impl SessionClient {
    /// Log in and persist the issued token pair.
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let request =
            ApiRequest::post(LOGIN_PATH).with_json(&LoginRequest { username, password })?;
        let response: LoginResponse = self.send_json(request).await?;

        if response.access.is_empty() || response.refresh.is_empty() {
            return Err(ApiError::InvalidResponse(
                "Login response did not include both tokens".to_string(),
            ));
        }

        let store = self.credential_store();
        if let Err(e) = store
            .set(CredentialKey::AccessToken, &response.access)
            .and_then(|_| store.set(CredentialKey::RefreshToken, &response.refresh))
        {
            // Never leave half a token pair behind
            if let Err(clear) = store.clear_tokens() {
                warn!(error = %clear, "Failed to roll back partial login");
            }
            return Err(ApiError::Credentials(format!("{:#}", e)));
        }

        self.session().authenticate();
        info!(username = %response.user.username, "Logged in");
        self.notifier()
            .success(&format!("Welcome, {}!", response.user.username));
        Ok(response)
    }

    /// Log out on the server, then drop all local credentials.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let request = ApiRequest::post(LOGOUT_PATH).suppress_global_error();
        if let Err(e) = self.send(request).await {
            warn!(error = %e, "Logout failed");
            self.notifier().error(LOGOUT_FAILED_MESSAGE);
            return Err(e);
        }

        let store = self.credential_store();
        let cleared = store
            .clear_tokens()
            .and_then(|_| store.remove(CredentialKey::CsrfToken));
        self.session().end();
        cleared.map_err(|e| ApiError::Credentials(format!("{:#}", e)))?;

        info!("Logged out");
        self.notifier().success("Logged out successfully.");
        Ok(())
    }

    pub async fn current_user(&self) -> Result<User, ApiError> {
        self.get(USER_PATH).await
    }

    /// Update profile fields and optionally upload a new picture.
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<User, ApiError> {
        self.send_json(ApiRequest::patch(USER_PATH).multipart(update.into_parts()))
            .await
    }

    pub async fn change_password(&self, change: &PasswordChange) -> Result<DetailResponse, ApiError> {
        self.acknowledge(PASSWORD_CHANGE_PATH, change).await
    }

    pub async fn request_password_reset(&self, email: &str) -> Result<DetailResponse, ApiError> {
        self.acknowledge(PASSWORD_RESET_PATH, &json!({ "email": email }))
            .await
    }

    pub async fn confirm_password_reset(
        &self,
        confirm: &PasswordResetConfirm,
    ) -> Result<DetailResponse, ApiError> {
        self.acknowledge(PASSWORD_RESET_CONFIRM_PATH, confirm).await
    }

    pub async fn verify_email(&self, key: &str) -> Result<DetailResponse, ApiError> {
        self.acknowledge(VERIFY_EMAIL_PATH, &json!({ "key": key })).await
    }

    pub async fn register(&self, registration: &Registration) -> Result<DetailResponse, ApiError> {
        self.acknowledge(REGISTRATION_PATH, registration).await
    }

    /// POST returning a `{detail}` acknowledgement; an empty body counts as
    /// an empty acknowledgement.
    async fn acknowledge<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<DetailResponse, ApiError> {
        let value = self.send(ApiRequest::post(path).with_json(body)?).await?;
        if value.is_null() {
            return Ok(DetailResponse::default());
        }
        serde_json::from_value(value).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse response from {}: {}", path, e))
        })
    }
}
