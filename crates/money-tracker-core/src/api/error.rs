use std::collections::BTreeMap;
use std::fmt;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Shown when no response was received at all.
pub const NETWORK_ERROR_MESSAGE: &str = "Network error. Please try again.";

/// Shown when nothing more specific can be extracted.
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred.";

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// A non-2xx response as received from the backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorBody {
    pub status: StatusCode,
    /// Parsed JSON payload, if the body was JSON.
    pub payload: Option<Value>,
    /// Raw body text, truncated for display.
    pub text: String,
}

impl ErrorBody {
    pub fn new(status: StatusCode, body: &str) -> Self {
        let payload = serde_json::from_str::<Value>(body).ok();
        Self {
            status,
            payload,
            text: truncate_body(body),
        }
    }

    /// Human-readable message for this response.
    ///
    /// A response was received, so an empty or non-JSON body falls through
    /// to the generic message rather than the network one.
    pub fn message(&self) -> String {
        extract_error_message(Some(self.payload.as_ref().unwrap_or(&Value::Null)))
    }
}

impl fmt::Display for ErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(ErrorBody),

    #[error("Validation failed: {0}")]
    Validation(ErrorBody),

    #[error("Access denied: {0}")]
    AccessDenied(ErrorBody),

    #[error("Resource not found: {0}")]
    NotFound(ErrorBody),

    #[error("Rate limited: {0}")]
    RateLimited(ErrorBody),

    #[error("Server error: {0}")]
    ServerError(ErrorBody),

    #[error("Unexpected status {}: {}", .0.status, .0)]
    UnexpectedStatus(ErrorBody),

    #[error("Session expired: {reason}")]
    SessionExpired {
        reason: String,
        response: Option<ErrorBody>,
    },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Credential store error: {0}")]
    Credentials(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Truncate a response body to avoid logging excessive data
fn truncate_body(body: &str) -> String {
    if body.len() <= MAX_ERROR_BODY_LENGTH {
        return body.to_string();
    }
    let mut end = MAX_ERROR_BODY_LENGTH;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
}

impl ApiError {
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = ErrorBody::new(status, body);
        match status.as_u16() {
            400 => ApiError::Validation(body),
            401 => ApiError::Unauthorized(body),
            403 => ApiError::AccessDenied(body),
            404 => ApiError::NotFound(body),
            429 => ApiError::RateLimited(body),
            500..=599 => ApiError::ServerError(body),
            _ => ApiError::UnexpectedStatus(body),
        }
    }

    /// The backend response behind this error, if one was received.
    pub fn body(&self) -> Option<&ErrorBody> {
        match self {
            ApiError::Unauthorized(body)
            | ApiError::Validation(body)
            | ApiError::AccessDenied(body)
            | ApiError::NotFound(body)
            | ApiError::RateLimited(body)
            | ApiError::ServerError(body)
            | ApiError::UnexpectedStatus(body) => Some(body),
            ApiError::SessionExpired { response, .. } => response.as_ref(),
            _ => None,
        }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::NetworkError(e) => e.status(),
            _ => self.body().map(|b| b.status),
        }
    }

    /// The original JSON payload of the failed response.
    pub fn payload(&self) -> Option<&Value> {
        self.body().and_then(|b| b.payload.as_ref())
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// Best-effort human-readable message, suitable for a notification.
    pub fn message(&self) -> String {
        match self {
            ApiError::NetworkError(_) => extract_error_message(None),
            ApiError::SessionExpired { reason, .. } => reason.clone(),
            other => match other.body() {
                Some(body) => body.message(),
                None => other.to_string(),
            },
        }
    }

    /// Field-level validation messages keyed by field name.
    ///
    /// Only 400 responses carry field errors; string values are treated as a
    /// single message.
    pub fn field_errors(&self) -> BTreeMap<String, Vec<String>> {
        let mut fields = BTreeMap::new();
        let Some(Value::Object(map)) = (match self {
            ApiError::Validation(body) => body.payload.as_ref(),
            _ => None,
        }) else {
            return fields;
        };

        for (name, value) in map {
            let messages: Vec<String> = match value {
                Value::String(s) => vec![s.clone()],
                Value::Array(items) => items
                    .iter()
                    .filter_map(|item| item.as_str().map(str::to_string))
                    .collect(),
                _ => Vec::new(),
            };
            if !messages.is_empty() {
                fields.insert(name.clone(), messages);
            }
        }
        fields
    }
}

/// Pick a human-readable message out of an error payload.
///
/// `None` means no response was received. Never panics and never returns an
/// empty string.
pub fn extract_error_message(payload: Option<&Value>) -> String {
    let Some(payload) = payload else {
        return NETWORK_ERROR_MESSAGE.to_string();
    };

    if let Some(first) = payload
        .get("non_field_errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
        .and_then(non_empty_text)
    {
        return first;
    }

    if let Some(detail) = payload.get("detail").and_then(Value::as_str) {
        if !detail.is_empty() {
            return detail.to_string();
        }
    }

    if let Some(message) = payload.get("message").and_then(Value::as_str) {
        if !message.is_empty() {
            return message.to_string();
        }
    }

    if let Value::Object(map) = payload {
        for value in map.values() {
            if let Some(first) = value
                .as_array()
                .and_then(|items| items.first())
                .and_then(Value::as_str)
            {
                if !first.is_empty() {
                    return first.to_string();
                }
            }
        }
    }

    GENERIC_ERROR_MESSAGE.to_string()
}

fn non_empty_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::Null => return None,
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    (!text.is_empty()).then_some(text)
}
