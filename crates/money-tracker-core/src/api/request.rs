//! Outgoing request description.
//!
//! An `ApiRequest` is plain data so that a request can be rebuilt and
//! replayed after a token refresh. `PendingRequest` tags it with the attempt
//! it is on.

use reqwest::multipart::{Form, Part};
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

use super::ApiError;

/// Token refresh endpoint
pub const REFRESH_PATH: &str = "/dj-rest-auth/token/refresh/";

/// Login endpoint
pub const LOGIN_PATH: &str = "/dj-rest-auth/login/";

/// One field of a multipart form.
#[derive(Debug, Clone, PartialEq)]
pub enum FormPart {
    Text {
        name: String,
        value: String,
    },
    File {
        name: String,
        file_name: String,
        mime: Option<String>,
        bytes: Vec<u8>,
    },
}

impl FormPart {
    pub fn text(name: impl Into<String>, value: impl Into<String>) -> Self {
        FormPart::Text {
            name: name.into(),
            value: value.into(),
        }
    }

    pub fn file(
        name: impl Into<String>,
        file_name: impl Into<String>,
        mime: Option<String>,
        bytes: Vec<u8>,
    ) -> Self {
        FormPart::File {
            name: name.into(),
            file_name: file_name.into(),
            mime,
            bytes,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(Value),
    Multipart(Vec<FormPart>),
}

impl RequestBody {
    pub fn is_multipart(&self) -> bool {
        matches!(self, RequestBody::Multipart(_))
    }

    /// Build a fresh multipart form. Forms are single-use, so this runs once
    /// per attempt.
    pub(crate) fn to_form(parts: &[FormPart]) -> Result<Form, ApiError> {
        let mut form = Form::new();
        for part in parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name.clone(), value.clone()),
                FormPart::File {
                    name,
                    file_name,
                    mime,
                    bytes,
                } => {
                    let mut file = Part::bytes(bytes.clone()).file_name(file_name.clone());
                    if let Some(mime) = mime {
                        file = file.mime_str(mime).map_err(|e| {
                            ApiError::InvalidRequest(format!("Invalid MIME type {}: {}", mime, e))
                        })?;
                    }
                    form.part(name.clone(), file)
                }
            };
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the configured base URL.
    pub path: String,
    pub body: RequestBody,
    pub headers: Vec<(String, String)>,
    /// Skip the global error notification for this call.
    pub suppress_global_error: bool,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: RequestBody::Empty,
            headers: Vec::new(),
            suppress_global_error: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Serialize `body` as the JSON payload.
    pub fn with_json<B: Serialize + ?Sized>(self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidRequest(format!("Failed to serialize body: {}", e)))?;
        Ok(self.json(value))
    }

    pub fn multipart(mut self, parts: Vec<FormPart>) -> Self {
        self.body = RequestBody::Multipart(parts);
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn suppress_global_error(mut self) -> Self {
        self.suppress_global_error = true;
        self
    }

    /// Refresh and login calls manage their own feedback and never trigger a
    /// refresh themselves.
    pub fn is_auth_endpoint(&self) -> bool {
        self.path.contains("/token/refresh/") || self.path.contains("/login/")
    }
}

/// Which attempt a request is on. A request is replayed at most once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Attempt {
    Original,
    /// Replay after a refresh, carrying the token to send.
    Retried { access_token: String },
}

#[derive(Debug, Clone)]
pub(crate) struct PendingRequest {
    pub attempt: Attempt,
    pub request: ApiRequest,
}

impl PendingRequest {
    pub fn original(request: ApiRequest) -> Self {
        Self {
            attempt: Attempt::Original,
            request,
        }
    }

    pub fn retried(self, access_token: String) -> Self {
        Self {
            attempt: Attempt::Retried { access_token },
            request: self.request,
        }
    }

    pub fn is_retried(&self) -> bool {
        matches!(self.attempt, Attempt::Retried { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_auth_endpoint_detection() {
        assert!(ApiRequest::post(REFRESH_PATH).is_auth_endpoint());
        assert!(ApiRequest::post(LOGIN_PATH).is_auth_endpoint());
        assert!(!ApiRequest::post("/dj-rest-auth/logout/").is_auth_endpoint());
        assert!(!ApiRequest::get("/api/liabilities/loans/").is_auth_endpoint());
    }

    #[test]
    fn test_builder() {
        let request = ApiRequest::put("/api/currencies/currencies/USD/")
            .json(json!({"description": "US Dollar"}))
            .header("X-Trace", "abc")
            .suppress_global_error();

        assert_eq!(request.method, Method::PUT);
        assert_eq!(request.body, RequestBody::Json(json!({"description": "US Dollar"})));
        assert_eq!(request.headers, vec![("X-Trace".to_string(), "abc".to_string())]);
        assert!(request.suppress_global_error);
    }

    #[test]
    fn test_retry_marker() {
        let pending = PendingRequest::original(ApiRequest::get("/protected"));
        assert!(!pending.is_retried());

        let retried = pending.retried("new".to_string());
        assert!(retried.is_retried());
        assert_eq!(
            retried.attempt,
            Attempt::Retried {
                access_token: "new".to_string()
            }
        );
        assert_eq!(retried.request.path, "/protected");
    }

    #[test]
    fn test_multipart_form_rejects_bad_mime() {
        let parts = vec![FormPart::file("profile_image", "me.png", Some("not a mime".into()), vec![1])];
        assert!(RequestBody::to_form(&parts).is_err());

        let parts = vec![
            FormPart::text("name", "Ada"),
            FormPart::file("profile_image", "me.png", Some("image/png".into()), vec![1, 2]),
        ];
        assert!(RequestBody::to_form(&parts).is_ok());
    }
}
