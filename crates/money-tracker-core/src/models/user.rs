//! Account models for the dj-rest-auth endpoints.

use serde::{Deserialize, Serialize};

use crate::api::FormPart;

/// The authenticated user as returned by `/dj-rest-auth/user/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(alias = "id", default)]
    pub pk: Option<i64>,
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub middle_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub profile_image: Option<String>,
}

impl User {
    /// Best display name: full name if known, else the username.
    pub fn display_name(&self) -> String {
        if let Some(name) = self.name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_string();
        }
        let parts: Vec<&str> = [&self.first_name, &self.middle_name, &self.last_name]
            .into_iter()
            .filter_map(|p| p.as_deref())
            .filter(|p| !p.trim().is_empty())
            .collect();
        if parts.is_empty() {
            self.username.clone()
        } else {
            parts.join(" ")
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user: User,
    #[serde(default)]
    pub access: String,
    #[serde(default)]
    pub refresh: String,
}

/// Generic `{ "detail": ... }` acknowledgement.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DetailResponse {
    #[serde(default)]
    pub detail: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordChange {
    pub old_password: String,
    pub new_password1: String,
    pub new_password2: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PasswordResetConfirm {
    pub uid: String,
    pub token: String,
    pub new_password1: String,
    pub new_password2: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password1: String,
    pub password2: String,
}

/// Uploaded profile picture.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileImage {
    pub file_name: String,
    pub mime: Option<String>,
    pub bytes: Vec<u8>,
}

/// Profile fields sent as multipart form data. `None` fields are omitted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub middle_name: Option<String>,
    pub last_name: Option<String>,
    pub phone_number: Option<String>,
    pub profile_image: Option<ProfileImage>,
}

impl ProfileUpdate {
    pub(crate) fn into_parts(self) -> Vec<FormPart> {
        let text_fields = [
            ("email", self.email),
            ("first_name", self.first_name),
            ("middle_name", self.middle_name),
            ("last_name", self.last_name),
            ("phone_number", self.phone_number),
        ];
        let mut parts: Vec<FormPart> = text_fields
            .into_iter()
            .filter_map(|(name, value)| value.map(|v| FormPart::text(name, v)))
            .collect();
        if let Some(image) = self.profile_image {
            parts.push(FormPart::file(
                "profile_image",
                image.file_name,
                image.mime,
                image.bytes,
            ));
        }
        parts
    }
}
