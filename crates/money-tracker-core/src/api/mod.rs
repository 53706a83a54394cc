//! REST API client for the money-tracker backend.
//!
//! [`SessionClient`] owns the authenticated request pipeline. Account
//! endpoints live in `auth`, finance collections and the dashboard in
//! `resources`.
//!
//! The backend uses JWT bearer tokens issued by dj-rest-auth plus Django's
//! CSRF cookie.

pub mod auth;
pub mod client;
pub mod error;
pub mod refresh;
pub mod request;
pub mod resources;

pub use client::{SessionClient, SessionClientBuilder, SESSION_EXPIRED_MESSAGE};
pub use error::{
    extract_error_message, ApiError, ErrorBody, GENERIC_ERROR_MESSAGE, NETWORK_ERROR_MESSAGE,
};
pub use refresh::{RefreshCoordinator, RefreshOutcome};
pub use request::{ApiRequest, FormPart, RequestBody, LOGIN_PATH, REFRESH_PATH};
pub use resources::{Dashboard, Resource};
