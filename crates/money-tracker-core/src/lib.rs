//! money-tracker-core - client library for the money-tracker backend.
//!
//! - `api`: the authenticated [`SessionClient`], error handling, account and
//!   finance endpoints
//! - `auth`: credential storage (`jwt-auth`, `refresh-auth`, `csrftoken`)
//!   and session state
//! - `notify`: the notification and navigation side channels
//! - `config`: API location and timeouts
//! - `models`: request and response payloads

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod notify;

pub use api::{ApiError, ApiRequest, Dashboard, Resource, SessionClient, SessionClientBuilder};
pub use auth::{CredentialKey, CredentialStore, SessionState};
pub use config::Config;
pub use notify::{Navigator, Notifier};
