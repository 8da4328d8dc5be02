//! HTTP client for the session endpoints.
//!
//! SYSTEM CONTEXT
//! ==============
//! `SessionState` only talks to the network through the `SessionClient`
//! trait: `GET /me` (identity probe) and `POST /logout`. `HttpSessionClient`
//! is the reqwest implementation; tests substitute mocks.
//!
//! ERROR HANDLING
//! ==============
//! Every failure comes back as an `ApiError`. Callers in the auth core
//! classify and log it; nothing here decides what "unauthenticated" means.

#[cfg(test)]
#[path = "api_test.rs"]
mod api_test;

use std::sync::Arc;
use std::time::Duration;

use reqwest::cookie::Jar;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};

use super::types::Identity;
use crate::config::ShellConfig;

pub const ME_PATH: &str = "/me";
pub const LOGOUT_PATH: &str = "/logout";

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by session client operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),

    /// The request never produced a response (connect failure, timeout, ...).
    #[error("request failed: {0}")]
    Request(String),

    /// The server answered with a non-success status.
    #[error("server responded with status {status}")]
    Status { status: u16 },

    /// A success response carried a body that is not a usable identity.
    #[error("response parse failed: {0}")]
    Parse(String),
}

impl ApiError {
    /// `true` when the server explicitly refused the ambient credential.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Status { status: 401 | 403 })
    }

    /// `true` when the failure says nothing about the session itself.
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, Self::Request(_) | Self::Parse(_) | Self::Status { status: 500..=599 })
    }
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}{path}", base_url.trim_end_matches('/'))
}

// =============================================================================
// SESSION CLIENT TRAIT
// =============================================================================

/// The two network operations the auth core depends on. Enables mocking in tests.
#[async_trait::async_trait]
pub trait SessionClient: Send + Sync {
    /// Ask the server who the ambient session cookie belongs to.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for transport failures, non-2xx statuses, or
    /// a body that is not a valid identity.
    async fn fetch_current_user(&self) -> Result<Identity, ApiError>;

    /// End the server-side session.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] for transport failures or non-2xx statuses.
    async fn logout(&self) -> Result<(), ApiError>;
}

// =============================================================================
// HTTP CLIENT
// =============================================================================

/// reqwest-backed [`SessionClient`] with a cookie store and JSON default headers.
pub struct HttpSessionClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpSessionClient {
    /// Build a client from shell config.
    ///
    /// `session_cookie`, when given, is a `name=value` pair seeded into the
    /// cookie store for the base URL so the first probe already carries it.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::HttpClientBuild`] if the base URL or cookie is
    /// unusable or reqwest fails to build.
    pub fn new(config: &ShellConfig, session_cookie: Option<&str>) -> Result<Self, ApiError> {
        let url = reqwest::Url::parse(&config.api_base_url).map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;

        let jar = Arc::new(Jar::default());
        if let Some(cookie) = session_cookie.map(str::trim).filter(|c| !c.is_empty()) {
            if !cookie.contains('=') {
                return Err(ApiError::HttpClientBuild(format!("session cookie must be name=value, got '{cookie}'")));
            }
            jar.add_cookie_str(cookie, &url);
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .cookie_provider(jar)
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeouts.request_secs))
            .connect_timeout(Duration::from_secs(config.timeouts.connect_secs))
            .build()
            .map_err(|e| ApiError::HttpClientBuild(e.to_string()))?;

        Ok(Self { http, base_url: config.api_base_url.clone() })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl SessionClient for HttpSessionClient {
    async fn fetch_current_user(&self) -> Result<Identity, ApiError> {
        let response = self
            .http
            .get(endpoint(&self.base_url, ME_PATH))
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { status: status.as_u16() });
        }

        let text = response
            .text()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;
        parse_identity(&text)
    }

    async fn logout(&self) -> Result<(), ApiError> {
        let response = self
            .http
            .post(endpoint(&self.base_url, LOGOUT_PATH))
            .send()
            .await
            .map_err(|e| ApiError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status { status: status.as_u16() });
        }
        Ok(())
    }
}

fn parse_identity(body: &str) -> Result<Identity, ApiError> {
    let identity: Identity = serde_json::from_str(body).map_err(|e| ApiError::Parse(e.to_string()))?;
    if !identity.is_valid() {
        return Err(ApiError::Parse("identity payload has an empty id".to_owned()));
    }
    Ok(identity)
}
