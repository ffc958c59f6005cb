//! Thin JSON client over `reqwest` that owns the authentication rules.

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::config::ApiConfig;
use crate::error::ApiError;
use crate::session::SessionContext;

/// How a request authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth<'a> {
    /// Anonymous endpoints (register, login).
    None,
    /// Bearer token of the active session.
    Session,
    /// Explicit bearer token that is not installed yet.
    Bearer(&'a str),
}

/// Shared HTTP plumbing for every service.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionContext>,
}

impl ApiClient {
    /// Build a client for `config` bound to `session`.
    ///
    /// # Errors
    /// Returns [`ApiError::Network`] when the TLS backend cannot be initialised.
    pub fn new(config: &ApiConfig, session: Arc<SessionContext>) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|source| ApiError::Network {
                context: "Failed to initialise HTTP client",
                source,
            })?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            session,
        })
    }

    /// Session this client reads tokens from.
    #[must_use]
    pub const fn session(&self) -> &Arc<SessionContext> {
        &self.session
    }

    pub(crate) async fn get(
        &self,
        path: &str,
        auth: Auth<'_>,
        fallback: &'static str,
    ) -> Result<Value, ApiError> {
        self.call(Method::GET, path, None::<&()>, auth, fallback).await
    }

    pub(crate) async fn post<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        auth: Auth<'_>,
        fallback: &'static str,
    ) -> Result<Value, ApiError> {
        self.call(Method::POST, path, Some(body), auth, fallback).await
    }

    pub(crate) async fn put<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        auth: Auth<'_>,
        fallback: &'static str,
    ) -> Result<Value, ApiError> {
        self.call(Method::PUT, path, Some(body), auth, fallback).await
    }

    pub(crate) async fn delete(
        &self,
        path: &str,
        auth: Auth<'_>,
        fallback: &'static str,
    ) -> Result<Value, ApiError> {
        self.call(Method::DELETE, path, None::<&()>, auth, fallback).await
    }

    async fn call<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        auth: Auth<'_>,
        fallback: &'static str,
    ) -> Result<Value, ApiError> {
        let token = match auth {
            Auth::None => None,
            Auth::Session => Some(self.session.token().ok_or(ApiError::NotAuthenticated)?),
            Auth::Bearer(token) => Some(token.to_owned()),
        };

        let url = format!("{}{path}", self.base_url);
        let mut request = self.http.request(method.clone(), &url);
        if let Some(token) = &token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|source| ApiError::Network {
            context: fallback,
            source,
        })?;
        let status = response.status();
        debug!(%method, path, status = status.as_u16(), "api response");
        let text = response.text().await.map_err(|source| ApiError::Network {
            context: fallback,
            source,
        })?;

        if status == StatusCode::UNAUTHORIZED && token.is_some() {
            self.session.invalidate();
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            return Err(ApiError::Server {
                status: status.as_u16(),
                message: server_message(&text).unwrap_or_else(|| fallback.to_owned()),
            });
        }
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

/// The `message` field of an error body, when there is one.
fn server_message(body: &str) -> Option<String> {
    serde_json::from_str::<Value>(body)
        .ok()?
        .get("message")?
        .as_str()
        .filter(|message| !message.trim().is_empty())
        .map(str::to_owned)
}

/// Turn a 2xx `{success: false, message}` envelope into [`ApiError::Rejected`].
pub(crate) fn ensure_success(body: &Value, fallback: &'static str) -> Result<(), ApiError> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .filter(|message| !message.trim().is_empty())
            .unwrap_or(fallback);
        return Err(ApiError::Rejected(message.to_owned()));
    }
    Ok(())
}
