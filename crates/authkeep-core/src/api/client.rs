//! HTTP client for a GoTrue-compatible identity provider.
//!
//! Covers the calls a session client needs: sign-up, password sign-in,
//! refresh-token exchange, magic link / OTP, verification and logout.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use crate::auth::{RefreshError, RefreshFuture, TokenRefresher};
use crate::models::{
    OtpParams, RefreshTokenParams, Session, SessionOrUser, SignUpParams, UserCredentials,
    VerifyOtpParams,
};

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Maximum number of retries for rate-limited (429) requests.
const MAX_RATE_LIMIT_RETRIES: u32 = 3;

/// Initial backoff delay in milliseconds for rate limiting.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Client for the auth endpoints.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Debug, Clone)]
pub struct GoTrueApi {
    client: Client,
    base_url: String,
}

impl GoTrueApi {
    /// Create a client for `base_url` (e.g. `https://project.example.co/auth/v1`)
    /// sending `headers` (typically `apikey`) on every request.
    pub fn new(base_url: &str, headers: &HashMap<String, String>) -> Result<Self> {
        let mut default_headers = header::HeaderMap::new();
        for (name, value) in headers {
            let name = header::HeaderName::from_bytes(name.as_bytes())
                .with_context(|| format!("Invalid header name: {}", name))?;
            let value = header::HeaderValue::from_str(value)
                .with_context(|| format!("Invalid value for header {}", name))?;
            default_headers.insert(name, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .default_headers(default_headers)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Check if response is successful, returning an error with body if not.
    /// Returns Ok(Some(response)) for success, Ok(None) for rate limit (should retry),
    /// or Err for other errors.
    async fn check_response_for_retry(response: Response) -> Result<Option<Response>> {
        if response.status().is_success() {
            Ok(Some(response))
        } else if response.status().as_u16() == 429 {
            Ok(None)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    /// Send the request built by `build`, retrying with exponential backoff
    /// while the provider answers 429.
    async fn send(&self, url: &str, build: impl Fn() -> RequestBuilder) -> Result<Response> {
        let mut retries = 0;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            let response = build()
                .send()
                .await
                .map_err(ApiError::from)
                .with_context(|| format!("Failed to send request to {}", url))?;

            match Self::check_response_for_retry(response).await? {
                Some(response) => return Ok(response),
                None => {
                    retries += 1;
                    if retries > MAX_RATE_LIMIT_RETRIES {
                        return Err(ApiError::RateLimited.into());
                    }
                    warn!(url = url, retry = retries, backoff_ms = backoff_ms, "Rate limited, backing off");
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                }
            }
        }
    }

    async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
    ) -> Result<T> {
        let url = self.endpoint(path);
        let response = self
            .send(&url, || self.client.post(&url).query(query).json(body))
            .await?;

        response
            .json()
            .await
            .map_err(|e| ApiError::InvalidResponse(e.to_string()))
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    /// POST where the response body carries nothing we need.
    async fn post_ignoring_body<B: Serialize>(
        &self,
        path: &str,
        query: &[(&str, &str)],
        body: &B,
        bearer: Option<&str>,
    ) -> Result<()> {
        let url = self.endpoint(path);
        self.send(&url, || {
            let request = self.client.post(&url).query(query).json(body);
            match bearer {
                Some(token) => request.bearer_auth(token),
                None => request,
            }
        })
        .await?;
        Ok(())
    }

    // ===== Auth Flows =====

    pub async fn sign_up(&self, params: &SignUpParams) -> Result<SessionOrUser> {
        debug!(email = ?params.email, phone = ?params.phone, "Signing up");
        self.post("signup", &[], params).await.context("Sign-up failed")
    }

    pub async fn sign_up_email(&self, email: &str, password: &str) -> Result<SessionOrUser> {
        self.sign_up(&SignUpParams::email(email, password)).await
    }

    pub async fn sign_up_phone(&self, phone: &str, password: &str) -> Result<SessionOrUser> {
        self.sign_up(&SignUpParams::phone(phone, password)).await
    }

    pub async fn sign_in_password(&self, email: &str, password: &str) -> Result<Session> {
        debug!(email, "Signing in with password");
        let body = UserCredentials {
            email: email.to_string(),
            password: password.to_string(),
        };
        self.post("token", &[("grant_type", "password")], &body)
            .await
            .context("Sign-in failed")
    }

    /// Exchange a refresh token for a new session.
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<Session> {
        let body = RefreshTokenParams {
            refresh_token: refresh_token.to_string(),
        };
        self.post("token", &[("grant_type", "refresh_token")], &body)
            .await
            .context("Token refresh failed")
    }

    /// Send a magic link (email) or one-time code (phone).
    pub async fn send_magic_link(&self, params: &OtpParams, redirect_to: Option<&str>) -> Result<()> {
        let query: Vec<(&str, &str)> = redirect_to.map(|url| ("redirect_to", url)).into_iter().collect();
        self.post_ignoring_body("otp", &query, params, None)
            .await
            .context("Failed to send one-time password")
    }

    pub async fn verify_otp(&self, params: &VerifyOtpParams) -> Result<SessionOrUser> {
        self.post("verify", &[], params)
            .await
            .context("One-time password verification failed")
    }

    /// Revoke the refresh tokens tied to `access_token` on the server.
    pub async fn sign_out(&self, access_token: &str) -> Result<()> {
        self.post_ignoring_body("logout", &[], &serde_json::json!({}), Some(access_token))
            .await
            .context("Server-side sign-out failed")
    }
}

/// Classify a failed refresh: credentials refused by the provider are
/// terminal, anything else (network, 5xx, rate limit) is worth retrying.
fn refresh_error(err: anyhow::Error) -> RefreshError {
    let message = format!("{:#}", err);
    match err.downcast_ref::<ApiError>() {
        Some(api) if api.is_rejection() => RefreshError::Rejected(message),
        _ => RefreshError::Transport(message),
    }
}

impl TokenRefresher for GoTrueApi {
    fn refresh(&self, refresh_token: String) -> RefreshFuture {
        let api = self.clone();
        Box::pin(async move {
            api.refresh_session(&refresh_token)
                .await
                .map_err(refresh_error)
        })
    }
}
