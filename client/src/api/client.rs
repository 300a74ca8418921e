use std::sync::Arc;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::api::types::{ApiError, TokenPair};
use crate::config::Config;
use crate::state::session::SessionStore;

/// HTTP transport for the BSS backend. Attaches the bearer token to every
/// request and transparently performs the one-shot 401 → refresh → replay
/// dance. Token refresh is single-flight: concurrent 401s share one refresh
/// call.
pub struct ApiClient {
    http: reqwest::Client,
    config: Config,
    session: Arc<SessionStore>,
    refresh_gate: tokio::sync::Mutex<()>,
}

impl ApiClient {
    pub fn new(config: Config, session: Arc<SessionStore>) -> Self {
        ApiClient {
            http: reqwest::Client::new(),
            config,
            session,
            refresh_gate: tokio::sync::Mutex::new(()),
        }
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.config.api_base_url
    }

    pub(crate) fn config(&self) -> &Config {
        &self.config
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    /// Send an authenticated request. On 401 the stored refresh token is
    /// exchanged for a new pair (at most one refresh in flight system-wide)
    /// and the request is rebuilt and replayed once; a second 401 is left for
    /// the caller to surface.
    pub(crate) async fn send_with_refresh<F>(
        &self,
        build: F,
    ) -> Result<reqwest::Response, ApiError>
    where
        F: Fn() -> reqwest::RequestBuilder,
    {
        let token = self.session.access_token();
        let response = bearer(build(), token.as_deref())
            .send()
            .await
            .map_err(ApiError::network)?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        tracing::debug!("request returned 401, refreshing session token");
        self.refresh_session(token.as_deref()).await?;

        let token = self.session.access_token();
        bearer(build(), token.as_deref())
            .send()
            .await
            .map_err(ApiError::network)
    }

    /// Exchange the refresh token for a new pair. `stale_token` is the access
    /// token the failed request was sent with: if the current token already
    /// differs by the time the gate is acquired, another caller completed the
    /// exchange and this one just reuses the result.
    async fn refresh_session(&self, stale_token: Option<&str>) -> Result<(), ApiError> {
        let _guard = self.refresh_gate.lock().await;

        let current = self.session.access_token();
        if current.as_deref() != stale_token {
            if current.is_some() {
                tracing::debug!("token already rotated by a concurrent refresh");
                return Ok(());
            }
            return Err(ApiError::unauthorized("session expired"));
        }

        let Some(refresh_token) = self.session.refresh_token() else {
            return Err(ApiError::unauthorized("no refresh token available"));
        };

        let result = async {
            let response = self
                .http
                .post(format!("{}/auth/refresh", self.base_url()))
                .json(&serde_json::json!({ "refresh_token": refresh_token }))
                .send()
                .await
                .map_err(ApiError::network)?;
            decode::<TokenPair>(response, "AUTH").await
        }
        .await;

        match result {
            Ok(pair) => {
                self.session
                    .set_tokens(&pair.access_token, &pair.refresh_token)?;
                tracing::info!("session token refreshed");
                Ok(())
            }
            Err(err) => {
                // A dead refresh token forces a logout; every queued caller
                // sees the same rejection.
                tracing::warn!(%err, "token refresh failed, clearing credentials");
                self.session.clear()?;
                Err(err)
            }
        }
    }
}

fn bearer(builder: reqwest::RequestBuilder, token: Option<&str>) -> reqwest::RequestBuilder {
    match token {
        Some(token) => builder.bearer_auth(token),
        None => builder,
    }
}

/// Wire envelope shared by every endpoint:
/// `{ success, data?, error?: { code, message } }`.
#[derive(Debug, Deserialize)]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ErrorBody>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Decode an envelope into its payload, or a uniform `ApiError`. `scope` is
/// the per-service prefix used when the body carries no stable code
/// (400 → `{SCOPE}_INVALID`, 404 → `{SCOPE}_NOT_FOUND`, ...).
pub(crate) async fn decode<T: DeserializeOwned>(
    response: reqwest::Response,
    scope: &str,
) -> Result<T, ApiError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(ApiError::network)?;

    if status.is_success() {
        let envelope: Envelope<T> = serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::parse(format!("failed to parse response: {err}")))?;
        if envelope.success {
            return envelope
                .data
                .ok_or_else(|| ApiError::parse("response envelope missing data"));
        }
        return Err(envelope_error(envelope.error, status, scope));
    }

    let error = serde_json::from_slice::<Envelope<serde_json::Value>>(&bytes)
        .ok()
        .and_then(|envelope| envelope.error);
    Err(envelope_error(error, status, scope))
}

/// Like [`decode`] but for endpoints whose success payload carries nothing
/// the client needs.
pub(crate) async fn decode_ack(response: reqwest::Response, scope: &str) -> Result<(), ApiError> {
    let status = response.status();
    let bytes = response.bytes().await.map_err(ApiError::network)?;

    if status.is_success() {
        let envelope: Envelope<serde_json::Value> = serde_json::from_slice(&bytes)
            .map_err(|err| ApiError::parse(format!("failed to parse response: {err}")))?;
        if envelope.success {
            return Ok(());
        }
        return Err(envelope_error(envelope.error, status, scope));
    }

    let error = serde_json::from_slice::<Envelope<serde_json::Value>>(&bytes)
        .ok()
        .and_then(|envelope| envelope.error);
    Err(envelope_error(error, status, scope))
}

fn envelope_error(body: Option<ErrorBody>, status: StatusCode, scope: &str) -> ApiError {
    let fallback_code = || match status.as_u16() {
        400 => format!("{scope}_INVALID"),
        401 => "UNAUTHORIZED".to_string(),
        404 => format!("{scope}_NOT_FOUND"),
        409 => format!("{scope}_ACTIVE_SESSION"),
        _ => "UNKNOWN".to_string(),
    };
    match body {
        Some(body) => ApiError {
            code: body.code.unwrap_or_else(fallback_code),
            message: body
                .message
                .unwrap_or_else(|| format!("request rejected with status {status}")),
            details: None,
        },
        None => ApiError::new(
            fallback_code(),
            format!("request rejected with status {status}"),
        ),
    }
}
