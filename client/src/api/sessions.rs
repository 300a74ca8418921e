use serde_json::json;

use super::client::{decode, decode_ack, ApiClient};
use super::types::{ApiError, ErrorKind, StationSession};

/// Header carrying the station session token on the end-session call, for
/// kiosks that validate it in addition to the path id.
const SESSION_TOKEN_HEADER: &str = "x-session-token";

impl ApiClient {
    /// Authenticate a scanned QR session token against the station backend.
    ///
    /// Rejections worth branching on: `QR_AUTH_2FA_REQUIRED` (PIN fallback),
    /// `QR_AUTH_INVALID`, `QR_AUTH_ACTIVE_SESSION`, `QR_AUTH_NOT_FOUND`.
    pub async fn authenticate_station_session(
        &self,
        session_token: &str,
    ) -> Result<StationSession, ApiError> {
        let response = self
            .send_with_refresh(|| {
                self.http()
                    .post(format!(
                        "{}/station-sessions/qr/authenticate",
                        self.base_url()
                    ))
                    .json(&json!({ "session_token": session_token }))
            })
            .await?;
        decode(response, "QR_AUTH").await
    }

    /// Complete the PIN challenge the backend raised for this session token.
    pub async fn verify_two_factor(&self, session_token: &str, pin: &str) -> Result<(), ApiError> {
        let response = self
            .send_with_refresh(|| {
                self.http()
                    .post(format!("{}/station-sessions/verify-2fa", self.base_url()))
                    .json(&json!({ "session_token": session_token, "pin": pin }))
            })
            .await?;
        decode_ack(response, "QR_AUTH").await
    }

    /// End a station session. Intent is idempotent: a backend report that the
    /// session is already inactive counts as a successful end.
    pub async fn end_station_session(
        &self,
        session_id: &str,
        session_token: Option<&str>,
    ) -> Result<(), ApiError> {
        let response = self
            .send_with_refresh(|| {
                let builder = self.http().post(format!(
                    "{}/station-sessions/end/{}",
                    self.base_url(),
                    session_id
                ));
                match session_token {
                    Some(token) => builder.header(SESSION_TOKEN_HEADER, token),
                    None => builder,
                }
            })
            .await?;
        match decode_ack(response, "SESSION").await {
            Err(err) if err.kind() == ErrorKind::SessionInactive => {
                tracing::debug!(session_id, "session was already inactive, treating as ended");
                Ok(())
            }
            other => other,
        }
    }
}
