//! QR scan workflow: code parsing, station authentication and the PIN
//! fallback, with a guard against the scanner delivering the same frame
//! multiple times.

use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::api::{ApiClient, ApiError, ErrorKind, StationSession};

/// A QR payload the app understands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScannedCode {
    /// Token sent to `/station-sessions/qr/authenticate`.
    pub session_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub station_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kiosk_id: Option<String>,
}

/// Parse a raw QR string into a [`ScannedCode`].
///
/// Stations encode either a deep link carrying a `qr_data=` parameter or the
/// bare payload itself. Recognized payloads:
///
/// - `BSS_SESSION_<token>`: a live session token.
/// - `BSS_KIOSK_<id>` / `BSS_STATION_<id>`: legacy kiosk stickers with no
///   embedded token; a session token is synthesized as `mock_session_<id>`,
///   matching what those kiosks register on their side.
pub fn parse_qr(raw: &str) -> Option<ScannedCode> {
    let payload = match raw.split_once("qr_data=") {
        Some((_, rest)) => rest.split('&').next().unwrap_or(""),
        None => raw,
    };
    let payload = payload.trim();

    if let Some(token) = payload.strip_prefix("BSS_SESSION_") {
        if token.is_empty() {
            return None;
        }
        return Some(ScannedCode {
            session_token: token.to_string(),
            station_id: None,
            kiosk_id: None,
        });
    }
    if let Some(id) = payload.strip_prefix("BSS_KIOSK_") {
        if id.is_empty() {
            return None;
        }
        return Some(ScannedCode {
            session_token: format!("mock_session_{id}"),
            station_id: None,
            kiosk_id: Some(id.to_string()),
        });
    }
    if let Some(id) = payload.strip_prefix("BSS_STATION_") {
        if id.is_empty() {
            return None;
        }
        return Some(ScannedCode {
            session_token: format!("mock_session_{id}"),
            station_id: Some(id.to_string()),
            kiosk_id: None,
        });
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// Ready to accept a frame.
    Idle,
    /// A frame is being authenticated; further frames are dropped.
    Scanning,
    /// The backend demanded a PIN for the pending code.
    AwaitingPin,
    /// Authentication succeeded and the app moved on; late frames are stale.
    NavigatedAway,
}

#[derive(Debug)]
pub enum ScanOutcome {
    /// The station accepted the code; proceed to the swap screen.
    SessionReady(StationSession),
    /// The station wants a PIN before accepting this code.
    PinRequired(ScannedCode),
    /// The payload is not one of ours.
    UnsupportedCode,
    /// The station rejected the code (or the PIN).
    Rejected(ApiError),
    /// Dropped by the re-entrancy guard; no request was made.
    Ignored,
}

struct ScanState {
    phase: ScanPhase,
    pending: Option<ScannedCode>,
}

/// Drives the scan workflow. Camera pipelines deliver the same QR frame many
/// times per second, so every entry point checks the phase first and only one
/// authentication is ever in flight.
pub struct ScanController {
    api: Arc<ApiClient>,
    state: Mutex<ScanState>,
}

impl ScanController {
    pub fn new(api: Arc<ApiClient>) -> Self {
        ScanController {
            api,
            state: Mutex::new(ScanState {
                phase: ScanPhase::Idle,
                pending: None,
            }),
        }
    }

    pub fn phase(&self) -> ScanPhase {
        self.lock().phase
    }

    /// Handle a decoded QR frame.
    pub async fn handle_scan(&self, raw: &str) -> ScanOutcome {
        let code = {
            let mut state = self.lock();
            if state.phase != ScanPhase::Idle {
                return ScanOutcome::Ignored;
            }
            let Some(code) = parse_qr(raw) else {
                tracing::debug!(raw, "unrecognized QR payload");
                return ScanOutcome::UnsupportedCode;
            };
            state.phase = ScanPhase::Scanning;
            state.pending = Some(code.clone());
            code
        };

        match self.api.authenticate_station_session(&code.session_token).await {
            Ok(session) => {
                let mut state = self.lock();
                state.phase = ScanPhase::NavigatedAway;
                state.pending = None;
                ScanOutcome::SessionReady(session)
            }
            Err(err) if err.kind() == ErrorKind::TwoFactorRequired => {
                tracing::info!("station requires PIN verification");
                self.lock().phase = ScanPhase::AwaitingPin;
                ScanOutcome::PinRequired(code)
            }
            Err(err) => {
                tracing::warn!(%err, "station rejected scanned code");
                let mut state = self.lock();
                state.phase = ScanPhase::Idle;
                state.pending = None;
                ScanOutcome::Rejected(err)
            }
        }
    }

    /// Submit the PIN for the code that raised the challenge. A wrong PIN
    /// keeps the challenge open for another attempt; any other failure
    /// abandons the code and re-arms the scanner.
    pub async fn verify_pin(&self, pin: &str) -> ScanOutcome {
        let code = {
            let state = self.lock();
            match (&state.phase, &state.pending) {
                (ScanPhase::AwaitingPin, Some(code)) => code.clone(),
                _ => return ScanOutcome::Ignored,
            }
        };

        if let Err(err) = self.api.verify_two_factor(&code.session_token, pin).await {
            if err.kind() == ErrorKind::Invalid {
                tracing::info!("PIN rejected, challenge still open");
                return ScanOutcome::Rejected(err);
            }
            tracing::warn!(%err, "PIN verification failed");
            let mut state = self.lock();
            state.phase = ScanPhase::Idle;
            state.pending = None;
            return ScanOutcome::Rejected(err);
        }

        match self.api.authenticate_station_session(&code.session_token).await {
            Ok(session) => {
                let mut state = self.lock();
                state.phase = ScanPhase::NavigatedAway;
                state.pending = None;
                ScanOutcome::SessionReady(session)
            }
            Err(err) => {
                let mut state = self.lock();
                state.phase = ScanPhase::Idle;
                state.pending = None;
                ScanOutcome::Rejected(err)
            }
        }
    }

    /// Re-arm the scanner (e.g. the scan screen became visible again).
    pub fn reset(&self) {
        let mut state = self.lock();
        state.phase = ScanPhase::Idle;
        state.pending = None;
    }

    /// Mark the scan screen as left so late camera frames are dropped.
    pub fn leave(&self) {
        self.lock().phase = ScanPhase::NavigatedAway;
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScanState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
