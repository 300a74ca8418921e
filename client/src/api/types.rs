use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::utils::storage::StorageError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub access_token: String,
    pub refresh_token: String,
}

/// Token pair minted by `/auth/refresh`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(default)]
    pub phone_verified: bool,
    #[serde(default)]
    pub vehicle: Option<Vehicle>,
    #[serde(default)]
    pub swap_credits: Option<SwapCreditSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vehicle {
    pub id: String,
    pub user_id: String,
    pub plate_number: String,
    pub model: String,
    #[serde(default)]
    pub battery_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateVehicleRequest {
    pub plate_number: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_type: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateVehicleRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plate_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_type: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Inactive,
}

/// Server-side record of an authenticated kiosk interaction. Its
/// `session_token` is distinct from the auth access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StationSession {
    pub id: String,
    pub session_token: String,
    pub station_id: String,
    pub user_id: String,
    pub status: SessionStatus,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Package,
    Single,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    // Some backend deployments report "success" for settled orders.
    #[serde(alias = "success")]
    Paid,
    Cancelled,
    Expired,
}

impl OrderStatus {
    /// Status transitions are monotonic: once an order leaves `pending` it
    /// never comes back.
    pub fn is_terminal(self) -> bool {
        self != OrderStatus::Pending
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentInstructions {
    #[serde(default)]
    pub bank_name: Option<String>,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub account_name: Option<String>,
    #[serde(default)]
    pub qr_string: Option<String>,
    #[serde(default)]
    pub amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[serde(default)]
    pub package_id: Option<String>,
    #[serde(default)]
    pub quantity: Option<u32>,
    pub total_amount: f64,
    pub status: OrderStatus,
    #[serde(default)]
    pub payment: Option<PaymentInstructions>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOrderRequest {
    #[serde(rename = "type")]
    pub order_type: OrderType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
}

impl CreateOrderRequest {
    pub fn single(quantity: u32) -> Self {
        CreateOrderRequest {
            order_type: OrderType::Single,
            package_id: None,
            quantity: Some(quantity),
        }
    }

    pub fn package(package_id: impl Into<String>) -> Self {
        CreateOrderRequest {
            order_type: OrderType::Package,
            package_id: Some(package_id.into()),
            quantity: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionPackage {
    pub id: String,
    pub name: String,
    pub swap_quota: u32,
    pub duration_days: u32,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub package_id: String,
    pub status: String,
    pub starts_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub remaining_quota: u32,
}

/// Read-only projection of the user's swap entitlements. Never mutated
/// locally; always re-fetched after a purchase.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SwapCreditSnapshot {
    #[serde(default)]
    pub remaining_single: u32,
    #[serde(default)]
    pub used_single: u32,
    #[serde(default)]
    pub subscription_remaining: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwapSinglePrice {
    pub min_quantity: u32,
    pub unit_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paginated<T> {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub items: Vec<T>,
}

/// Uniform failure shape returned by every service wrapper. `code` is a
/// stable string the UI can branch on; `message` is best-effort human text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, thiserror::Error)]
#[error("{message} [{code}]")]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
}

/// Structured taxonomy over the wire-level string codes, so workflow
/// branching does not depend on ad-hoc message matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    TwoFactorRequired,
    Unauthorized,
    Invalid,
    NotFound,
    ActiveSession,
    SessionInactive,
    Network,
    Parse,
    Storage,
    Unknown,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        ApiError {
            code: code.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn network(err: reqwest::Error) -> Self {
        Self::new("NETWORK", format!("request failed: {err}"))
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::new("PARSE", message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new("UNKNOWN", message)
    }

    pub fn kind(&self) -> ErrorKind {
        match self.code.as_str() {
            "QR_AUTH_2FA_REQUIRED" => ErrorKind::TwoFactorRequired,
            "SESSION_ALREADY_INACTIVE" => ErrorKind::SessionInactive,
            "UNAUTHORIZED" => ErrorKind::Unauthorized,
            "NETWORK" => ErrorKind::Network,
            "PARSE" => ErrorKind::Parse,
            "STORAGE" => ErrorKind::Storage,
            code if code.ends_with("_NOT_FOUND") => ErrorKind::NotFound,
            code if code.ends_with("_INVALID") => ErrorKind::Invalid,
            code if code.ends_with("_ACTIVE_SESSION") => ErrorKind::ActiveSession,
            _ => self.kind_from_message(),
        }
    }

    // Compatibility shim for backends that only flag these conditions in the
    // message text instead of a stable code.
    fn kind_from_message(&self) -> ErrorKind {
        let message = self.message.to_ascii_lowercase();
        if message.contains("2fa") || message.contains("verify-2fa") {
            return ErrorKind::TwoFactorRequired;
        }
        if message.contains("already inactive") {
            return ErrorKind::SessionInactive;
        }
        ErrorKind::Unknown
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        Self::new("STORAGE", err.to_string())
    }
}
