//! Client library for the BSS battery-swap service.
//!
//! Wraps the REST backend behind typed service calls, keeps the auth session
//! in an injectable store, and implements the two stateful client workflows:
//! QR station authentication (with the PIN fallback) and order-payment
//! polling.

pub mod api;
pub mod config;
pub mod state;
pub mod utils;
pub mod workflows;

pub use api::{ApiClient, ApiError, ErrorKind};
pub use config::Config;
pub use state::session::SessionStore;
