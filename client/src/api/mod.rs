mod auth;
mod credits;
mod orders;
mod sessions;
mod subscriptions;
mod vehicles;

pub mod client;
pub mod types;

pub use auth::{DEMO_EMAIL, DEMO_PASSWORD};
pub use client::ApiClient;
pub use types::*;
