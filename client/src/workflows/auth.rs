//! Post-login routing: riders without a registered vehicle are sent to
//! vehicle setup before they can use the rest of the app.

use crate::api::{ApiClient, ApiError, LoginRequest, UserProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginDestination {
    /// No vehicle on file yet; finish onboarding first.
    VehicleSetup,
    Home,
}

/// Log in and decide where the app should land.
pub async fn sign_in(
    api: &ApiClient,
    email: &str,
    password: &str,
) -> Result<(UserProfile, LoginDestination), ApiError> {
    let auth = api
        .login(LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        })
        .await?;
    let destination = if auth.user.vehicle.is_none() {
        LoginDestination::VehicleSetup
    } else {
        LoginDestination::Home
    };
    tracing::info!(user_id = %auth.user.id, ?destination, "signed in");
    Ok((auth.user, destination))
}
