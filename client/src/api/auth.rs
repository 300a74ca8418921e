use super::client::{decode, ApiClient};
use super::types::{ApiError, AuthResponse, LoginRequest, RegisterRequest, UserProfile};

/// Credentials recognized by the offline demo path (demo builds only).
pub const DEMO_EMAIL: &str = "demo@bss.com";
pub const DEMO_PASSWORD: &str = "demo123";

impl ApiClient {
    /// Authenticate with email + password and persist the issued session.
    ///
    /// With `demo_mode` enabled, the demo credentials short-circuit without
    /// touching the network: the canned profile has no vehicle, so the
    /// post-login flow lands on vehicle setup.
    pub async fn login(&self, request: LoginRequest) -> Result<AuthResponse, ApiError> {
        if self.config().demo_mode
            && request.email == DEMO_EMAIL
            && request.password == DEMO_PASSWORD
        {
            tracing::info!("demo credentials recognized, skipping network login");
            let auth = demo_auth_response();
            self.persist_auth(&auth)?;
            return Ok(auth);
        }

        let response = self
            .http()
            .post(format!("{}/auth/login", self.base_url()))
            .json(&request)
            .send()
            .await
            .map_err(ApiError::network)?;
        let auth: AuthResponse = decode(response, "AUTH").await?;
        self.persist_auth(&auth)?;
        Ok(auth)
    }

    pub async fn register(&self, request: RegisterRequest) -> Result<AuthResponse, ApiError> {
        let response = self
            .http()
            .post(format!("{}/auth/register", self.base_url()))
            .json(&request)
            .send()
            .await
            .map_err(ApiError::network)?;
        let auth: AuthResponse = decode(response, "AUTH").await?;
        self.persist_auth(&auth)?;
        Ok(auth)
    }

    /// Fetch the current profile and update the cached copy.
    pub async fn get_me(&self) -> Result<UserProfile, ApiError> {
        let response = self
            .send_with_refresh(|| self.http().get(format!("{}/auth/me", self.base_url())))
            .await?;
        let user: UserProfile = decode(response, "AUTH").await?;
        self.session().set_user(&user)?;
        Ok(user)
    }

    /// Drop the stored credentials. Purely local: the backend invalidates
    /// tokens by expiry.
    pub fn logout(&self) -> Result<(), ApiError> {
        self.session().clear()?;
        tracing::info!("session cleared");
        Ok(())
    }

    fn persist_auth(&self, auth: &AuthResponse) -> Result<(), ApiError> {
        self.session()
            .set_tokens(&auth.access_token, &auth.refresh_token)?;
        self.session().set_user(&auth.user)?;
        Ok(())
    }
}

fn demo_auth_response() -> AuthResponse {
    AuthResponse {
        user: UserProfile {
            id: "demo_user".to_string(),
            name: "Demo Rider".to_string(),
            email: DEMO_EMAIL.to_string(),
            phone: None,
            email_verified: true,
            phone_verified: false,
            vehicle: None,
            swap_credits: None,
        },
        access_token: "demo_access_token".to_string(),
        refresh_token: "demo_refresh_token".to_string(),
    }
}
