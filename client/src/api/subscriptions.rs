use super::client::{decode, ApiClient};
use super::types::{ApiError, Subscription, SubscriptionPackage};

impl ApiClient {
    pub async fn list_packages(&self) -> Result<Vec<SubscriptionPackage>, ApiError> {
        let response = self
            .send_with_refresh(|| {
                self.http()
                    .get(format!("{}/subscription-packages", self.base_url()))
            })
            .await?;
        decode(response, "PACKAGE").await
    }

    pub async fn my_subscriptions(&self) -> Result<Vec<Subscription>, ApiError> {
        let response = self
            .send_with_refresh(|| {
                self.http()
                    .get(format!("{}/subscriptions/me", self.base_url()))
            })
            .await?;
        decode(response, "SUBSCRIPTION").await
    }
}
