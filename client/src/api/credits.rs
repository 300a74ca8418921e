use super::client::{decode, ApiClient};
use super::types::{ApiError, SwapCreditSnapshot, SwapSinglePrice};

impl ApiClient {
    /// Current entitlement snapshot. Callers re-fetch after any purchase
    /// settles; the snapshot is never adjusted locally.
    pub async fn my_swap_credits(&self) -> Result<SwapCreditSnapshot, ApiError> {
        let response = self
            .send_with_refresh(|| {
                self.http()
                    .get(format!("{}/user-swap-credits/me", self.base_url()))
            })
            .await?;
        decode(response, "CREDIT").await
    }

    /// Tiered unit prices for single-swap purchases.
    pub async fn single_swap_prices(&self) -> Result<Vec<SwapSinglePrice>, ApiError> {
        let response = self
            .send_with_refresh(|| {
                self.http()
                    .get(format!("{}/swap-single-prices", self.base_url()))
            })
            .await?;
        decode(response, "PRICE").await
    }
}
