use super::client::{decode, ApiClient};
use super::types::{ApiError, CreateOrderRequest, Order, Paginated};

impl ApiClient {
    /// Create a purchase order. The response comes back `pending` together
    /// with the payment instructions to render.
    pub async fn create_order(&self, request: CreateOrderRequest) -> Result<Order, ApiError> {
        let response = self
            .send_with_refresh(|| {
                self.http()
                    .post(format!("{}/orders", self.base_url()))
                    .json(&request)
            })
            .await?;
        decode(response, "ORDER").await
    }

    /// Fetch a single order; used by the settlement poll loop.
    pub async fn get_order(&self, order_id: &str) -> Result<Order, ApiError> {
        let response = self
            .send_with_refresh(|| {
                self.http()
                    .get(format!("{}/orders/{}", self.base_url(), order_id))
            })
            .await?;
        decode(response, "ORDER").await
    }

    pub async fn order_history(
        &self,
        page: i64,
        per_page: i64,
    ) -> Result<Paginated<Order>, ApiError> {
        let response = self
            .send_with_refresh(|| {
                self.http()
                    .get(format!("{}/orders/me/history", self.base_url()))
                    .query(&[("page", page.to_string()), ("per_page", per_page.to_string())])
            })
            .await?;
        decode(response, "ORDER").await
    }
}
