//! Order settlement polling. Bank-transfer payments settle out of band, so
//! after creating an order the app polls its status on a fixed interval until
//! it leaves `pending` or the watch budget runs out.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::api::{ApiClient, ApiError, CreateOrderRequest, Order, OrderStatus};

#[derive(Debug)]
pub enum PaymentOutcome {
    /// The order settled.
    Paid(Order),
    /// The order was cancelled or expired before payment arrived.
    Closed(Order),
    /// The watch budget ran out with the order still pending. The order may
    /// still settle later; history is the source of truth.
    TimedOut(Order),
}

/// Polls a pending order until it reaches a terminal status.
#[derive(Clone)]
pub struct OrderWatcher {
    api: Arc<ApiClient>,
    interval: Duration,
    max_attempts: u32,
}

impl OrderWatcher {
    pub fn new(api: Arc<ApiClient>) -> Self {
        let interval = api.config().poll_interval;
        let max_attempts = api.config().poll_max_attempts;
        OrderWatcher {
            api,
            interval,
            max_attempts,
        }
    }

    pub fn with_policy(api: Arc<ApiClient>, interval: Duration, max_attempts: u32) -> Self {
        OrderWatcher {
            api,
            interval,
            max_attempts,
        }
    }

    /// Poll until `order` settles, closes, or the attempt budget is spent.
    ///
    /// Only the status is merged from poll responses; the payment
    /// instructions shown to the user come from the original order and never
    /// flicker when a poll response omits them. A failed poll logs and
    /// consumes an attempt.
    pub async fn wait_for_settlement(&self, mut order: Order) -> PaymentOutcome {
        if order.status.is_terminal() {
            return settle(order);
        }

        for attempt in 1..=self.max_attempts {
            tokio::time::sleep(self.interval).await;
            match self.api.get_order(&order.id).await {
                Ok(latest) => {
                    if latest.status != order.status {
                        tracing::info!(
                            order_id = %order.id,
                            from = ?order.status,
                            to = ?latest.status,
                            "order status changed"
                        );
                    }
                    order.status = latest.status;
                    if order.status.is_terminal() {
                        return settle(order);
                    }
                }
                Err(err) => {
                    tracing::warn!(order_id = %order.id, attempt, %err, "order poll failed");
                }
            }
        }

        tracing::info!(order_id = %order.id, "watch budget exhausted, order still pending");
        PaymentOutcome::TimedOut(order)
    }

    /// Watch in the background. The returned handle can be cancelled when the
    /// user leaves the payment screen.
    pub fn spawn(&self, order: Order) -> WatchHandle {
        let watcher = self.clone();
        WatchHandle {
            task: tokio::spawn(async move { watcher.wait_for_settlement(order).await }),
        }
    }
}

fn settle(order: Order) -> PaymentOutcome {
    match order.status {
        OrderStatus::Paid => PaymentOutcome::Paid(order),
        _ => PaymentOutcome::Closed(order),
    }
}

/// Handle to a background settlement watch.
pub struct WatchHandle {
    task: JoinHandle<PaymentOutcome>,
}

impl WatchHandle {
    /// Stop watching. The order itself is untouched.
    pub fn cancel(self) {
        self.task.abort();
    }

    /// Wait for the watch to finish. `None` if it was cancelled.
    pub async fn wait(self) -> Option<PaymentOutcome> {
        self.task.await.ok()
    }
}

/// Create an order and start watching it in one step. Returns the pending
/// order (with its payment instructions) immediately so the UI can render
/// while the watch runs.
pub async fn purchase(
    api: &Arc<ApiClient>,
    request: CreateOrderRequest,
) -> Result<(Order, WatchHandle), ApiError> {
    let order = api.create_order(request).await?;
    tracing::info!(order_id = %order.id, status = ?order.status, "order created");
    let handle = OrderWatcher::new(Arc::clone(api)).spawn(order.clone());
    Ok((order, handle))
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use serde_json::json;

    use super::*;
    use crate::config::Config;
    use crate::state::session::SessionStore;

    fn api(server: &MockServer) -> Arc<ApiClient> {
        let config = Config {
            api_base_url: server.url("/api"),
            poll_interval: Duration::from_millis(20),
            poll_max_attempts: 50,
            ..Config::default()
        };
        Arc::new(ApiClient::new(config, Arc::new(SessionStore::in_memory())))
    }

    fn order_body(status: &str, with_payment: bool) -> serde_json::Value {
        let payment = if with_payment {
            json!({
                "bank_name": "Bank BSS",
                "account_number": "1234567890",
                "account_name": "PT BSS",
                "amount": 125000.0
            })
        } else {
            json!(null)
        };
        json!({
            "success": true,
            "data": {
                "id": "ord-1",
                "type": "single",
                "quantity": 5,
                "total_amount": 125000.0,
                "status": status,
                "payment": payment,
                "created_at": "2026-01-10T09:00:00Z"
            }
        })
    }

    fn pending_order() -> Order {
        serde_json::from_value(order_body("pending", true)["data"].clone()).unwrap()
    }

    #[tokio::test]
    async fn settles_as_paid_and_keeps_original_payment_instructions() {
        let server = MockServer::start_async().await;
        let mut pending = server.mock(|when, then| {
            when.method(GET).path("/api/orders/ord-1");
            then.status(200).json_body(order_body("pending", false));
        });

        let watcher = OrderWatcher::with_policy(api(&server), Duration::from_millis(20), 100);
        let handle = watcher.spawn(pending_order());

        tokio::time::sleep(Duration::from_millis(70)).await;
        pending.delete();
        let paid = server.mock(|when, then| {
            when.method(GET).path("/api/orders/ord-1");
            then.status(200).json_body(order_body("paid", false));
        });

        match handle.wait().await.unwrap() {
            PaymentOutcome::Paid(order) => {
                assert_eq!(order.status, OrderStatus::Paid);
                // Poll responses carried no payment block; the original one
                // must survive the merge.
                assert!(order.payment.is_some());
            }
            other => panic!("expected Paid, got {other:?}"),
        }
        assert_eq!(paid.hits(), 1);
    }

    #[tokio::test]
    async fn cancelled_order_closes_the_watch() {
        let server = MockServer::start_async().await;
        let mut pending = server.mock(|when, then| {
            when.method(GET).path("/api/orders/ord-1");
            then.status(200).json_body(order_body("pending", true));
        });

        let watcher = OrderWatcher::with_policy(api(&server), Duration::from_millis(20), 100);
        let handle = watcher.spawn(pending_order());

        tokio::time::sleep(Duration::from_millis(70)).await;
        pending.delete();
        server.mock(|when, then| {
            when.method(GET).path("/api/orders/ord-1");
            then.status(200).json_body(order_body("expired", true));
        });

        match handle.wait().await.unwrap() {
            PaymentOutcome::Closed(order) => assert_eq!(order.status, OrderStatus::Expired),
            other => panic!("expected Closed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn terminal_order_returns_without_polling() {
        let server = MockServer::start_async().await;
        let get_mock = server.mock(|when, then| {
            when.method(GET).path("/api/orders/ord-1");
            then.status(200).json_body(order_body("pending", true));
        });

        let mut order = pending_order();
        order.status = OrderStatus::Paid;

        let watcher = OrderWatcher::with_policy(api(&server), Duration::from_millis(20), 100);
        assert!(matches!(
            watcher.wait_for_settlement(order).await,
            PaymentOutcome::Paid(_)
        ));
        assert_eq!(get_mock.hits(), 0);
    }

    #[tokio::test]
    async fn exhausted_budget_times_out_with_the_pending_order() {
        let server = MockServer::start_async().await;
        let pending = server.mock(|when, then| {
            when.method(GET).path("/api/orders/ord-1");
            then.status(200).json_body(order_body("pending", true));
        });

        let watcher = OrderWatcher::with_policy(api(&server), Duration::from_millis(10), 4);
        match watcher.wait_for_settlement(pending_order()).await {
            PaymentOutcome::TimedOut(order) => assert_eq!(order.status, OrderStatus::Pending),
            other => panic!("expected TimedOut, got {other:?}"),
        }
        assert_eq!(pending.hits(), 4);
    }

    #[tokio::test]
    async fn poll_errors_consume_attempts_but_do_not_abort_the_watch() {
        let server = MockServer::start_async().await;
        let mut failing = server.mock(|when, then| {
            when.method(GET).path("/api/orders/ord-1");
            then.status(500).json_body(json!({
                "success": false,
                "error": { "code": "INTERNAL", "message": "database offline" }
            }));
        });

        let watcher = OrderWatcher::with_policy(api(&server), Duration::from_millis(10), 20);
        let handle = watcher.spawn(pending_order());

        tokio::time::sleep(Duration::from_millis(35)).await;
        failing.delete();
        server.mock(|when, then| {
            when.method(GET).path("/api/orders/ord-1");
            then.status(200).json_body(order_body("paid", true));
        });

        assert!(matches!(
            handle.wait().await.unwrap(),
            PaymentOutcome::Paid(_)
        ));
    }

    #[tokio::test]
    async fn cancelled_watch_stops_polling() {
        let server = MockServer::start_async().await;
        let get_mock = server.mock(|when, then| {
            when.method(GET).path("/api/orders/ord-1");
            then.status(200).json_body(order_body("pending", true));
        });

        let watcher = OrderWatcher::with_policy(api(&server), Duration::from_millis(50), 100);
        let handle = watcher.spawn(pending_order());
        handle.cancel();

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(get_mock.hits(), 0);
    }

    #[tokio::test]
    async fn purchase_creates_the_order_and_starts_the_watch() {
        let server = MockServer::start_async().await;
        let create = server.mock(|when, then| {
            when.method(POST)
                .path("/api/orders")
                .json_body(json!({ "type": "single", "quantity": 5 }));
            then.status(200).json_body(order_body("pending", true));
        });
        server.mock(|when, then| {
            when.method(GET).path("/api/orders/ord-1");
            then.status(200).json_body(order_body("paid", true));
        });

        let api = api(&server);
        let (order, handle) = purchase(&api, CreateOrderRequest::single(5))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.payment.is_some());
        create.assert();

        assert!(matches!(
            handle.wait().await.unwrap(),
            PaymentOutcome::Paid(_)
        ));
    }
}
