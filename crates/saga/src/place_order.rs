//! Order placement saga.
//!
//! Drives one inbound order through validation, product lookups, the
//! wallet debit, stock reductions, and the final order commit. The debit
//! happens before the reductions, so a partial reduction failure refunds
//! the wallet and restores exactly the reductions that were confirmed.

use std::time::{Duration, Instant};

use futures_util::future::join_all;
use serde::Deserialize;
use tokio::time::timeout;

use common::{Money, OrderId, ProductId, UserId};
use entities::{
    EntityDirectory, OrderCommand, OrderEntity, OrderItem, OrderSnapshot, ProductCommand,
    ProductEntity, StockResponse,
};

use crate::compensation::restore_stock;
use crate::error::SagaError;
use crate::services::{UserService, WalletService};

#[derive(Debug, Deserialize)]
struct RequestItem {
    product_id: i64,
    quantity: u32,
}

#[derive(Debug)]
struct ValidItem {
    product_id: ProductId,
    quantity: u32,
}

#[derive(Debug)]
struct ValidRequest {
    user_id: UserId,
    items: Vec<ValidItem>,
}

/// Validates the raw `POST /orders` body.
///
/// The reply messages are part of the API contract: a payload that is not
/// a JSON object, or an item of the wrong shape, answers the generic
/// `Invalid order data`; a missing `user_id` or an absent, empty, or
/// zero-quantity item list answers the specific variants.
fn parse_request(raw: &str) -> Result<ValidRequest, SagaError> {
    let payload: serde_json::Value = serde_json::from_str(raw)
        .map_err(|_| SagaError::InvalidRequest("Invalid order data".to_string()))?;

    let user_id = match payload.get("user_id") {
        None | Some(serde_json::Value::Null) => {
            return Err(SagaError::InvalidRequest(
                "Invalid order data: Missing user_id".to_string(),
            ));
        }
        Some(value) => value
            .as_i64()
            .ok_or_else(|| SagaError::InvalidRequest("Invalid order data".to_string()))?,
    };

    let raw_items = match payload.get("items") {
        Some(serde_json::Value::Array(items)) if !items.is_empty() => items,
        _ => {
            return Err(SagaError::InvalidRequest(
                "Invalid order data: Missing or invalid items".to_string(),
            ));
        }
    };

    let mut items = Vec::with_capacity(raw_items.len());
    for raw_item in raw_items {
        let item: RequestItem = serde_json::from_value(raw_item.clone())
            .map_err(|_| SagaError::InvalidRequest("Invalid order data".to_string()))?;
        if item.quantity == 0 {
            return Err(SagaError::InvalidRequest(
                "Invalid order data: Missing or invalid items".to_string(),
            ));
        }
        items.push(ValidItem {
            product_id: ProductId::new(item.product_id),
            quantity: item.quantity,
        });
    }

    Ok(ValidRequest {
        user_id: UserId::new(user_id),
        items,
    })
}

/// Orchestrates order placement across the product and order entities and
/// the wallet and user services.
pub struct PlaceOrderSaga<W, U> {
    products: EntityDirectory<ProductEntity>,
    orders: EntityDirectory<OrderEntity>,
    wallet: W,
    users: U,
    reply_timeout: Duration,
}

impl<W, U> PlaceOrderSaga<W, U>
where
    W: WalletService,
    U: UserService,
{
    /// Creates a new placement saga over the given directories and services.
    pub fn new(
        products: EntityDirectory<ProductEntity>,
        orders: EntityDirectory<OrderEntity>,
        wallet: W,
        users: U,
        reply_timeout: Duration,
    ) -> Self {
        Self {
            products,
            orders,
            wallet,
            users,
            reply_timeout,
        }
    }

    /// Runs the placement saga for one inbound order request.
    ///
    /// `raw_payload` is the untouched request body; validation happens
    /// here rather than at the HTTP boundary so malformed requests still
    /// produce the documented failure replies.
    #[tracing::instrument(skip(self, raw_payload), fields(%order_id, saga_id = %uuid::Uuid::new_v4()))]
    pub async fn execute(
        &self,
        order_id: OrderId,
        raw_payload: &str,
    ) -> Result<OrderSnapshot, SagaError> {
        metrics::counter!("place_order_sagas_total").increment(1);
        let started = Instant::now();

        let result = self.run(order_id, raw_payload).await;

        metrics::histogram!("place_order_duration_seconds").record(started.elapsed().as_secs_f64());
        match &result {
            Ok(snapshot) => {
                metrics::counter!("orders_placed_total").increment(1);
                tracing::info!(user_id = %snapshot.user_id, total = %snapshot.total_price, "order placed");
            }
            Err(reason) => {
                metrics::counter!("orders_rejected_total").increment(1);
                tracing::warn!(%reason, "order rejected");
            }
        }

        result
    }

    async fn run(&self, order_id: OrderId, raw_payload: &str) -> Result<OrderSnapshot, SagaError> {
        let request = parse_request(raw_payload)?;
        let user_id = request.user_id;
        let reply_timeout = self.reply_timeout;

        // Fan out one fetch per line item; the fan-in below is driven by
        // reply count, not arrival order.
        let fetches = request.items.iter().map(|item| {
            let product = self.products.resolve(item.product_id);
            async move {
                timeout(reply_timeout, product.ask(|reply| ProductCommand::GetInfo { reply })).await
            }
        });
        let records = join_all(fetches).await;

        // Every product must exist and cover its requested quantity before
        // any money or stock moves. The first violating line item decides
        // the reply.
        let mut total_cost = Money::zero();
        for (item, fetched) in request.items.iter().zip(records) {
            let record = fetched
                .map_err(|_| SagaError::PhaseTimeout {
                    phase: "product fetch",
                })??
                .ok_or(SagaError::ProductNotFound(item.product_id))?;

            if record.stock_quantity < item.quantity {
                return Err(SagaError::InsufficientStock(item.product_id));
            }
            total_cost += record.price.multiply(item.quantity);
        }

        let discount_applies = self.users.discount_available(user_id).await?;
        let final_cost = if discount_applies {
            total_cost.with_first_order_discount()
        } else {
            total_cost
        };

        // Debit before reducing stock; a refusal here ends the saga with
        // nothing to undo.
        self.wallet.debit(user_id, final_cost).await?;

        let reductions = request.items.iter().map(|item| {
            let product = self.products.resolve(item.product_id);
            let quantity = item.quantity;
            async move {
                matches!(
                    timeout(
                        reply_timeout,
                        product.ask(|reply| ProductCommand::ReduceStock { quantity, reply }),
                    )
                    .await,
                    Ok(Ok(StockResponse { success: true, .. }))
                )
            }
        });
        // Per-item outcomes, aligned with the request items. A timed-out
        // reduction counts as failed; its restore is skipped because the
        // reduction was never confirmed.
        let confirmed: Vec<bool> = join_all(reductions).await;

        if !confirmed.iter().all(|ok| *ok) {
            self.compensate(&request.items, &confirmed, user_id, final_cost)
                .await;
            return Err(SagaError::StockReductionFailed);
        }

        // All reductions confirmed. Consume the discount before the commit;
        // a failure to record it is logged and does not fail the order.
        if discount_applies {
            if let Err(e) = self.users.mark_discount_availed(user_id).await {
                tracing::warn!(%user_id, error = %e, "failed to record discount consumption");
            }
        }

        let items: Vec<OrderItem> = request
            .items
            .iter()
            .map(|item| OrderItem {
                id: order_id,
                product_id: item.product_id,
                quantity: item.quantity,
            })
            .collect();

        let order = self.orders.resolve(order_id);
        let placed = timeout(
            reply_timeout,
            order.ask(|reply| OrderCommand::Place {
                order_id,
                user_id,
                total_price: final_cost,
                items,
                reply,
            }),
        )
        .await
        .map_err(|_| SagaError::PhaseTimeout {
            phase: "order commit",
        })??;

        if placed.is_sentinel() {
            // The id maps to an order already in a terminal state. Undo
            // everything this saga changed.
            self.compensate(&request.items, &confirmed, user_id, final_cost)
                .await;
            return Err(SagaError::OrderNotPlaceable(order_id));
        }

        Ok(placed)
    }

    /// Refunds the debit and restores the reductions that were confirmed.
    ///
    /// Failures here are logged, never surfaced: the caller already has
    /// its terminal answer. Restores are queued before this returns and
    /// their outcomes are awaited by detached logging tasks.
    async fn compensate(
        &self,
        items: &[ValidItem],
        confirmed: &[bool],
        user_id: UserId,
        amount: Money,
    ) {
        metrics::counter!("saga_compensations_total").increment(1);
        tracing::warn!(%user_id, refund = %amount, "compensating failed placement");

        if let Err(e) = self.wallet.credit(user_id, amount).await {
            tracing::error!(%user_id, refund = %amount, error = %e, "compensating credit failed");
        }

        for (item, succeeded) in items.iter().zip(confirmed) {
            if *succeeded {
                restore_stock(&self.products, item.product_id, item.quantity).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason(raw: &str) -> String {
        parse_request(raw).unwrap_err().to_string()
    }

    #[test]
    fn test_valid_request_parses() {
        let parsed = parse_request(
            r#"{"user_id": 7, "items": [{"product_id": 101, "quantity": 2}]}"#,
        )
        .unwrap();

        assert_eq!(parsed.user_id, UserId::new(7));
        assert_eq!(parsed.items.len(), 1);
        assert_eq!(parsed.items[0].product_id, ProductId::new(101));
        assert_eq!(parsed.items[0].quantity, 2);
    }

    #[test]
    fn test_malformed_json_is_invalid_order_data() {
        assert_eq!(reason("not json"), "Invalid order data");
    }

    #[test]
    fn test_missing_user_id() {
        assert_eq!(
            reason(r#"{"items": [{"product_id": 101, "quantity": 1}]}"#),
            "Invalid order data: Missing user_id"
        );
        assert_eq!(
            reason(r#"{"user_id": null, "items": [{"product_id": 101, "quantity": 1}]}"#),
            "Invalid order data: Missing user_id"
        );
    }

    #[test]
    fn test_non_integer_user_id_is_invalid_order_data() {
        assert_eq!(
            reason(r#"{"user_id": "seven", "items": [{"product_id": 101, "quantity": 1}]}"#),
            "Invalid order data"
        );
    }

    #[test]
    fn test_missing_or_invalid_items() {
        assert_eq!(
            reason(r#"{"user_id": 7}"#),
            "Invalid order data: Missing or invalid items"
        );
        assert_eq!(
            reason(r#"{"user_id": 7, "items": "everything"}"#),
            "Invalid order data: Missing or invalid items"
        );
        assert_eq!(
            reason(r#"{"user_id": 7, "items": []}"#),
            "Invalid order data: Missing or invalid items"
        );
        assert_eq!(
            reason(r#"{"user_id": 7, "items": [{"product_id": 101, "quantity": 0}]}"#),
            "Invalid order data: Missing or invalid items"
        );
    }

    #[test]
    fn test_malformed_item_is_invalid_order_data() {
        assert_eq!(
            reason(r#"{"user_id": 7, "items": [{"quantity": 1}]}"#),
            "Invalid order data"
        );
        assert_eq!(
            reason(r#"{"user_id": 7, "items": [{"product_id": 101, "quantity": -2}]}"#),
            "Invalid order data"
        );
    }
}
