//! Order cancellation saga.
//!
//! Cancellation is entity-first: the order transitions to CANCELLED and
//! only then do the compensations run, using the items and total captured
//! in the cancelled snapshot. Stock restores are queued per line item and
//! the wallet credit covers the exact amount the placement debited.

use std::time::Duration;

use tokio::time::timeout;

use common::OrderId;
use entities::{EntityDirectory, OrderCommand, OrderEntity, OrderSnapshot, ProductEntity};

use crate::compensation::restore_stock;
use crate::error::SagaError;
use crate::services::WalletService;

/// Orchestrates order cancellation across the order and product entities
/// and the wallet service.
pub struct CancelOrderSaga<W> {
    orders: EntityDirectory<OrderEntity>,
    products: EntityDirectory<ProductEntity>,
    wallet: W,
    reply_timeout: Duration,
}

impl<W> CancelOrderSaga<W>
where
    W: WalletService,
{
    /// Creates a new cancellation saga over the given directories and wallet.
    pub fn new(
        orders: EntityDirectory<OrderEntity>,
        products: EntityDirectory<ProductEntity>,
        wallet: W,
        reply_timeout: Duration,
    ) -> Self {
        Self {
            orders,
            products,
            wallet,
            reply_timeout,
        }
    }

    /// Cancels one order and runs its compensations.
    ///
    /// Succeeds only for orders currently in PLACED; unknown ids and
    /// terminal orders answer [`SagaError::OrderNotCancellable`].
    #[tracing::instrument(skip(self), fields(%order_id, saga_id = %uuid::Uuid::new_v4()))]
    pub async fn execute(&self, order_id: OrderId) -> Result<OrderSnapshot, SagaError> {
        metrics::counter!("cancel_order_sagas_total").increment(1);

        let order = self.orders.resolve(order_id);
        let cancelled = timeout(
            self.reply_timeout,
            order.ask(|reply| OrderCommand::Cancel { reply }),
        )
        .await
        .map_err(|_| SagaError::PhaseTimeout {
            phase: "order cancel",
        })??;

        if cancelled.is_sentinel() {
            tracing::warn!("cancellation refused");
            return Err(SagaError::OrderNotCancellable(order_id));
        }

        // The snapshot carries everything the compensations need. Restores
        // are queued before this returns; the credit failure is logged only
        // because the order is already CANCELLED.
        for item in &cancelled.items {
            restore_stock(&self.products, item.product_id, item.quantity).await;
        }
        if let Err(e) = self
            .wallet
            .credit(cancelled.user_id, cancelled.total_price)
            .await
        {
            tracing::error!(
                user_id = %cancelled.user_id,
                refund = %cancelled.total_price,
                error = %e,
                "cancellation credit failed"
            );
        }

        metrics::counter!("orders_cancelled_total").increment(1);
        tracing::info!(
            user_id = %cancelled.user_id,
            refund = %cancelled.total_price,
            "order cancelled"
        );

        Ok(cancelled)
    }
}
