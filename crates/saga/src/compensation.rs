//! Shared compensating actions.

use tokio::sync::oneshot;

use common::ProductId;
use entities::{EntityDirectory, ProductCommand, ProductEntity};

/// Queues a stock restore and observes its outcome from a detached task.
///
/// The mailbox send is awaited so the restore sits in the product's queue
/// before the caller replies; the outcome itself is only logged. Restores
/// are unconditional on the product side, so a refusal here means the
/// product was never initialized.
pub(crate) async fn restore_stock(
    products: &EntityDirectory<ProductEntity>,
    product_id: ProductId,
    quantity: u32,
) {
    let (reply, response) = oneshot::channel();
    let product = products.resolve(product_id);

    if let Err(e) = product
        .send(ProductCommand::RestoreStock { quantity, reply })
        .await
    {
        tracing::error!(%product_id, quantity, error = %e, "failed to queue stock restore");
        return;
    }

    tokio::spawn(async move {
        match response.await {
            Ok(outcome) if outcome.success => {
                tracing::info!(
                    %product_id,
                    quantity,
                    current_stock = outcome.current_stock,
                    "stock restored"
                );
            }
            Ok(_) => {
                tracing::warn!(%product_id, quantity, "stock restore refused");
            }
            Err(_) => {
                tracing::warn!(%product_id, quantity, "stock restore reply dropped");
            }
        }
    });
}
