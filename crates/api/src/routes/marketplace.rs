//! Marketplace-wide administrative endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use saga::{UserService, WalletService};

use crate::routes::orders::{AppState, GeneralResponse};

/// DELETE /marketplace — cancel every known order.
///
/// The acknowledgement does not wait for the cancellations: each one runs
/// as a detached saga, and orders that are not in PLACED are skipped by
/// their own saga's refusal.
#[tracing::instrument(skip(state))]
pub async fn reset<W, U>(
    State(state): State<Arc<AppState<W, U>>>,
) -> (StatusCode, Json<GeneralResponse>)
where
    W: WalletService + 'static,
    U: UserService + 'static,
{
    let order_ids = state.orders.known_ids();
    metrics::counter!("global_resets_total").increment(1);
    tracing::info!(orders = order_ids.len(), "global reset requested");

    for order_id in order_ids {
        let state = state.clone();
        tokio::spawn(async move {
            if let Err(reason) = state.cancel_saga.execute(order_id).await {
                tracing::debug!(%order_id, %reason, "global reset skipped order");
            }
        });
    }

    (
        StatusCode::OK,
        Json(GeneralResponse {
            success: true,
            message: "Global reset: Cancelled all orders".to_string(),
        }),
    )
}
