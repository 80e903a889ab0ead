//! Order lifecycle endpoints.

use std::sync::Arc;
use std::sync::atomic::{AtomicI64, Ordering};

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::OrderId;
use entities::{EntityDirectory, OrderCommand, OrderEntity, OrderSnapshot, ProductEntity};
use saga::{CancelOrderSaga, PlaceOrderSaga, UserService, WalletService};
use serde::Serialize;

use crate::error::ApiError;

/// Shared application state accessible from all handlers.
pub struct AppState<W, U> {
    pub place_saga: PlaceOrderSaga<W, U>,
    pub cancel_saga: CancelOrderSaga<W>,
    pub products: EntityDirectory<ProductEntity>,
    pub orders: EntityDirectory<OrderEntity>,
    pub next_order_id: AtomicI64,
}

impl<W, U> AppState<W, U> {
    /// Draws the next order id from the gateway counter.
    pub fn allocate_order_id(&self) -> OrderId {
        OrderId::new(self.next_order_id.fetch_add(1, Ordering::SeqCst))
    }
}

/// Acknowledgement body for cancellation and reset endpoints.
#[derive(Serialize)]
pub struct GeneralResponse {
    pub success: bool,
    pub message: String,
}

/// POST /orders — allocate an order id and run the placement saga.
///
/// The body is handed to the saga untouched; payload validation and its
/// reply messages live there. Success answers 201 with the placed order.
#[tracing::instrument(skip(state, body))]
pub async fn create<W, U>(
    State(state): State<Arc<AppState<W, U>>>,
    body: String,
) -> Result<(StatusCode, Json<OrderSnapshot>), ApiError>
where
    W: WalletService + 'static,
    U: UserService + 'static,
{
    let order_id = state.allocate_order_id();
    let snapshot = state.place_saga.execute(order_id, &body).await?;

    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// GET /orders/:id — read an order snapshot.
#[tracing::instrument(skip(state))]
pub async fn get<W, U>(
    State(state): State<Arc<AppState<W, U>>>,
    Path(id): Path<i64>,
) -> Result<Json<OrderSnapshot>, ApiError>
where
    W: WalletService + 'static,
    U: UserService + 'static,
{
    let snapshot = state
        .orders
        .resolve(OrderId::new(id))
        .ask(|reply| OrderCommand::Get { reply })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;

    if snapshot.is_sentinel() {
        return Err(ApiError::NotFound("Order not found".to_string()));
    }

    Ok(Json(snapshot))
}

/// PUT /orders/:id — update an order; only the delivery transition is
/// recognized, driven by a `DELIVERED` marker anywhere in the body.
#[tracing::instrument(skip(state, body))]
pub async fn update<W, U>(
    State(state): State<Arc<AppState<W, U>>>,
    Path(id): Path<i64>,
    body: String,
) -> Result<Json<OrderSnapshot>, ApiError>
where
    W: WalletService + 'static,
    U: UserService + 'static,
{
    let order = state.orders.resolve(OrderId::new(id));

    let current = order
        .ask(|reply| OrderCommand::Get { reply })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if current.is_sentinel() {
        return Err(ApiError::NotFound("Order not found".to_string()));
    }

    let updated = order
        .ask(|reply| OrderCommand::Update {
            status_hint: body,
            reply,
        })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if updated.is_sentinel() {
        return Err(ApiError::BadRequest("Invalid order data".to_string()));
    }

    Ok(Json(updated))
}

/// DELETE /orders/:id — cancel an order and run its compensations.
#[tracing::instrument(skip(state))]
pub async fn cancel<W, U>(
    State(state): State<Arc<AppState<W, U>>>,
    Path(id): Path<i64>,
) -> (StatusCode, Json<GeneralResponse>)
where
    W: WalletService + 'static,
    U: UserService + 'static,
{
    match state.cancel_saga.execute(OrderId::new(id)).await {
        Ok(cancelled) => (
            StatusCode::OK,
            Json(GeneralResponse {
                success: true,
                message: format!("Order {} cancelled successfully", cancelled.order_id),
            }),
        ),
        Err(reason) => {
            tracing::warn!(order_id = id, %reason, "cancellation rejected");
            (
                StatusCode::BAD_REQUEST,
                Json(GeneralResponse {
                    success: false,
                    message: "Order cancellation failed".to_string(),
                }),
            )
        }
    }
}
