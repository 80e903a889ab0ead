//! Product catalog endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use common::ProductId;
use entities::{ProductCommand, ProductRecord};
use futures_util::future::join_all;
use saga::{UserService, WalletService};

use crate::error::ApiError;
use crate::routes::orders::AppState;

/// GET /products — list every initialized product, ordered by id.
#[tracing::instrument(skip(state))]
pub async fn list<W, U>(
    State(state): State<Arc<AppState<W, U>>>,
) -> Result<Json<Vec<ProductRecord>>, ApiError>
where
    W: WalletService + 'static,
    U: UserService + 'static,
{
    let fetches = state.products.known_ids().into_iter().map(|id| {
        let product = state.products.resolve(id);
        async move { product.ask(|reply| ProductCommand::GetInfo { reply }).await }
    });

    // Ids resolved by a lookup that never got a catalog record answer
    // `None` and are skipped.
    let mut records = Vec::new();
    for fetched in join_all(fetches).await {
        if let Some(record) = fetched.map_err(|e| ApiError::Internal(e.to_string()))? {
            records.push(record);
        }
    }

    Ok(Json(records))
}

/// GET /products/:id — read one product record.
#[tracing::instrument(skip(state))]
pub async fn get<W, U>(
    State(state): State<Arc<AppState<W, U>>>,
    Path(id): Path<i64>,
) -> Result<Json<ProductRecord>, ApiError>
where
    W: WalletService + 'static,
    U: UserService + 'static,
{
    let record = state
        .products
        .resolve(ProductId::new(id))
        .ask(|reply| ProductCommand::GetInfo { reply })
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(record))
}
