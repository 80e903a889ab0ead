//! HTTP gateway with observability for the marketplace order system.
//!
//! Provides REST endpoints for order placement, cancellation, delivery
//! updates, and product lookups, with structured logging (tracing) and
//! Prometheus metrics.

pub mod catalog;
pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;
use std::sync::atomic::AtomicI64;
use std::time::Duration;

use axum::Router;
use axum::routing::{delete, get, post, put};
use entities::{EntityDirectory, OrderEntity, ProductEntity};
use metrics_exporter_prometheus::PrometheusHandle;
use saga::{
    CancelOrderSaga, InMemoryUserService, InMemoryWalletService, PlaceOrderSaga, UserService,
    WalletService,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use routes::orders::AppState;

/// Boundary timeout for every request, covering all saga phases behind it.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<W, U>(state: Arc<AppState<W, U>>, metrics_handle: PrometheusHandle) -> Router
where
    W: WalletService + 'static,
    U: UserService + 'static,
{
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::render))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/orders", post(routes::orders::create::<W, U>))
        .route("/orders/{id}", get(routes::orders::get::<W, U>))
        .route("/orders/{id}", put(routes::orders::update::<W, U>))
        .route("/orders/{id}", delete(routes::orders::cancel::<W, U>))
        .route("/products", get(routes::products::list::<W, U>))
        .route("/products/{id}", get(routes::products::get::<W, U>))
        .route("/marketplace", delete(routes::marketplace::reset::<W, U>))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over the given directories and services.
pub fn create_state<W, U>(
    products: EntityDirectory<ProductEntity>,
    orders: EntityDirectory<OrderEntity>,
    wallet: W,
    users: U,
    reply_timeout: Duration,
) -> Arc<AppState<W, U>>
where
    W: WalletService + Clone + 'static,
    U: UserService + Clone + 'static,
{
    let place_saga = PlaceOrderSaga::new(
        products.clone(),
        orders.clone(),
        wallet.clone(),
        users.clone(),
        reply_timeout,
    );
    let cancel_saga = CancelOrderSaga::new(orders.clone(), products.clone(), wallet, reply_timeout);

    Arc::new(AppState {
        place_saga,
        cancel_saga,
        products,
        orders,
        next_order_id: AtomicI64::new(1),
    })
}

/// Creates application state wired to in-memory wallet and user services,
/// returning the service handles for seeding and inspection.
pub fn create_default_state() -> (
    Arc<AppState<InMemoryWalletService, InMemoryUserService>>,
    InMemoryWalletService,
    InMemoryUserService,
) {
    let wallet = InMemoryWalletService::new();
    let users = InMemoryUserService::new();
    let state = create_state(
        EntityDirectory::new(),
        EntityDirectory::new(),
        wallet.clone(),
        users.clone(),
        Duration::from_secs(5),
    );

    (state, wallet, users)
}
