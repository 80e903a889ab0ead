//! Saga pattern implementation for marketplace orders.
//!
//! This crate provides the sagas that orchestrate multi-step order
//! operations with compensating actions on failure.
//!
//! The placement saga follows these steps:
//! 1. Validate the raw order payload
//! 2. Fetch every referenced product and check stock and cost
//! 3. Apply the one-time first-order discount
//! 4. Debit the wallet
//! 5. Reduce stock per line item
//! 6. Commit the order entity
//!
//! If any stock reduction fails after the debit, the wallet is refunded
//! and the reductions that were confirmed are restored. The cancellation
//! saga runs the same compensations from a cancelled order's snapshot.

pub mod cancel_order;
mod compensation;
pub mod error;
pub mod place_order;
pub mod services;

pub use cancel_order::CancelOrderSaga;
pub use error::SagaError;
pub use place_order::PlaceOrderSaga;
pub use services::{
    HttpUserService, HttpWalletService, InMemoryUserService, InMemoryWalletService, UserService,
    WalletService,
};
