//! Shared types for the marketplace service.
//!
//! Typed identifiers for products, orders, and users, plus an integer
//! [`Money`] type with the first-order discount rule. Every other crate in
//! the workspace builds on these.

pub mod types;

pub use types::{Money, OrderId, ProductId, UserId};
