//! Per-id serialized entities for the marketplace.
//!
//! Every product and every order lives behind its own mailbox: one tokio
//! task per live id drains a private FIFO queue, so commands against the
//! same id never interleave while distinct ids proceed concurrently. The
//! [`EntityDirectory`] resolves ids to mailbox handles, creating entity
//! state lazily on first reference.
//!
//! Request/reply uses explicit `oneshot` channels carried inside commands;
//! there is no shared mutable state and no locking inside an entity.

pub mod directory;
pub mod order;
pub mod product;

pub use directory::{DirectoryError, Entity, EntityDirectory, EntityRef};
pub use order::{OrderCommand, OrderEntity, OrderItem, OrderSnapshot, OrderStatus};
pub use product::{ProductCommand, ProductEntity, ProductRecord, StockResponse};
