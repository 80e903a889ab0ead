//! Product stock ledger entity.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use common::{Money, ProductId};

use crate::directory::Entity;

/// Catalog record and live stock for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// The product identifier.
    pub id: ProductId,

    /// Human-readable product name.
    pub name: String,

    /// Free-form product description.
    pub description: String,

    /// Unit price in whole currency units, never negative.
    pub price: Money,

    /// Units on hand.
    pub stock_quantity: u32,
}

/// Outcome of a stock mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockResponse {
    /// Whether the mutation applied.
    pub success: bool,

    /// Stock on hand after the command was handled.
    pub current_stock: u32,
}

/// Commands understood by a product entity.
#[derive(Debug)]
pub enum ProductCommand {
    /// Installs the catalog record. One-time: repeats are rejected.
    Initialize {
        record: ProductRecord,
        reply: oneshot::Sender<bool>,
    },

    /// Reads the current record, `None` until initialized.
    GetInfo {
        reply: oneshot::Sender<Option<ProductRecord>>,
    },

    /// Decrements stock when enough is on hand, otherwise reports failure
    /// and leaves the ledger untouched. No partial fills.
    ReduceStock {
        quantity: u32,
        reply: oneshot::Sender<StockResponse>,
    },

    /// Increments stock unconditionally. This is the compensation primitive:
    /// it must not fail on an initialized product.
    RestoreStock {
        quantity: u32,
        reply: oneshot::Sender<StockResponse>,
    },
}

/// Stock ledger for a single product id.
///
/// Uninitialized until the first `Initialize`. All stock rules live in
/// `handle`; the directory guarantees commands for one id apply one at a
/// time, so reduce can check and decrement without any lock.
#[derive(Debug, Default)]
pub struct ProductEntity {
    record: Option<ProductRecord>,
}

impl Entity for ProductEntity {
    type Id = ProductId;
    type Command = ProductCommand;
    const KIND: &'static str = "product";

    fn handle(&mut self, cmd: ProductCommand) {
        match cmd {
            ProductCommand::Initialize { record, reply } => {
                let accepted = self.record.is_none();
                if accepted {
                    tracing::info!(
                        product_id = %record.id,
                        stock = record.stock_quantity,
                        "product initialized"
                    );
                    self.record = Some(record);
                } else {
                    tracing::warn!(product_id = %record.id, "re-initialization rejected");
                }
                let _ = reply.send(accepted);
            }
            ProductCommand::GetInfo { reply } => {
                let _ = reply.send(self.record.clone());
            }
            ProductCommand::ReduceStock { quantity, reply } => {
                let response = match self.record.as_mut() {
                    Some(record) if record.stock_quantity >= quantity => {
                        record.stock_quantity -= quantity;
                        tracing::debug!(
                            product_id = %record.id,
                            quantity,
                            remaining = record.stock_quantity,
                            "stock reduced"
                        );
                        StockResponse {
                            success: true,
                            current_stock: record.stock_quantity,
                        }
                    }
                    Some(record) => StockResponse {
                        success: false,
                        current_stock: record.stock_quantity,
                    },
                    None => StockResponse {
                        success: false,
                        current_stock: 0,
                    },
                };
                let _ = reply.send(response);
            }
            ProductCommand::RestoreStock { quantity, reply } => {
                let response = match self.record.as_mut() {
                    Some(record) => {
                        record.stock_quantity = record.stock_quantity.saturating_add(quantity);
                        tracing::debug!(
                            product_id = %record.id,
                            quantity,
                            current = record.stock_quantity,
                            "stock restored"
                        );
                        StockResponse {
                            success: true,
                            current_stock: record.stock_quantity,
                        }
                    }
                    None => {
                        tracing::warn!(quantity, "restore on uninitialized product");
                        StockResponse {
                            success: false,
                            current_stock: 0,
                        }
                    }
                };
                let _ = reply.send(response);
            }
        }
    }
}
