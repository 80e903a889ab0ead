//! Order lifecycle entity.

use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

use common::{Money, OrderId, UserId};

use crate::directory::Entity;

/// The lifecycle status of an order.
///
/// Status transitions:
/// ```text
/// Unplaced ──► Placed ──┬──► Delivered
///                │ ▲    └──► Cancelled
///                └─┘ (re-place overwrites)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    /// No order has been placed under this id yet.
    #[default]
    Unplaced,

    /// Order committed: stock reduced and wallet debited.
    Placed,

    /// Order cancelled, compensations issued (terminal state).
    Cancelled,

    /// Order delivered (terminal state).
    Delivered,
}

impl OrderStatus {
    /// Returns true if order data can be (over)written in this status.
    pub fn can_place(&self) -> bool {
        matches!(self, OrderStatus::Unplaced | OrderStatus::Placed)
    }

    /// Returns true if the order can be cancelled in this status.
    pub fn can_cancel(&self) -> bool {
        matches!(self, OrderStatus::Placed)
    }

    /// Returns true if the order can be marked delivered in this status.
    pub fn can_deliver(&self) -> bool {
        matches!(self, OrderStatus::Placed)
    }

    /// Returns true if this is a terminal status (no further transitions).
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Cancelled | OrderStatus::Delivered)
    }

    /// Returns the status name as it appears on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Unplaced => "UNPLACED",
            OrderStatus::Placed => "PLACED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Delivered => "DELIVERED",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One line item of a placed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Carries the owning order's id on the wire.
    pub id: OrderId,

    /// The product ordered.
    pub product_id: common::ProductId,

    /// Units ordered, always positive.
    pub quantity: u32,
}

/// Full read model of an order, as replied to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    /// The order identifier, `-1` in the sentinel reply.
    pub order_id: OrderId,

    /// The ordering user.
    pub user_id: UserId,

    /// Amount actually charged, after any discount.
    pub total_price: Money,

    /// Current lifecycle status.
    pub status: OrderStatus,

    /// Line items of the order.
    pub items: Vec<OrderItem>,
}

impl OrderSnapshot {
    /// The reserved "no such order / not applicable" reply.
    pub fn sentinel() -> Self {
        Self {
            order_id: OrderId::SENTINEL,
            user_id: UserId::new(-1),
            total_price: Money::zero(),
            status: OrderStatus::Unplaced,
            items: Vec::new(),
        }
    }

    /// Returns true if this is the reserved sentinel reply.
    pub fn is_sentinel(&self) -> bool {
        self.order_id.is_sentinel()
    }
}

/// Commands understood by an order entity.
#[derive(Debug)]
pub enum OrderCommand {
    /// Commits the order data and moves to `Placed`. Valid while unplaced
    /// or placed (overwrite); terminal states answer the sentinel.
    Place {
        order_id: OrderId,
        user_id: UserId,
        total_price: Money,
        items: Vec<OrderItem>,
        reply: oneshot::Sender<OrderSnapshot>,
    },

    /// Reads the current snapshot; a never-placed id answers the sentinel.
    Get { reply: oneshot::Sender<OrderSnapshot> },

    /// Marks a placed order delivered when the hint text names that status;
    /// any other combination answers the sentinel.
    Update {
        status_hint: String,
        reply: oneshot::Sender<OrderSnapshot>,
    },

    /// Cancels a placed order, answering the snapshot with the items and
    /// total that compensation needs; any other status answers the sentinel.
    Cancel { reply: oneshot::Sender<OrderSnapshot> },
}

/// Lifecycle state for a single order id.
#[derive(Debug)]
pub struct OrderEntity {
    order_id: OrderId,
    user_id: UserId,
    total_price: Money,
    status: OrderStatus,
    items: Vec<OrderItem>,
}

impl Default for OrderEntity {
    fn default() -> Self {
        Self {
            order_id: OrderId::SENTINEL,
            user_id: UserId::new(-1),
            total_price: Money::zero(),
            status: OrderStatus::Unplaced,
            items: Vec::new(),
        }
    }
}

impl OrderEntity {
    fn snapshot(&self) -> OrderSnapshot {
        OrderSnapshot {
            order_id: self.order_id,
            user_id: self.user_id,
            total_price: self.total_price,
            status: self.status,
            items: self.items.clone(),
        }
    }
}

impl Entity for OrderEntity {
    type Id = OrderId;
    type Command = OrderCommand;
    const KIND: &'static str = "order";

    fn handle(&mut self, cmd: OrderCommand) {
        match cmd {
            OrderCommand::Place {
                order_id,
                user_id,
                total_price,
                items,
                reply,
            } => {
                if self.status.can_place() {
                    self.order_id = order_id;
                    self.user_id = user_id;
                    self.total_price = total_price;
                    self.items = items;
                    self.status = OrderStatus::Placed;
                    tracing::info!(%order_id, %user_id, total = %total_price, "order placed");
                    let _ = reply.send(self.snapshot());
                } else {
                    tracing::warn!(%order_id, status = %self.status, "place rejected");
                    let _ = reply.send(OrderSnapshot::sentinel());
                }
            }
            OrderCommand::Get { reply } => {
                let snapshot = if self.status == OrderStatus::Unplaced {
                    OrderSnapshot::sentinel()
                } else {
                    self.snapshot()
                };
                let _ = reply.send(snapshot);
            }
            OrderCommand::Update { status_hint, reply } => {
                if self.status.can_deliver()
                    && status_hint.contains(OrderStatus::Delivered.as_str())
                {
                    self.status = OrderStatus::Delivered;
                    tracing::info!(order_id = %self.order_id, "order delivered");
                    let _ = reply.send(self.snapshot());
                } else {
                    let _ = reply.send(OrderSnapshot::sentinel());
                }
            }
            OrderCommand::Cancel { reply } => {
                if self.status.can_cancel() {
                    self.status = OrderStatus::Cancelled;
                    tracing::info!(order_id = %self.order_id, "order cancelled");
                    let _ = reply.send(self.snapshot());
                } else {
                    tracing::debug!(
                        order_id = %self.order_id,
                        status = %self.status,
                        "cancel rejected"
                    );
                    let _ = reply.send(OrderSnapshot::sentinel());
                }
            }
        }
    }
}
