//! Saga error types.

use common::{OrderId, ProductId};
use entities::DirectoryError;
use thiserror::Error;

/// Errors that terminate a saga.
///
/// Every variant renders as the failure reason returned to the caller.
/// Compensation failures never surface here; they are logged and the saga
/// still reports its original outcome.
#[derive(Debug, Error)]
pub enum SagaError {
    /// The order payload failed validation; nothing was mutated.
    #[error("{0}")]
    InvalidRequest(String),

    /// A referenced product has never been initialized.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// A product cannot cover the requested quantity.
    #[error("Insufficient stock for product {0}")]
    InsufficientStock(ProductId),

    /// The wallet refused the debit.
    #[error("Insufficient wallet balance")]
    InsufficientBalance,

    /// Some stock reductions failed after the debit; the wallet was
    /// refunded and the reductions that applied were restored.
    #[error("Stock reduction failed, order cancelled")]
    StockReductionFailed,

    /// The order entity refused the commit because the order is already
    /// in a terminal state.
    #[error("Order {0} cannot be placed")]
    OrderNotPlaceable(OrderId),

    /// The order is unknown or not in a cancellable state.
    #[error("Order {0} cannot be cancelled")]
    OrderNotCancellable(OrderId),

    /// Wallet service error.
    #[error("Wallet service error: {0}")]
    WalletService(String),

    /// User service error.
    #[error("User service error: {0}")]
    UserService(String),

    /// An entity mailbox was closed or a reply was dropped.
    #[error("Entity error: {0}")]
    Entity(#[from] DirectoryError),

    /// A saga phase did not answer within the reply timeout.
    #[error("Saga abandoned: {phase} timed out")]
    PhaseTimeout { phase: &'static str },
}

impl SagaError {
    /// True when the failure happened before any stock or wallet mutation,
    /// so no compensation was required.
    pub fn is_pre_commit(&self) -> bool {
        matches!(
            self,
            SagaError::InvalidRequest(_)
                | SagaError::ProductNotFound(_)
                | SagaError::InsufficientStock(_)
                | SagaError::InsufficientBalance
        )
    }
}

/// Convenience type alias for saga results.
pub type Result<T> = std::result::Result<T, SagaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_match_reply_contract() {
        assert_eq!(
            SagaError::InvalidRequest("Invalid order data: Missing user_id".to_string())
                .to_string(),
            "Invalid order data: Missing user_id"
        );
        assert_eq!(
            SagaError::InsufficientStock(ProductId::new(102)).to_string(),
            "Insufficient stock for product 102"
        );
        assert_eq!(
            SagaError::InsufficientBalance.to_string(),
            "Insufficient wallet balance"
        );
        assert_eq!(
            SagaError::StockReductionFailed.to_string(),
            "Stock reduction failed, order cancelled"
        );
    }

    #[test]
    fn test_pre_commit_classification() {
        assert!(SagaError::InsufficientBalance.is_pre_commit());
        assert!(SagaError::ProductNotFound(ProductId::new(7)).is_pre_commit());
        assert!(!SagaError::StockReductionFailed.is_pre_commit());
        assert!(!SagaError::OrderNotCancellable(OrderId::new(3)).is_pre_commit());
    }
}
