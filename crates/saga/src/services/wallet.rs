//! Wallet service trait, HTTP client, and in-memory implementation.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use common::{Money, UserId};

use crate::error::SagaError;

/// Trait for wallet debit and credit operations.
#[async_trait]
pub trait WalletService: Send + Sync {
    /// Debits `amount` from the user's wallet.
    ///
    /// A refusal by the wallet maps to [`SagaError::InsufficientBalance`];
    /// transport failures map to [`SagaError::WalletService`].
    async fn debit(&self, user_id: UserId, amount: Money) -> Result<(), SagaError>;

    /// Credits `amount` back to the user's wallet.
    async fn credit(&self, user_id: UserId, amount: Money) -> Result<(), SagaError>;
}

#[derive(Debug, Serialize)]
struct WalletAction {
    action: &'static str,
    amount: i64,
}

/// Wallet service backed by the external wallet HTTP API.
///
/// Both operations are `PUT {base}/wallets/{user_id}` with a body of
/// `{"action": "debit" | "credit", "amount": n}`. Any 2xx answer is
/// success; a non-2xx answer to a debit means the funds were refused.
#[derive(Debug, Clone)]
pub struct HttpWalletService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpWalletService {
    /// Creates a client against `base_url`, e.g. `http://localhost:8082`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SagaError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SagaError::WalletService(e.to_string()))?;
        let base_url: String = base_url.into();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn put_action(
        &self,
        user_id: UserId,
        action: &'static str,
        amount: Money,
    ) -> Result<bool, SagaError> {
        let url = format!("{}/wallets/{}", self.base_url, user_id);
        let response = self
            .client
            .put(&url)
            .json(&WalletAction {
                action,
                amount: amount.units(),
            })
            .send()
            .await
            .map_err(|e| SagaError::WalletService(e.to_string()))?;

        Ok(response.status().is_success())
    }
}

#[async_trait]
impl WalletService for HttpWalletService {
    async fn debit(&self, user_id: UserId, amount: Money) -> Result<(), SagaError> {
        if self.put_action(user_id, "debit", amount).await? {
            Ok(())
        } else {
            Err(SagaError::InsufficientBalance)
        }
    }

    async fn credit(&self, user_id: UserId, amount: Money) -> Result<(), SagaError> {
        if self.put_action(user_id, "credit", amount).await? {
            Ok(())
        } else {
            Err(SagaError::WalletService(format!(
                "credit refused for user {user_id}"
            )))
        }
    }
}

#[derive(Debug, Default)]
struct InMemoryWalletState {
    balances: HashMap<UserId, i64>,
    debit_count: usize,
    credit_count: usize,
    fail_on_debit: bool,
    fail_on_credit: bool,
}

/// In-memory wallet service for testing.
///
/// Debits require a sufficient seeded balance; credits always apply and
/// create the wallet if it does not exist yet.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWalletService {
    state: Arc<RwLock<InMemoryWalletState>>,
}

impl InMemoryWalletService {
    /// Creates a new in-memory wallet service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the user's balance, replacing any previous value.
    pub fn set_balance(&self, user_id: UserId, amount: Money) {
        self.state
            .write()
            .unwrap()
            .balances
            .insert(user_id, amount.units());
    }

    /// Returns the user's balance, zero if the wallet does not exist.
    pub fn balance(&self, user_id: UserId) -> Money {
        Money::new(
            self.state
                .read()
                .unwrap()
                .balances
                .get(&user_id)
                .copied()
                .unwrap_or(0),
        )
    }

    /// Configures the service to refuse debit calls.
    pub fn set_fail_on_debit(&self, fail: bool) {
        self.state.write().unwrap().fail_on_debit = fail;
    }

    /// Configures the service to fail credit calls.
    pub fn set_fail_on_credit(&self, fail: bool) {
        self.state.write().unwrap().fail_on_credit = fail;
    }

    /// Returns the number of successful debits.
    pub fn debit_count(&self) -> usize {
        self.state.read().unwrap().debit_count
    }

    /// Returns the number of successful credits.
    pub fn credit_count(&self) -> usize {
        self.state.read().unwrap().credit_count
    }
}

#[async_trait]
impl WalletService for InMemoryWalletService {
    async fn debit(&self, user_id: UserId, amount: Money) -> Result<(), SagaError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_debit {
            return Err(SagaError::InsufficientBalance);
        }

        let balance = state.balances.entry(user_id).or_insert(0);
        if *balance < amount.units() {
            return Err(SagaError::InsufficientBalance);
        }

        *balance -= amount.units();
        state.debit_count += 1;
        Ok(())
    }

    async fn credit(&self, user_id: UserId, amount: Money) -> Result<(), SagaError> {
        let mut state = self.state.write().unwrap();

        if state.fail_on_credit {
            return Err(SagaError::WalletService("credit unavailable".to_string()));
        }

        *state.balances.entry(user_id).or_insert(0) += amount.units();
        state.credit_count += 1;
        Ok(())
    }
}
