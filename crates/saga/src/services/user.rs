//! User service trait, HTTP client, and in-memory implementation.
//!
//! The user service is the authority for the one-time first-order
//! discount: a user whose record carries `discount_availed = true` has
//! already used it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use common::UserId;

use crate::error::SagaError;

/// Trait for first-order discount lookups and updates.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Returns true if the user's one-time discount is still available.
    async fn discount_available(&self, user_id: UserId) -> Result<bool, SagaError>;

    /// Records that the user's discount has been consumed.
    async fn mark_discount_availed(&self, user_id: UserId) -> Result<(), SagaError>;
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    discount_availed: bool,
}

#[derive(Debug, Serialize)]
struct UserUpdate {
    id: i64,
    discount_availed: bool,
}

/// User service backed by the external user HTTP API.
///
/// `GET {base}/users/{id}` answers 200 with the user record or 404 for an
/// unknown user; an unknown user still has the discount available.
/// `PUT {base}/users` upserts the record with `discount_availed` set.
#[derive(Debug, Clone)]
pub struct HttpUserService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpUserService {
    /// Creates a client against `base_url`, e.g. `http://localhost:8080`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, SagaError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SagaError::UserService(e.to_string()))?;
        let base_url: String = base_url.into();

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl UserService for HttpUserService {
    async fn discount_available(&self, user_id: UserId) -> Result<bool, SagaError> {
        let url = format!("{}/users/{}", self.base_url, user_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SagaError::UserService(e.to_string()))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(true);
        }
        if !response.status().is_success() {
            return Err(SagaError::UserService(format!(
                "user lookup answered {}",
                response.status()
            )));
        }

        let record: UserRecord = response
            .json()
            .await
            .map_err(|e| SagaError::UserService(e.to_string()))?;
        Ok(!record.discount_availed)
    }

    async fn mark_discount_availed(&self, user_id: UserId) -> Result<(), SagaError> {
        let url = format!("{}/users", self.base_url);
        let response = self
            .client
            .put(&url)
            .json(&UserUpdate {
                id: user_id.get(),
                discount_availed: true,
            })
            .send()
            .await
            .map_err(|e| SagaError::UserService(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(SagaError::UserService(format!(
                "user update answered {}",
                response.status()
            )))
        }
    }
}

#[derive(Debug, Default)]
struct InMemoryUserState {
    discount_availed: HashMap<UserId, bool>,
    mark_count: usize,
    fail_on_lookup: bool,
}

/// In-memory user service for testing.
///
/// Unknown users behave like the HTTP service's 404: the discount is
/// still available.
#[derive(Debug, Clone, Default)]
pub struct InMemoryUserService {
    state: Arc<RwLock<InMemoryUserState>>,
}

impl InMemoryUserService {
    /// Creates a new in-memory user service.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the user's discount flag.
    pub fn set_discount_availed(&self, user_id: UserId, availed: bool) {
        self.state
            .write()
            .unwrap()
            .discount_availed
            .insert(user_id, availed);
    }

    /// Returns true if the user's discount has been consumed.
    pub fn discount_availed(&self, user_id: UserId) -> bool {
        self.state
            .read()
            .unwrap()
            .discount_availed
            .get(&user_id)
            .copied()
            .unwrap_or(false)
    }

    /// Configures the service to fail lookup calls.
    pub fn set_fail_on_lookup(&self, fail: bool) {
        self.state.write().unwrap().fail_on_lookup = fail;
    }

    /// Returns the number of successful mark calls.
    pub fn mark_count(&self) -> usize {
        self.state.read().unwrap().mark_count
    }
}

#[async_trait]
impl UserService for InMemoryUserService {
    async fn discount_available(&self, user_id: UserId) -> Result<bool, SagaError> {
        let state = self.state.read().unwrap();

        if state.fail_on_lookup {
            return Err(SagaError::UserService("user lookup failed".to_string()));
        }

        Ok(!state.discount_availed.get(&user_id).copied().unwrap_or(false))
    }

    async fn mark_discount_availed(&self, user_id: UserId) -> Result<(), SagaError> {
        let mut state = self.state.write().unwrap();
        state.discount_availed.insert(user_id, true);
        state.mark_count += 1;
        Ok(())
    }
}
