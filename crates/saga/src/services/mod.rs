//! External service traits, HTTP clients, and in-memory implementations.

pub mod user;
pub mod wallet;

pub use user::{HttpUserService, InMemoryUserService, UserService};
pub use wallet::{HttpWalletService, InMemoryWalletService, WalletService};
