//! Podium - Prize Distribution Service
//!
//! This library wires the prize rule engine (`podium-rules`) to storage,
//! configuration and logging so a match-results pipeline can ask two
//! questions: which rule governs this match, and who gets paid what.
//!
//! # Architecture
//!
//! The crate follows a layered architecture:
//! - **Services**: selection, distribution and rule administration
//! - **Store**: the `RuleStore` trait with in-memory and PostgreSQL backends
//! - **Engine**: pure matching, payout and versioning logic in `podium-rules`

pub mod config;
pub mod constants;
pub mod db;
pub mod error;
pub mod services;
pub mod state;
pub mod store;
pub mod telemetry;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, AppResult};
pub use state::AppState;
