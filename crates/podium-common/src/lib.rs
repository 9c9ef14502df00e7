//! Common types and errors shared by the Podium prize engine crates.

pub mod error;
pub mod types;

pub use error::{PrizeError, PrizeResult};
pub use types::*;
