//! Business logic services

pub mod payout_service;
pub mod rule_service;

pub use payout_service::{PayoutPlan, PayoutService};
pub use rule_service::RuleService;
