//! Prize distribution rule engine.
//!
//! Rule applicability is expressed with the Specification Pattern: each
//! matching criterion is a small predicate over a [`rule::PrizeRule`], and the
//! criteria for a match are combined with AND.
//!
//! # Example
//!
//! ```ignore
//! use podium_rules::prelude::*;
//!
//! let rule = RuleMatcher::new().select_required(&rules, &ctx)?;
//! let distribution = DistributionCalculator::new().compute(rule, &ctx, &participants)?;
//! ```
//!
//! Everything in this crate is synchronous and side-effect free. Loading rules
//! and persisting edits is left to the caller.

pub mod context;
pub mod criteria;
pub mod distribution;
pub mod matcher;
pub mod operators;
pub mod rule;
pub mod specification;
pub mod versioning;

/// Prelude module - import everything you need with `use podium_rules::prelude::*`
pub mod prelude {
    pub use crate::context::{MatchContext, Participant};
    pub use crate::criteria::{applicability, criteria_for, failed_criteria, NamedCriterion};
    pub use crate::distribution::{Distribution, DistributionCalculator, PayoutEntry};
    pub use crate::matcher::{RuleMatcher, Selection, SelectionSource};
    pub use crate::operators::Spec;
    pub use crate::rule::{
        AmountRange, EffectiveWindow, KillConfig, PositionConfig, PositionTier, PrizeRule, RuleScope,
    };
    pub use crate::specification::{AllOf, And, BoxedSpec, Specification};
    pub use crate::versioning::{ChangeMeta, Mutation, RulePatch, RuleVersion, VersionTracker};
    pub use podium_common::{DistributionType, Money, PayoutKind, PrizeError, PrizeResult, Scope};
}
