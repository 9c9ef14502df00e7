//! Rule storage
//!
//! The engine reads rule snapshots and writes versioned edits through the
//! [`RuleStore`] trait. Two backends are provided: an in-memory store for
//! tests and embedded use, and a PostgreSQL store in [`crate::db`].

pub mod memory;

use async_trait::async_trait;
use podium_common::{PrizeResult, RuleId};
use podium_rules::prelude::*;

pub use memory::InMemoryRuleStore;

/// Which rules a query should return.
#[derive(Debug, Clone)]
pub enum RuleFilter {
    /// Rules meeting every applicability criterion for the match
    Applicable(MatchContext),
    /// Active rules flagged as default
    ActiveDefaults,
    /// Every stored rule, active or not
    All,
}

impl RuleFilter {
    /// Evaluate the filter against one rule.
    pub fn matches(&self, rule: &PrizeRule) -> bool {
        match self {
            RuleFilter::Applicable(ctx) => applicability(ctx).is_satisfied_by(rule),
            RuleFilter::ActiveDefaults => rule.is_active && rule.is_default,
            RuleFilter::All => true,
        }
    }
}

/// Persistence collaborator for prize rules and their version log.
#[async_trait]
pub trait RuleStore: Send + Sync {
    /// Snapshot of the rules matching `filter`, consistent within the call.
    async fn find(&self, filter: &RuleFilter) -> PrizeResult<Vec<PrizeRule>>;

    /// Load one rule by id.
    async fn get(&self, id: RuleId) -> PrizeResult<Option<PrizeRule>>;

    /// Store a new rule. The rule must be at version 1.
    async fn insert(&self, rule: &PrizeRule) -> PrizeResult<()>;

    /// Replace a rule if the stored version still equals `expected_version`,
    /// appending `entry` to its history in the same atomic step.
    async fn save(
        &self,
        rule: &PrizeRule,
        expected_version: u32,
        entry: &RuleVersion,
    ) -> PrizeResult<()>;

    /// History of a rule, oldest version first.
    async fn history(&self, id: RuleId) -> PrizeResult<Vec<RuleVersion>>;

    /// One history entry by version.
    async fn version(&self, id: RuleId, version: u32) -> PrizeResult<Option<RuleVersion>> {
        Ok(self
            .history(id)
            .await?
            .into_iter()
            .find(|entry| entry.version == version))
    }
}

/// Checks shared by every backend before an edit is written.
pub(crate) fn check_save_shape(
    rule: &PrizeRule,
    expected_version: u32,
    entry: &RuleVersion,
) -> PrizeResult<()> {
    if rule.version != expected_version + 1 {
        return Err(PrizeError::Validation(format!(
            "Rule version must advance by one (expected {}, got {})",
            expected_version + 1,
            rule.version
        )));
    }
    if entry.rule_id != rule.id || entry.version != expected_version {
        return Err(PrizeError::Validation(format!(
            "History entry {}@{} does not describe rule {}@{}",
            entry.rule_id, entry.version, rule.id, expected_version
        )));
    }
    Ok(())
}
