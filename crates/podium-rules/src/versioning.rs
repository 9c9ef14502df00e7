//! Version tracking for rule edits.
//!
//! The live rule and its history are separate entities: every mutation
//! produces the next live rule plus one immutable [`RuleVersion`] holding an
//! owned copy of the state it replaced. History entries are keyed by
//! `(rule_id, version)` and only ever appended.

use chrono::{DateTime, Utc};
use podium_common::{DistributionType, PrizeError, PrizeResult, RuleId};
use serde::{Deserialize, Serialize};

use crate::rule::{AmountRange, EffectiveWindow, KillConfig, PositionConfig, PrizeRule, RuleScope};

/// Immutable snapshot of a rule as it was before a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleVersion {
    pub rule_id: RuleId,
    /// Version of the snapshot (the version that was replaced)
    pub version: u32,
    pub snapshot: PrizeRule,
    pub changed_at: DateTime<Utc>,
    pub changed_by: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Who changed a rule, when and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeMeta {
    pub changed_by: String,
    pub changed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ChangeMeta {
    pub fn new(changed_by: impl Into<String>, changed_at: DateTime<Utc>) -> Self {
        Self {
            changed_by: changed_by.into(),
            changed_at,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Partial update of a rule. `None` leaves a field unchanged.
///
/// The optional fields of a rule are removed with the `clear_*` flags; a
/// clear wins over a value set in the same patch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RulePatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub scope: Option<RuleScope>,
    pub distribution_type: Option<DistributionType>,
    pub position_config: Option<PositionConfig>,
    pub kill_config: Option<KillConfig>,
    pub percentage_config: Option<serde_json::Value>,
    pub min_participants: Option<u32>,
    pub max_participants: Option<u32>,
    pub entry_fee_range: Option<AmountRange>,
    pub prize_pool_range: Option<AmountRange>,
    pub priority: Option<i32>,
    pub is_active: Option<bool>,
    pub is_default: Option<bool>,
    pub effective: Option<EffectiveWindow>,
    pub clear_description: bool,
    pub clear_percentage_config: bool,
}

impl RulePatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn active(mut self, is_active: bool) -> Self {
        self.is_active = Some(is_active);
        self
    }

    pub fn default_rule(mut self, is_default: bool) -> Self {
        self.is_default = Some(is_default);
        self
    }

    pub fn positions(mut self, config: PositionConfig) -> Self {
        self.position_config = Some(config);
        self
    }

    pub fn kills(mut self, config: KillConfig) -> Self {
        self.kill_config = Some(config);
        self
    }

    pub fn participants(mut self, min: u32, max: u32) -> Self {
        self.min_participants = Some(min);
        self.max_participants = Some(max);
        self
    }

    pub fn effective(mut self, window: EffectiveWindow) -> Self {
        self.effective = Some(window);
        self
    }

    pub fn clear_description(mut self) -> Self {
        self.clear_description = true;
        self
    }

    pub fn clear_percentage_config(mut self) -> Self {
        self.clear_percentage_config = true;
        self
    }

    /// Whether applying the patch would change nothing.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Write every present field onto `rule`.
    pub fn apply_to(&self, rule: &mut PrizeRule) {
        if let Some(name) = &self.name {
            rule.name = name.clone();
        }
        if let Some(description) = &self.description {
            rule.description = Some(description.clone());
        }
        if let Some(scope) = &self.scope {
            rule.scope = scope.clone();
        }
        if let Some(kind) = self.distribution_type {
            rule.distribution_type = kind;
        }
        if let Some(config) = &self.position_config {
            rule.position_config = config.clone();
        }
        if let Some(config) = &self.kill_config {
            rule.kill_config = config.clone();
        }
        if let Some(config) = &self.percentage_config {
            rule.percentage_config = Some(config.clone());
        }
        if let Some(min) = self.min_participants {
            rule.min_participants = min;
        }
        if let Some(max) = self.max_participants {
            rule.max_participants = max;
        }
        if let Some(range) = &self.entry_fee_range {
            rule.entry_fee_range = range.clone();
        }
        if let Some(range) = &self.prize_pool_range {
            rule.prize_pool_range = range.clone();
        }
        if let Some(priority) = self.priority {
            rule.priority = priority;
        }
        if let Some(is_active) = self.is_active {
            rule.is_active = is_active;
        }
        if let Some(is_default) = self.is_default {
            rule.is_default = is_default;
        }
        if let Some(window) = &self.effective {
            rule.effective = window.clone();
        }
        if self.clear_description {
            rule.description = None;
        }
        if self.clear_percentage_config {
            rule.percentage_config = None;
        }
    }
}

/// The next live rule plus the history entry that must be stored with it.
#[derive(Debug, Clone, PartialEq)]
pub struct Mutation {
    pub rule: PrizeRule,
    pub entry: RuleVersion,
}

impl Mutation {
    /// Version the store must still hold for the save to succeed.
    pub fn expected_version(&self) -> u32 {
        self.entry.version
    }
}

/// Produces versioned rule states for creation, edits and rollbacks.
#[derive(Debug, Default, Clone, Copy)]
pub struct VersionTracker;

impl VersionTracker {
    pub fn new() -> Self {
        Self
    }

    /// Stamp a freshly authored rule. New rules start at version 1 with no history.
    pub fn create(&self, mut rule: PrizeRule, meta: &ChangeMeta) -> PrizeRule {
        rule.version = 1;
        rule.created_at = meta.changed_at;
        rule.updated_at = meta.changed_at;
        rule.created_by = Some(meta.changed_by.clone());
        rule
    }

    /// Snapshot `existing`, then apply `patch` to a copy and bump its version.
    pub fn on_mutate(&self, existing: &PrizeRule, patch: &RulePatch, meta: &ChangeMeta) -> Mutation {
        let entry = Self::snapshot(existing, meta);

        let mut rule = existing.clone();
        patch.apply_to(&mut rule);
        rule.version = existing.version + 1;
        rule.updated_at = meta.changed_at;

        Mutation { rule, entry }
    }

    /// Restore the content of an earlier version as a new version.
    pub fn rollback(&self, current: &PrizeRule, target: &RuleVersion, meta: &ChangeMeta) -> PrizeResult<Mutation> {
        if target.rule_id != current.id {
            return Err(PrizeError::Validation(format!(
                "Version {} belongs to rule {}, not {}",
                target.version, target.rule_id, current.id
            )));
        }
        if target.version >= current.version {
            return Err(PrizeError::Validation(format!(
                "Can only roll back to an earlier version (current {}, requested {})",
                current.version, target.version
            )));
        }

        let meta = match meta.reason {
            Some(_) => meta.clone(),
            None => meta.clone().with_reason(format!("rollback to version {}", target.version)),
        };
        let entry = Self::snapshot(current, &meta);

        let mut rule = target.snapshot.clone();
        rule.id = current.id;
        rule.created_at = current.created_at;
        rule.created_by = current.created_by.clone();
        rule.version = current.version + 1;
        rule.updated_at = meta.changed_at;

        Ok(Mutation { rule, entry })
    }

    fn snapshot(rule: &PrizeRule, meta: &ChangeMeta) -> RuleVersion {
        RuleVersion {
            rule_id: rule.id,
            version: rule.version,
            snapshot: rule.clone(),
            changed_at: meta.changed_at,
            changed_by: meta.changed_by.clone(),
            reason: meta.reason.clone(),
        }
    }
}
