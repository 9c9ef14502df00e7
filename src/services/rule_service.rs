//! Rule administration service
//!
//! Every edit goes through [`VersionTracker`] and is written with an
//! optimistic version check. Conflicting edits are re-read and retried.

use std::sync::Arc;

use podium_common::{PrizeError, PrizeResult, RuleId};
use podium_rules::prelude::*;

use crate::config::EngineConfig;
use crate::constants::SYSTEM_ACTOR;
use crate::error::AppResult;
use crate::store::{RuleFilter, RuleStore};

/// Rule service for authoring, editing and auditing prize rules
#[derive(Clone)]
pub struct RuleService {
    store: Arc<dyn RuleStore>,
    tracker: VersionTracker,
    max_retries: u32,
}

impl RuleService {
    pub fn new(store: Arc<dyn RuleStore>, config: &EngineConfig) -> Self {
        Self {
            store,
            tracker: VersionTracker::new(),
            max_retries: config.rule_update_max_retries,
        }
    }

    /// Create a new rule at version 1.
    pub async fn create_rule(&self, draft: PrizeRule, meta: &ChangeMeta) -> AppResult<PrizeRule> {
        let meta = &attributed(meta);
        let rule = self.tracker.create(draft, meta);
        rule.validate()?;
        self.store.insert(&rule).await?;

        tracing::info!(
            rule_id = %rule.id,
            name = %rule.name,
            distribution_type = %rule.distribution_type,
            created_by = %meta.changed_by,
            "Prize rule created"
        );
        Ok(rule)
    }

    /// Get rule by ID
    pub async fn get_rule(&self, id: RuleId) -> AppResult<PrizeRule> {
        Ok(self.load(id).await?)
    }

    /// List every stored rule, active or not
    pub async fn list_rules(&self) -> AppResult<Vec<PrizeRule>> {
        Ok(self.store.find(&RuleFilter::All).await?)
    }

    /// Apply `patch` as a new version. An empty patch returns the rule unchanged.
    pub async fn update_rule(
        &self,
        id: RuleId,
        patch: &RulePatch,
        meta: &ChangeMeta,
    ) -> AppResult<PrizeRule> {
        if patch.is_empty() {
            return self.get_rule(id).await;
        }

        let meta = &attributed(meta);
        self.mutate(id, |current| Ok(self.tracker.on_mutate(current, patch, meta)))
            .await
    }

    /// Take a rule out of selection. Its history is kept.
    pub async fn deactivate_rule(&self, id: RuleId, meta: &ChangeMeta) -> AppResult<PrizeRule> {
        let patch = RulePatch::new().active(false);
        let meta = &attributed(meta);
        self.mutate(id, |current| Ok(self.tracker.on_mutate(current, &patch, meta)))
            .await
    }

    /// Restore the content of `version` as a new version of the rule.
    pub async fn rollback_rule(
        &self,
        id: RuleId,
        version: u32,
        meta: &ChangeMeta,
    ) -> AppResult<PrizeRule> {
        let target = self.store.version(id, version).await?.ok_or_else(|| {
            PrizeError::NotFound(format!("Version {version} of rule {id}"))
        })?;
        let meta = &attributed(meta);

        self.mutate(id, |current| self.tracker.rollback(current, &target, meta))
            .await
    }

    /// History of a rule, oldest version first.
    pub async fn history(&self, id: RuleId) -> AppResult<Vec<RuleVersion>> {
        self.load(id).await?;
        Ok(self.store.history(id).await?)
    }

    async fn load(&self, id: RuleId) -> PrizeResult<PrizeRule> {
        self.store
            .get(id)
            .await?
            .ok_or_else(|| PrizeError::NotFound(format!("Rule {id}")))
    }

    /// Read, build the next version, validate, and save; retry on conflict.
    async fn mutate<F>(&self, id: RuleId, build: F) -> AppResult<PrizeRule>
    where
        F: Fn(&PrizeRule) -> PrizeResult<Mutation>,
    {
        let mut attempt = 0;
        loop {
            let current = self.load(id).await?;
            let mutation = build(&current)?;
            mutation.rule.validate()?;

            let saved = self
                .store
                .save(&mutation.rule, mutation.expected_version(), &mutation.entry)
                .await;

            match saved {
                Ok(()) => {
                    tracing::info!(
                        rule_id = %id,
                        version = mutation.rule.version,
                        changed_by = %mutation.entry.changed_by,
                        reason = ?mutation.entry.reason,
                        "Prize rule updated"
                    );
                    return Ok(mutation.rule);
                }
                Err(err) if err.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    tracing::warn!(rule_id = %id, attempt, error = %err, "Retrying rule update");
                }
                Err(err) => return Err(err.into()),
            }
        }
    }
}

/// Edits without a named actor are recorded as made by the system.
fn attributed(meta: &ChangeMeta) -> ChangeMeta {
    let mut meta = meta.clone();
    if meta.changed_by.trim().is_empty() {
        meta.changed_by = SYSTEM_ACTOR.to_string();
    }
    meta
}
