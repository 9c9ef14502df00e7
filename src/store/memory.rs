//! In-memory rule store

use std::collections::HashMap;

use async_trait::async_trait;
use podium_common::{PrizeError, PrizeResult, RuleId};
use podium_rules::prelude::*;
use tokio::sync::RwLock;

use super::{check_save_shape, RuleFilter, RuleStore};

#[derive(Default)]
struct Inner {
    rules: HashMap<RuleId, PrizeRule>,
    history: HashMap<RuleId, Vec<RuleVersion>>,
}

/// Rule store backed by process memory.
///
/// Reads clone under a shared lock; writes take the exclusive lock, so a
/// version check and the write it guards cannot interleave with another edit.
#[derive(Default)]
pub struct InMemoryRuleStore {
    inner: RwLock<Inner>,
}

impl InMemoryRuleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store pre-loaded with rules (for tests and fixtures).
    pub fn with_rules(rules: impl IntoIterator<Item = PrizeRule>) -> Self {
        let rules = rules.into_iter().map(|rule| (rule.id, rule)).collect();
        Self {
            inner: RwLock::new(Inner {
                rules,
                history: HashMap::new(),
            }),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.rules.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl RuleStore for InMemoryRuleStore {
    async fn find(&self, filter: &RuleFilter) -> PrizeResult<Vec<PrizeRule>> {
        let inner = self.inner.read().await;
        let mut rules: Vec<PrizeRule> = inner
            .rules
            .values()
            .filter(|rule| filter.matches(rule))
            .cloned()
            .collect();
        rules.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        Ok(rules)
    }

    async fn get(&self, id: RuleId) -> PrizeResult<Option<PrizeRule>> {
        Ok(self.inner.read().await.rules.get(&id).cloned())
    }

    async fn insert(&self, rule: &PrizeRule) -> PrizeResult<()> {
        if rule.version != 1 {
            return Err(PrizeError::Validation(format!(
                "New rules start at version 1 (got {})",
                rule.version
            )));
        }

        let mut inner = self.inner.write().await;
        if inner.rules.contains_key(&rule.id) {
            return Err(PrizeError::Validation(format!("Rule {} already exists", rule.id)));
        }
        inner.rules.insert(rule.id, rule.clone());
        tracing::debug!(rule_id = %rule.id, "Rule inserted");
        Ok(())
    }

    async fn save(
        &self,
        rule: &PrizeRule,
        expected_version: u32,
        entry: &RuleVersion,
    ) -> PrizeResult<()> {
        check_save_shape(rule, expected_version, entry)?;

        let mut inner = self.inner.write().await;
        let stored = inner
            .rules
            .get(&rule.id)
            .ok_or_else(|| PrizeError::NotFound(format!("Rule {}", rule.id)))?;

        if stored.version != expected_version {
            return Err(PrizeError::ConcurrentModification {
                rule_id: rule.id,
                expected: expected_version,
                actual: stored.version,
            });
        }

        inner.history.entry(rule.id).or_default().push(entry.clone());
        inner.rules.insert(rule.id, rule.clone());
        tracing::debug!(rule_id = %rule.id, version = rule.version, "Rule saved");
        Ok(())
    }

    async fn history(&self, id: RuleId) -> PrizeResult<Vec<RuleVersion>> {
        Ok(self
            .inner
            .read()
            .await
            .history
            .get(&id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    fn rule(name: &str) -> PrizeRule {
        PrizeRule::new(name, DistributionType::KillBased, Utc::now() - Duration::days(1))
            .with_kills(KillConfig::new(Decimal::from(10), None, Decimal::ONE_HUNDRED))
    }

    fn context() -> MatchContext {
        MatchContext::new(
            "squad",
            "battle_royale",
            50,
            Decimal::from(20),
            Decimal::from(1000),
            Utc::now(),
        )
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryRuleStore::new();
        let r = rule("a");
        store.insert(&r).await.unwrap();
        assert_eq!(store.get(r.id).await.unwrap(), Some(r.clone()));
        assert!(store.insert(&r).await.is_err());
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_find_applicable_uses_every_criterion() {
        let store = InMemoryRuleStore::with_rules([
            rule("fits"),
            rule("inactive").inactive(),
            rule("small").with_participants(0, 10),
            rule("other game").with_scope(RuleScope::specific("squad", "tdm")),
            rule("default").with_participants(0, 1).as_default(),
        ]);

        let applicable = store.find(&RuleFilter::Applicable(context())).await.unwrap();
        let names: Vec<&str> = applicable.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["fits"]);

        let defaults = store.find(&RuleFilter::ActiveDefaults).await.unwrap();
        assert_eq!(defaults.len(), 1);
        assert_eq!(store.find(&RuleFilter::All).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_save_checks_expected_version() {
        let store = InMemoryRuleStore::new();
        let r = rule("a");
        store.insert(&r).await.unwrap();

        let tracker = VersionTracker::new();
        let meta = ChangeMeta::new("ops", Utc::now());
        let first = tracker.on_mutate(&r, &RulePatch::new().priority(1), &meta);
        let second = tracker.on_mutate(&r, &RulePatch::new().priority(2), &meta);

        store
            .save(&first.rule, first.expected_version(), &first.entry)
            .await
            .unwrap();

        let err = store
            .save(&second.rule, second.expected_version(), &second.entry)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            PrizeError::ConcurrentModification {
                rule_id: r.id,
                expected: 1,
                actual: 2,
            }
        );

        let history = store.history(r.id).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].snapshot.version, 1);
        assert_eq!(store.get(r.id).await.unwrap().unwrap().priority, 1);
    }

    #[tokio::test]
    async fn test_save_rejects_malformed_edit() {
        let store = InMemoryRuleStore::new();
        let r = rule("a");
        store.insert(&r).await.unwrap();

        let meta = ChangeMeta::new("ops", Utc::now());
        let mut mutation = VersionTracker::new().on_mutate(&r, &RulePatch::new().priority(1), &meta);
        mutation.rule.version = 5;
        let err = store.save(&mutation.rule, 1, &mutation.entry).await.unwrap_err();
        assert!(matches!(err, PrizeError::Validation(_)));
    }

    #[tokio::test]
    async fn test_save_unknown_rule() {
        let store = InMemoryRuleStore::new();
        let r = rule("ghost");
        let meta = ChangeMeta::new("ops", Utc::now());
        let mutation = VersionTracker::new().on_mutate(&r, &RulePatch::new().priority(1), &meta);
        let err = store
            .save(&mutation.rule, mutation.expected_version(), &mutation.entry)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_version_lookup() {
        let store = InMemoryRuleStore::new();
        let r = rule("a");
        store.insert(&r).await.unwrap();
        let meta = ChangeMeta::new("ops", Utc::now());
        let m = VersionTracker::new().on_mutate(&r, &RulePatch::new().priority(3), &meta);
        store.save(&m.rule, 1, &m.entry).await.unwrap();

        assert!(store.version(r.id, 1).await.unwrap().is_some());
        assert!(store.version(r.id, 2).await.unwrap().is_none());
    }
}
