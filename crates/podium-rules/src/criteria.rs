//! Applicability criteria for prize rules.
//!
//! Every criterion is its own specification holding only the match attribute
//! it checks. A rule applies to a match when all six criteria from
//! [`applicability`] hold.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use podium_common::Money;

use crate::context::MatchContext;
use crate::rule::PrizeRule;
use crate::specification::{AllOf, BoxedSpec, Specification};

/// Match type and game type are each admitted by the rule's scope.
pub struct ScopeAdmits {
    pub match_type: String,
    pub game_type: String,
}

impl ScopeAdmits {
    pub fn new(match_type: impl Into<String>, game_type: impl Into<String>) -> Self {
        Self {
            match_type: match_type.into(),
            game_type: game_type.into(),
        }
    }
}

impl Specification<PrizeRule> for ScopeAdmits {
    fn is_satisfied_by(&self, rule: &PrizeRule) -> bool {
        rule.scope.admits(&self.match_type, &self.game_type)
    }
}

/// The rule is switched on.
pub struct IsActive;

impl Specification<PrizeRule> for IsActive {
    fn is_satisfied_by(&self, rule: &PrizeRule) -> bool {
        rule.is_active
    }
}

/// The rule is flagged as the fallback rule.
pub struct IsDefault;

impl Specification<PrizeRule> for IsDefault {
    fn is_satisfied_by(&self, rule: &PrizeRule) -> bool {
        rule.is_default
    }
}

/// The match's slot count lies within the rule's participant bounds.
pub struct SlotsWithinBounds {
    pub slots: u32,
}

impl SlotsWithinBounds {
    pub fn new(slots: u32) -> Self {
        Self { slots }
    }
}

impl Specification<PrizeRule> for SlotsWithinBounds {
    fn is_satisfied_by(&self, rule: &PrizeRule) -> bool {
        rule.min_participants <= self.slots && self.slots <= rule.max_participants
    }
}

/// The match's entry fee lies within the rule's fee bracket.
pub struct EntryFeeWithin {
    pub entry_fee: Money,
}

impl EntryFeeWithin {
    pub fn new(entry_fee: Money) -> Self {
        Self { entry_fee }
    }
}

impl Specification<PrizeRule> for EntryFeeWithin {
    fn is_satisfied_by(&self, rule: &PrizeRule) -> bool {
        rule.entry_fee_range.contains(self.entry_fee)
    }
}

/// The match's prize pool lies within the rule's pool bracket.
pub struct PrizePoolWithin {
    pub prize_pool: Money,
}

impl PrizePoolWithin {
    pub fn new(prize_pool: Money) -> Self {
        Self { prize_pool }
    }
}

impl Specification<PrizeRule> for PrizePoolWithin {
    fn is_satisfied_by(&self, rule: &PrizeRule) -> bool {
        rule.prize_pool_range.contains(self.prize_pool)
    }
}

/// The rule's effective window covers the evaluation instant.
pub struct EffectiveAt {
    pub at: DateTime<Utc>,
}

impl EffectiveAt {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self { at }
    }
}

impl Specification<PrizeRule> for EffectiveAt {
    fn is_satisfied_by(&self, rule: &PrizeRule) -> bool {
        rule.effective.contains(self.at)
    }
}

/// A criterion with a stable name for diagnostics.
#[derive(Clone)]
pub struct NamedCriterion {
    pub name: &'static str,
    pub spec: BoxedSpec<PrizeRule>,
}

fn named(name: &'static str, spec: BoxedSpec<PrizeRule>) -> NamedCriterion {
    NamedCriterion { name, spec }
}

/// The six applicability criteria for a match, in evaluation order.
pub fn criteria_for(ctx: &MatchContext) -> Vec<NamedCriterion> {
    vec![
        named("scope", Arc::new(ScopeAdmits::new(&ctx.match_type, &ctx.game_type))),
        named("active", Arc::new(IsActive)),
        named("participants", Arc::new(SlotsWithinBounds::new(ctx.max_slots))),
        named("entry_fee", Arc::new(EntryFeeWithin::new(ctx.entry_fee))),
        named("prize_pool", Arc::new(PrizePoolWithin::new(ctx.prize_pool))),
        named("effective_window", Arc::new(EffectiveAt::new(ctx.now))),
    ]
}

/// Conjunction of all applicability criteria for a match.
pub fn applicability(ctx: &MatchContext) -> AllOf<PrizeRule> {
    AllOf::new(criteria_for(ctx).into_iter().map(|c| c.spec).collect())
}

/// Names of the criteria the rule fails for this match. Empty means it applies.
pub fn failed_criteria(rule: &PrizeRule, ctx: &MatchContext) -> Vec<&'static str> {
    criteria_for(ctx)
        .into_iter()
        .filter(|c| !c.spec.is_satisfied_by(rule))
        .map(|c| c.name)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operators::Spec;
    use crate::rule::{AmountRange, EffectiveWindow, RuleScope};
    use chrono::Duration;
    use podium_common::{DistributionType, Scope};
    use rust_decimal::Decimal;

    fn sample_context() -> MatchContext {
        MatchContext::new(
            "squad",
            "battle_royale",
            100,
            Decimal::from(50),
            Decimal::from(4000),
            Utc::now(),
        )
    }

    fn open_rule() -> PrizeRule {
        PrizeRule::new("open", DistributionType::KillBased, Utc::now() - Duration::days(1))
    }

    #[test]
    fn test_open_rule_satisfies_everything() {
        let ctx = sample_context();
        assert!(applicability(&ctx).is_satisfied_by(&open_rule()));
        assert!(failed_criteria(&open_rule(), &ctx).is_empty());
    }

    #[test]
    fn test_scope_criterion() {
        let ctx = sample_context();
        let spec = ScopeAdmits::new(&ctx.match_type, &ctx.game_type);

        let partial = open_rule().with_scope(RuleScope::new(
            Scope::Specific("squad".into()),
            Scope::Any,
        ));
        assert!(spec.is_satisfied_by(&partial));

        let other_game = open_rule().with_scope(RuleScope::specific("squad", "tdm"));
        assert!(!spec.is_satisfied_by(&other_game));
    }

    #[test]
    fn test_slot_bounds_inclusive() {
        let rule = open_rule().with_participants(2, 100);
        assert!(SlotsWithinBounds::new(100).is_satisfied_by(&rule));
        assert!(SlotsWithinBounds::new(2).is_satisfied_by(&rule));
        assert!(!SlotsWithinBounds::new(101).is_satisfied_by(&rule));
        assert!(!SlotsWithinBounds::new(1).is_satisfied_by(&rule));
    }

    #[test]
    fn test_money_brackets() {
        let rule = open_rule()
            .with_entry_fee_range(AmountRange::new(Decimal::from(10), Some(Decimal::from(50))))
            .with_prize_pool_range(AmountRange::new(Decimal::from(1000), None));
        assert!(EntryFeeWithin::new(Decimal::from(50)).is_satisfied_by(&rule));
        assert!(!EntryFeeWithin::new(Decimal::new(5001, 2)).is_satisfied_by(&rule));
        assert!(PrizePoolWithin::new(Decimal::from(1_000_000)).is_satisfied_by(&rule));
        assert!(!PrizePoolWithin::new(Decimal::from(999)).is_satisfied_by(&rule));
    }

    #[test]
    fn test_effective_window() {
        let now = Utc::now();
        let expired = open_rule().with_effective(EffectiveWindow::between(
            now - Duration::days(10),
            now - Duration::days(1),
        ));
        assert!(!EffectiveAt::new(now).is_satisfied_by(&expired));

        let future = open_rule().with_effective(EffectiveWindow::starting(now + Duration::hours(1)));
        assert!(!EffectiveAt::new(now).is_satisfied_by(&future));
    }

    #[test]
    fn test_each_criterion_narrows_independently() {
        // Failing one criterion must not be masked by a later one passing.
        let ctx = sample_context();
        let rule = open_rule()
            .with_participants(0, 10)
            .with_entry_fee_range(AmountRange::new(Decimal::from(100), None));
        assert!(!applicability(&ctx).is_satisfied_by(&rule));
        assert_eq!(failed_criteria(&rule, &ctx), vec!["participants", "entry_fee"]);
    }

    #[test]
    fn test_inactive_reported() {
        let ctx = sample_context();
        let rule = open_rule().inactive();
        assert_eq!(failed_criteria(&rule, &ctx), vec!["active"]);
    }

    #[test]
    fn test_default_fallback_composition() {
        let fallback = Spec(IsActive) & Spec(IsDefault);
        assert!(fallback.is_satisfied_by(&open_rule().as_default()));
        assert!(!fallback.is_satisfied_by(&open_rule()));
        assert!(!fallback.is_satisfied_by(&open_rule().as_default().inactive()));
    }
}
