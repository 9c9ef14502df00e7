//! Payout service
//!
//! Picks the governing rule for a finished match and turns it into a payout
//! list. Both steps are delegated to the pure engine; this layer only loads
//! rules and reports what happened.

use std::sync::Arc;

use podium_common::{PrizeError, RuleId};
use podium_rules::prelude::*;
use serde::Serialize;

use crate::error::AppResult;
use crate::store::{RuleFilter, RuleStore};

/// A computed payout plan and the rule that produced it.
#[derive(Debug, Clone, Serialize)]
pub struct PayoutPlan {
    pub rule: PrizeRule,
    pub source: SelectionSource,
    pub distribution: Distribution,
}

/// Payout service for selection and distribution
#[derive(Clone)]
pub struct PayoutService {
    store: Arc<dyn RuleStore>,
    matcher: RuleMatcher,
    calculator: DistributionCalculator,
}

impl PayoutService {
    pub fn new(store: Arc<dyn RuleStore>) -> Self {
        Self {
            store,
            matcher: RuleMatcher::new(),
            calculator: DistributionCalculator::new(),
        }
    }

    /// Select the rule governing `ctx`, or `None` if neither a matching rule
    /// nor an active default exists.
    pub async fn select_rule(&self, ctx: &MatchContext) -> AppResult<Option<PrizeRule>> {
        Ok(self
            .select_with_source(ctx)
            .await?
            .map(|(rule, _)| rule))
    }

    async fn select_with_source(
        &self,
        ctx: &MatchContext,
    ) -> AppResult<Option<(PrizeRule, SelectionSource)>> {
        ctx.validate()?;

        // Defaults are only loaded when nothing matched on its own criteria.
        let mut rules = self.store.find(&RuleFilter::Applicable(ctx.clone())).await?;
        if rules.is_empty() {
            rules = self.store.find(&RuleFilter::ActiveDefaults).await?;
        }

        let Some(selection) = self.matcher.select_with_source(&rules, ctx) else {
            if tracing::enabled!(tracing::Level::DEBUG) {
                for (rule_id, failed) in self.explain(ctx).await? {
                    tracing::debug!(rule_id = %rule_id, failed = ?failed, "Prize rule rejected");
                }
            }
            tracing::info!(
                match_type = %ctx.match_type,
                game_type = %ctx.game_type,
                "No applicable prize rule"
            );
            return Ok(None);
        };

        tracing::info!(
            rule_id = %selection.rule.id,
            rule_version = selection.rule.version,
            source = ?selection.source,
            candidates = selection.candidates,
            "Prize rule selected"
        );
        Ok(Some((selection.rule.clone(), selection.source)))
    }

    /// Every stored rule that does not apply to `ctx`, with the criteria it fails.
    pub async fn explain(&self, ctx: &MatchContext) -> AppResult<Vec<(RuleId, Vec<&'static str>)>> {
        let rules = self.store.find(&RuleFilter::All).await?;
        Ok(rules
            .iter()
            .map(|rule| (rule.id, self.matcher.explain(rule, ctx)))
            .filter(|(_, failed)| !failed.is_empty())
            .collect())
    }

    /// Select the rule for `ctx` and compute payouts for `participants`.
    ///
    /// `participants` are processed in the order given; kill payouts depend on
    /// that order once the pool runs short.
    pub async fn distribute(
        &self,
        ctx: &MatchContext,
        participants: &[Participant],
    ) -> AppResult<PayoutPlan> {
        let (rule, source) =
            self.select_with_source(ctx)
                .await?
                .ok_or_else(|| PrizeError::NoApplicableRule {
                    match_type: ctx.match_type.clone(),
                    game_type: ctx.game_type.clone(),
                })?;

        let distribution = self.calculator.compute(&rule, ctx, participants)?;

        if let Some(diff) = distribution.position_share_mismatch() {
            tracing::warn!(
                rule_id = %rule.id,
                position_pool = %distribution.position_pool,
                difference = %diff,
                "Position payouts differ from the configured pool share"
            );
        }

        tracing::info!(
            match_id = ?ctx.match_id,
            rule_id = %rule.id,
            payouts = distribution.payouts.len(),
            total = %distribution.total_distributed,
            leftover = %distribution.leftover,
            "Distribution computed"
        );

        Ok(PayoutPlan {
            rule,
            source,
            distribution,
        })
    }
}
