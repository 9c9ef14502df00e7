//! Rule selection for a finished match.
//!
//! Selection is a pure query over a snapshot of rules: the caller supplies the
//! rule set (usually fetched from a store) and gets back a borrow of the single
//! rule that governs the match.

use std::cmp::Ordering;

use podium_common::{PrizeError, PrizeResult};
use serde::{Deserialize, Serialize};

use crate::context::MatchContext;
use crate::criteria::{applicability, failed_criteria, IsActive, IsDefault};
use crate::operators::Spec;
use crate::rule::PrizeRule;
use crate::specification::Specification;

/// How a rule was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    /// The rule's own criteria matched
    Matched,
    /// No rule matched; the active default rule was used
    Default,
}

/// Result of a successful selection.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'a> {
    pub rule: &'a PrizeRule,
    pub source: SelectionSource,
    /// Number of rules whose criteria matched
    pub candidates: usize,
}

/// Selects the applicable prize rule for a match.
#[derive(Debug, Default, Clone, Copy)]
pub struct RuleMatcher;

impl RuleMatcher {
    pub fn new() -> Self {
        Self
    }

    /// Select the rule for `ctx`, or `None` when neither a matching rule nor
    /// an active default exists.
    pub fn select<'a>(&self, rules: &'a [PrizeRule], ctx: &MatchContext) -> Option<&'a PrizeRule> {
        self.select_with_source(rules, ctx).map(|selection| selection.rule)
    }

    /// Like [`select`](Self::select), but reports how the rule was found.
    pub fn select_with_source<'a>(
        &self,
        rules: &'a [PrizeRule],
        ctx: &MatchContext,
    ) -> Option<Selection<'a>> {
        let applies = applicability(ctx);
        let matched: Vec<&PrizeRule> = rules.iter().filter(|r| applies.is_satisfied_by(*r)).collect();
        let candidates = matched.len();

        if let Some(rule) = best_of(matched) {
            return Some(Selection {
                rule,
                source: SelectionSource::Matched,
                candidates,
            });
        }

        let fallback = Spec(IsActive) & Spec(IsDefault);
        best_of(rules.iter().filter(|r| fallback.is_satisfied_by(*r))).map(|rule| Selection {
            rule,
            source: SelectionSource::Default,
            candidates,
        })
    }

    /// Select the rule for `ctx`, failing with `NoApplicableRule` when none exists.
    pub fn select_required<'a>(
        &self,
        rules: &'a [PrizeRule],
        ctx: &MatchContext,
    ) -> PrizeResult<&'a PrizeRule> {
        self.select(rules, ctx).ok_or_else(|| PrizeError::NoApplicableRule {
            match_type: ctx.match_type.clone(),
            game_type: ctx.game_type.clone(),
        })
    }

    /// Names of the criteria `rule` fails for `ctx`. Empty when it applies.
    pub fn explain(&self, rule: &PrizeRule, ctx: &MatchContext) -> Vec<&'static str> {
        failed_criteria(rule, ctx)
    }
}

/// Total ranking used to break ties among applicable rules.
///
/// `Less` means `a` wins: higher priority, then more specific scope, then
/// earlier creation, then lower id.
pub fn precedence(a: &PrizeRule, b: &PrizeRule) -> Ordering {
    b.priority
        .cmp(&a.priority)
        .then_with(|| b.scope.specificity().cmp(&a.scope.specificity()))
        .then_with(|| a.created_at.cmp(&b.created_at))
        .then_with(|| a.id.cmp(&b.id))
}

fn best_of<'a>(rules: impl IntoIterator<Item = &'a PrizeRule>) -> Option<&'a PrizeRule> {
    rules.into_iter().min_by(|a, b| precedence(a, b))
}
