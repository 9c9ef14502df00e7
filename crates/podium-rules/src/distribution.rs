//! Payout computation for a selected rule.
//!
//! Both phases are left folds over a [`Ledger`] carrying the running total, so
//! every credit is clamped to the prize pool headroom left by the credits
//! before it. Participant order is therefore significant: it is the caller's
//! responsibility to supply a stable order (for example, sorted by user id).

use podium_common::{DistributionType, MatchId, Money, PayoutKind, PrizeError, PrizeResult, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::context::{MatchContext, Participant};
use crate::rule::{saturating_mul, PositionTier, PrizeRule};

/// A single credit owed to a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutEntry {
    pub user_id: UserId,
    pub amount: Money,
    pub kind: PayoutKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kills: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl PayoutEntry {
    fn for_position(participant: &Participant, tier: &PositionTier, amount: Money) -> Self {
        Self {
            user_id: participant.user_id,
            amount,
            kind: PayoutKind::Position,
            position: participant.position,
            kills: None,
            label: Some(tier.label.clone()),
        }
    }

    fn for_kills(participant: &Participant, amount: Money) -> Self {
        Self {
            user_id: participant.user_id,
            amount,
            kind: PayoutKind::Kill,
            position: participant.position,
            kills: Some(participant.kills),
            label: None,
        }
    }

    /// Key under which a wallet must apply this credit at most once.
    pub fn idempotency_key(&self, match_id: MatchId) -> String {
        format!("{}:{}:{}", match_id, self.user_id, self.kind)
    }
}

/// Outcome of a distribution run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Distribution {
    pub payouts: Vec<PayoutEntry>,
    pub total_distributed: Money,
    /// Undistributed remainder of the prize pool
    pub leftover: Money,
    /// Nominal position share of the pool (audit only)
    pub position_pool: Money,
    /// Nominal kill share of the pool (audit only)
    pub kill_pool: Money,
}

impl Distribution {
    /// Sum of all entries credited to a user.
    pub fn total_for(&self, user_id: UserId) -> Money {
        self.payouts
            .iter()
            .filter(|p| p.user_id == user_id)
            .map(|p| p.amount)
            .sum()
    }

    /// Total paid under one payout kind.
    pub fn total_of(&self, kind: PayoutKind) -> Money {
        self.payouts
            .iter()
            .filter(|p| p.kind == kind)
            .map(|p| p.amount)
            .sum()
    }

    /// Difference between what the position phase actually paid and its
    /// nominal pool share. `None` when they agree.
    pub fn position_share_mismatch(&self) -> Option<Money> {
        let diff = self.total_of(PayoutKind::Position) - self.position_pool;
        (!diff.is_zero()).then_some(diff)
    }
}

/// Running fold state shared by both phases.
#[derive(Debug, Default)]
struct Ledger {
    payouts: Vec<PayoutEntry>,
    total: Money,
}

impl Ledger {
    /// Credit up to `amount`, clamped to the remaining headroom of `pool`.
    fn credit(mut self, pool: Money, amount: Money, entry: impl FnOnce(Money) -> PayoutEntry) -> Self {
        let headroom = pool - self.total;
        if headroom <= Decimal::ZERO || amount <= Decimal::ZERO {
            return self;
        }
        let paid = amount.min(headroom);
        self.total += paid;
        self.payouts.push(entry(paid));
        self
    }
}

/// Share of `pool` given by a 0..=100 percentage, never negative.
fn pool_share(percentage: Decimal, pool: Money) -> Money {
    saturating_mul(percentage / Decimal::ONE_HUNDRED, pool).max(Decimal::ZERO)
}

/// Computes payouts from a rule, a match and its participants.
#[derive(Debug, Default, Clone, Copy)]
pub struct DistributionCalculator;

impl DistributionCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Compute the payout list. Never pays out more than `ctx.prize_pool`.
    ///
    /// Fails only for distribution types without a computed path
    /// (`percentage`, `custom`).
    pub fn compute(
        &self,
        rule: &PrizeRule,
        ctx: &MatchContext,
        participants: &[Participant],
    ) -> PrizeResult<Distribution> {
        let kind = rule.distribution_type;
        if !kind.is_computable() {
            return Err(PrizeError::UnsupportedDistributionType(kind));
        }

        let pool = ctx.prize_pool;
        let mut ledger = Ledger::default();
        let mut position_pool = Decimal::ZERO;
        let mut kill_pool = Decimal::ZERO;

        if kind.pays_positions() {
            position_pool = pool_share(rule.position_config.pool_percentage, pool);
            ledger = Self::position_phase(ledger, rule, pool, participants);
        }

        if kind.pays_kills() {
            kill_pool = pool_share(rule.kill_config.pool_percentage, pool);
            ledger = Self::kill_phase(ledger, rule, pool, participants);
        }

        Ok(Distribution {
            leftover: (pool - ledger.total).max(Decimal::ZERO),
            total_distributed: ledger.total,
            payouts: ledger.payouts,
            position_pool,
            kill_pool,
        })
    }

    fn position_phase(ledger: Ledger, rule: &PrizeRule, pool: Money, participants: &[Participant]) -> Ledger {
        rule.position_config
            .positions
            .iter()
            .flat_map(|tier| {
                participants
                    .iter()
                    .filter(move |p| p.ranked_within(tier.position, tier.last_position()))
                    .map(move |p| (tier, p))
            })
            .fold(ledger, |ledger, (tier, participant)| {
                ledger.credit(pool, tier.prize, |paid| {
                    PayoutEntry::for_position(participant, tier, paid)
                })
            })
    }

    fn kill_phase(ledger: Ledger, rule: &PrizeRule, pool: Money, participants: &[Participant]) -> Ledger {
        let config = &rule.kill_config;
        participants
            .iter()
            .filter(|p| p.kills > 0)
            .fold(ledger, |ledger, participant| {
                ledger.credit(pool, config.earnings_for(participant.kills), |paid| {
                    PayoutEntry::for_kills(participant, paid)
                })
            })
    }
}

/// Whether a distribution type can be computed by this engine.
pub fn is_supported(kind: DistributionType) -> bool {
    kind.is_computable()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{KillConfig, PositionConfig};
    use chrono::Utc;
    use proptest::prelude::*;
    use uuid::Uuid;

    fn money(units: i64) -> Money {
        Decimal::from(units)
    }

    fn context(prize_pool: Money) -> MatchContext {
        MatchContext::new("squad", "battle_royale", 100, money(10), prize_pool, Utc::now())
    }

    fn kill_rule(per_kill: i64, cap: Option<i64>) -> PrizeRule {
        PrizeRule::new("kills", DistributionType::KillBased, Utc::now()).with_kills(KillConfig::new(
            money(per_kill),
            cap.map(money),
            Decimal::ONE_HUNDRED,
        ))
    }

    fn top_three_rule() -> PrizeRule {
        PrizeRule::new("top three", DistributionType::PositionBased, Utc::now()).with_positions(
            PositionConfig::new(
                vec![
                    PositionTier::single(1, money(500)),
                    PositionTier::single(2, money(300)),
                    PositionTier::single(3, money(200)),
                ],
                Decimal::ONE_HUNDRED,
            ),
        )
    }

    #[test]
    fn test_position_only_distribution() {
        let players: Vec<Participant> = (1..=3)
            .map(|rank| Participant::new(Uuid::new_v4(), Some(rank), 0))
            .collect();

        let result = DistributionCalculator::new()
            .compute(&top_three_rule(), &context(money(1000)), &players)
            .unwrap();

        let amounts: Vec<Money> = result.payouts.iter().map(|p| p.amount).collect();
        assert_eq!(amounts, vec![money(500), money(300), money(200)]);
        assert!(result.payouts.iter().all(|p| p.kind == PayoutKind::Position));
        assert_eq!(result.total_distributed, money(1000));
        assert_eq!(result.leftover, Decimal::ZERO);
        assert_eq!(result.position_pool, money(1000));
        assert_eq!(result.position_share_mismatch(), None);
    }

    #[test]
    fn test_kill_clamp_depends_on_participant_order() {
        let a = Participant::new(Uuid::new_v4(), None, 6);
        let b = Participant::new(Uuid::new_v4(), None, 6);
        let mut rule = kill_rule(100, None);
        rule.position_config.pool_percentage = Decimal::ZERO;
        let ctx = context(money(1000));
        let calculator = DistributionCalculator::new();

        let forward = calculator.compute(&rule, &ctx, &[a.clone(), b.clone()]).unwrap();
        assert_eq!(forward.total_for(a.user_id), money(600));
        assert_eq!(forward.total_for(b.user_id), money(400));
        assert_eq!(forward.total_distributed, money(1000));

        let reversed = calculator.compute(&rule, &ctx, &[b.clone(), a.clone()]).unwrap();
        assert_eq!(reversed.total_for(b.user_id), money(600));
        assert_eq!(reversed.total_for(a.user_id), money(400));
    }

    #[test]
    fn test_exhausted_headroom_emits_nothing() {
        let players = vec![
            Participant::new(Uuid::new_v4(), None, 10),
            Participant::new(Uuid::new_v4(), None, 3),
        ];
        let result = DistributionCalculator::new()
            .compute(&kill_rule(100, None), &context(money(1000)), &players)
            .unwrap();
        assert_eq!(result.payouts.len(), 1);
        assert_eq!(result.payouts[0].user_id, players[0].user_id);
        assert_eq!(result.payouts[0].kills, Some(10));
    }

    #[test]
    fn test_max_kill_prize_caps_each_participant() {
        let players = vec![
            Participant::new(Uuid::new_v4(), None, 8),
            Participant::new(Uuid::new_v4(), None, 2),
            Participant::new(Uuid::new_v4(), None, 0),
        ];
        let result = DistributionCalculator::new()
            .compute(&kill_rule(25, Some(100)), &context(money(1000)), &players)
            .unwrap();
        let amounts: Vec<Money> = result.payouts.iter().map(|p| p.amount).collect();
        assert_eq!(amounts, vec![money(100), money(50)]);
        assert_eq!(result.leftover, money(850));
    }

    #[test]
    fn test_hybrid_kill_phase_starts_from_position_total() {
        let a = Participant::new(Uuid::new_v4(), Some(1), 3);
        let b = Participant::new(Uuid::new_v4(), Some(2), 4);
        let rule = PrizeRule::new("hybrid", DistributionType::Hybrid, Utc::now())
            .with_positions(PositionConfig::new(
                vec![PositionTier::single(1, money(500))],
                Decimal::from(50),
            ))
            .with_kills(KillConfig::new(money(100), None, Decimal::from(50)));

        let result = DistributionCalculator::new()
            .compute(&rule, &context(money(1000)), &[a.clone(), b.clone()])
            .unwrap();

        let entries: Vec<(UserId, PayoutKind, Money)> = result
            .payouts
            .iter()
            .map(|p| (p.user_id, p.kind, p.amount))
            .collect();
        assert_eq!(
            entries,
            vec![
                (a.user_id, PayoutKind::Position, money(500)),
                (a.user_id, PayoutKind::Kill, money(300)),
                (b.user_id, PayoutKind::Kill, money(200)),
            ]
        );
        assert_eq!(result.position_pool, money(500));
        assert_eq!(result.kill_pool, money(500));
        assert_eq!(result.leftover, Decimal::ZERO);
    }

    #[test]
    fn test_rank_range_pays_each_member() {
        let rule = top_three_rule().with_positions(PositionConfig::new(
            vec![
                PositionTier::single(1, money(400)),
                PositionTier::range(2, 4, money(100)),
            ],
            Decimal::from(70),
        ));
        let players: Vec<Participant> = (1..=6)
            .map(|rank| Participant::new(Uuid::new_v4(), Some(rank), 0))
            .collect();
        let result = DistributionCalculator::new()
            .compute(&rule, &context(money(1000)), &players)
            .unwrap();

        assert_eq!(result.payouts.len(), 4);
        assert_eq!(result.total_distributed, money(700));
        assert_eq!(result.payouts[3].label.as_deref(), Some("2nd-4th"));
        assert_eq!(result.position_share_mismatch(), None);
    }

    #[test]
    fn test_missing_and_unranked_participants_skipped() {
        let players = vec![
            Participant::new(Uuid::new_v4(), Some(1), 0),
            Participant::new(Uuid::new_v4(), None, 0),
        ];
        let result = DistributionCalculator::new()
            .compute(&top_three_rule(), &context(money(1000)), &players)
            .unwrap();
        assert_eq!(result.payouts.len(), 1);
        assert_eq!(result.total_distributed, money(500));
        assert_eq!(result.leftover, money(500));
        assert_eq!(result.position_share_mismatch(), Some(money(-500)));
    }

    #[test]
    fn test_overconfigured_positions_never_exceed_pool() {
        let players: Vec<Participant> = (1..=3)
            .map(|rank| Participant::new(Uuid::new_v4(), Some(rank), 0))
            .collect();
        let result = DistributionCalculator::new()
            .compute(&top_three_rule(), &context(money(600)), &players)
            .unwrap();
        let amounts: Vec<Money> = result.payouts.iter().map(|p| p.amount).collect();
        assert_eq!(amounts, vec![money(500), money(100)]);
        assert_eq!(result.total_distributed, money(600));
    }

    #[test]
    fn test_degenerate_pools_pay_nothing() {
        let players = vec![Participant::new(Uuid::new_v4(), Some(1), 5)];
        let calculator = DistributionCalculator::new();
        for pool in [Decimal::ZERO, money(-100)] {
            let result = calculator.compute(&top_three_rule(), &context(pool), &players).unwrap();
            assert!(result.payouts.is_empty());
            assert_eq!(result.total_distributed, Decimal::ZERO);
            assert_eq!(result.leftover, Decimal::ZERO);
        }
    }

    #[test]
    fn test_huge_kill_prize_saturates_to_pool() {
        let rule = PrizeRule::new("jackpot", DistributionType::KillBased, Utc::now())
            .with_kills(KillConfig::new(Decimal::MAX, None, Decimal::ONE_HUNDRED));
        assert!(rule.validate().is_ok());

        let first = Participant::new(Uuid::new_v4(), None, 2);
        let second = Participant::new(Uuid::new_v4(), None, 3);
        let result = DistributionCalculator::new()
            .compute(&rule, &context(money(1000)), &[first.clone(), second])
            .unwrap();

        assert_eq!(result.payouts.len(), 1);
        assert_eq!(result.total_for(first.user_id), money(1000));
        assert_eq!(result.total_distributed, money(1000));
        assert_eq!(result.leftover, Decimal::ZERO);
    }

    #[test]
    fn test_huge_pool_percentage_share_does_not_overflow() {
        let rule = PrizeRule::new("unchecked", DistributionType::KillBased, Utc::now())
            .with_kills(KillConfig::new(money(1), None, Decimal::from(200)));
        let result = DistributionCalculator::new()
            .compute(&rule, &context(Decimal::MAX), &[])
            .unwrap();
        assert_eq!(result.kill_pool, Decimal::MAX);
    }

    #[test]
    fn test_unsupported_types_rejected() {
        for kind in [DistributionType::Percentage, DistributionType::Custom] {
            let rule = PrizeRule::new("opaque", kind, Utc::now());
            let err = DistributionCalculator::new()
                .compute(&rule, &context(money(1000)), &[])
                .unwrap_err();
            assert_eq!(err, PrizeError::UnsupportedDistributionType(kind));
            assert!(!is_supported(kind));
        }
    }

    #[test]
    fn test_idempotency_key() {
        let user = Uuid::new_v4();
        let match_id = Uuid::new_v4();
        let entry = PayoutEntry::for_kills(&Participant::new(user, None, 2), money(20));
        assert_eq!(entry.idempotency_key(match_id), format!("{match_id}:{user}:kill"));
    }

    fn arb_rule() -> impl Strategy<Value = PrizeRule> {
        (
            prop::collection::vec((1u32..6, 0u32..3, 0i64..800), 0..4),
            0i64..200,
            prop::option::of(0i64..500),
            prop::bool::ANY,
        )
            .prop_map(|(tiers, per_kill, cap, hybrid)| {
                let mut next = 1;
                let positions = tiers
                    .into_iter()
                    .map(|(gap, extra, prize)| {
                        let start = next + gap - 1;
                        next = start + extra + 1;
                        PositionTier::range(start, start + extra, money(prize))
                    })
                    .collect();
                let kind = if hybrid {
                    DistributionType::Hybrid
                } else {
                    DistributionType::KillBased
                };
                PrizeRule::new("arb", kind, Utc::now())
                    .with_positions(PositionConfig::new(positions, Decimal::from(60)))
                    .with_kills(KillConfig::new(money(per_kill), cap.map(money), Decimal::from(40)))
            })
    }

    proptest! {
        #[test]
        fn prop_total_never_exceeds_pool(
            rule in arb_rule(),
            pool in -100i64..5000,
            results in prop::collection::vec((prop::option::of(1u32..12), 0u32..20), 0..16),
        ) {
            let players: Vec<Participant> = results
                .into_iter()
                .map(|(position, kills)| Participant::new(Uuid::new_v4(), position, kills))
                .collect();
            let ctx = context(money(pool));
            let result = DistributionCalculator::new().compute(&rule, &ctx, &players).unwrap();

            let sum: Money = result.payouts.iter().map(|p| p.amount).sum();
            prop_assert_eq!(sum, result.total_distributed);
            prop_assert!(sum <= ctx.prize_pool.max(Decimal::ZERO));
            prop_assert!(result.payouts.iter().all(|p| p.amount > Decimal::ZERO));
            prop_assert_eq!(result.leftover, (ctx.prize_pool - sum).max(Decimal::ZERO));
        }
    }
}
