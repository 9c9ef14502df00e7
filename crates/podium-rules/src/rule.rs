//! Prize rule documents.
//!
//! A [`PrizeRule`] is the operator-authored description of how one class of
//! matches pays out. Rules are never deleted; they are deactivated and their
//! prior states live in the version log (see [`crate::versioning`]).

use chrono::{DateTime, Utc};
use podium_common::{DistributionType, Money, PrizeError, PrizeResult, RuleId, Scope};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Inclusive currency range with an optional upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmountRange {
    pub min: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<Money>,
}

impl AmountRange {
    pub fn new(min: Money, max: Option<Money>) -> Self {
        Self { min, max }
    }

    /// `[0, +inf)`
    pub fn unbounded() -> Self {
        Self {
            min: Decimal::ZERO,
            max: None,
        }
    }

    pub fn contains(&self, value: Money) -> bool {
        value >= self.min && self.max.is_none_or(|max| value <= max)
    }

    fn validate(&self, field: &str) -> PrizeResult<()> {
        if self.min < Decimal::ZERO {
            return Err(PrizeError::Validation(format!(
                "{field}: minimum must not be negative"
            )));
        }
        if let Some(max) = self.max {
            if max < self.min {
                return Err(PrizeError::Validation(format!(
                    "{field}: maximum {max} is below minimum {}",
                    self.min
                )));
            }
        }
        Ok(())
    }
}

impl Default for AmountRange {
    fn default() -> Self {
        Self::unbounded()
    }
}

/// Time window during which a rule may be selected. `until` is inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectiveWindow {
    pub from: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub until: Option<DateTime<Utc>>,
}

impl EffectiveWindow {
    pub fn starting(from: DateTime<Utc>) -> Self {
        Self { from, until: None }
    }

    pub fn between(from: DateTime<Utc>, until: DateTime<Utc>) -> Self {
        Self {
            from,
            until: Some(until),
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.from && self.until.is_none_or(|until| at <= until)
    }
}

/// Match-type and game-type scope of a rule.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleScope {
    pub match_type: Scope<String>,
    pub game_type: Scope<String>,
}

impl RuleScope {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn new(match_type: Scope<String>, game_type: Scope<String>) -> Self {
        Self {
            match_type,
            game_type,
        }
    }

    /// Scope pinned to both a match type and a game type
    pub fn specific(match_type: impl Into<String>, game_type: impl Into<String>) -> Self {
        Self {
            match_type: Scope::Specific(match_type.into()),
            game_type: Scope::Specific(game_type.into()),
        }
    }

    pub fn admits(&self, match_type: &str, game_type: &str) -> bool {
        self.match_type.admits(match_type) && self.game_type.admits(game_type)
    }

    /// Number of dimensions pinned to a specific value (0..=2).
    pub fn specificity(&self) -> u8 {
        u8::from(!self.match_type.is_any()) + u8::from(!self.game_type.is_any())
    }
}

/// One paid rank or rank range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionTier {
    pub position: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_range_end: Option<u32>,
    /// Absolute prize paid to each participant in the range
    pub prize: Money,
    #[serde(default)]
    pub label: String,
}

impl PositionTier {
    pub fn single(position: u32, prize: Money) -> Self {
        Self {
            position,
            position_range_end: None,
            prize,
            label: ordinal_label(position),
        }
    }

    pub fn range(position: u32, end: u32, prize: Money) -> Self {
        Self {
            position,
            position_range_end: Some(end),
            prize,
            label: format!("{}-{}", ordinal_label(position), ordinal_label(end)),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn last_position(&self) -> u32 {
        self.position_range_end.unwrap_or(self.position)
    }

    /// Number of ranks covered by this tier
    pub fn span(&self) -> u32 {
        self.last_position().saturating_sub(self.position) + 1
    }
}

fn ordinal_label(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{n}{suffix}")
}

/// Rank-based payout configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PositionConfig {
    #[serde(default)]
    pub positions: Vec<PositionTier>,
    /// Nominal share of the prize pool for this phase, 0..=100
    #[serde(default)]
    pub pool_percentage: Decimal,
}

impl PositionConfig {
    pub fn new(positions: Vec<PositionTier>, pool_percentage: Decimal) -> Self {
        Self {
            positions,
            pool_percentage,
        }
    }

    /// Sum of configured prizes if every tier were fully occupied.
    /// Saturates at `Decimal::MAX`.
    pub fn configured_total(&self) -> Money {
        self.positions
            .iter()
            .map(|tier| saturating_mul(tier.prize, Decimal::from(tier.span())))
            .fold(Decimal::ZERO, |total, prize| {
                total.checked_add(prize).unwrap_or(Decimal::MAX)
            })
    }

    fn validate(&self) -> PrizeResult<()> {
        validate_percentage("position_config.pool_percentage", self.pool_percentage)?;

        for tier in &self.positions {
            if tier.position == 0 {
                return Err(PrizeError::Validation(
                    "position_config: positions are 1-based".to_string(),
                ));
            }
            if tier.last_position() < tier.position {
                return Err(PrizeError::Validation(format!(
                    "position_config: range end {} is before position {}",
                    tier.last_position(),
                    tier.position
                )));
            }
            if tier.prize < Decimal::ZERO {
                return Err(PrizeError::Validation(format!(
                    "position_config: prize for position {} must not be negative",
                    tier.position
                )));
            }
        }

        let mut ranges: Vec<(u32, u32)> = self
            .positions
            .iter()
            .map(|tier| (tier.position, tier.last_position()))
            .collect();
        ranges.sort_unstable();
        for pair in ranges.windows(2) {
            if pair[1].0 <= pair[0].1 {
                return Err(PrizeError::Validation(format!(
                    "position_config: ranges {}-{} and {}-{} overlap",
                    pair[0].0, pair[0].1, pair[1].0, pair[1].1
                )));
            }
        }
        Ok(())
    }
}

/// Elimination-based payout configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KillConfig {
    pub per_kill_prize: Money,
    /// Per-participant cap on kill earnings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_kill_prize: Option<Money>,
    #[serde(default)]
    pub pool_percentage: Decimal,
}

impl KillConfig {
    pub fn new(per_kill_prize: Money, max_kill_prize: Option<Money>, pool_percentage: Decimal) -> Self {
        Self {
            per_kill_prize,
            max_kill_prize,
            pool_percentage,
        }
    }

    /// Uncapped-by-pool earnings for a kill count. Saturates at `Decimal::MAX`;
    /// the distribution ledger clamps the result to the pool headroom.
    pub fn earnings_for(&self, kills: u32) -> Money {
        let raw = saturating_mul(Decimal::from(kills), self.per_kill_prize);
        match self.max_kill_prize {
            Some(cap) => raw.min(cap),
            None => raw,
        }
    }

    fn validate(&self) -> PrizeResult<()> {
        validate_percentage("kill_config.pool_percentage", self.pool_percentage)?;
        if self.per_kill_prize < Decimal::ZERO {
            return Err(PrizeError::Validation(
                "kill_config: per-kill prize must not be negative".to_string(),
            ));
        }
        if self.max_kill_prize.is_some_and(|cap| cap < Decimal::ZERO) {
            return Err(PrizeError::Validation(
                "kill_config: maximum kill prize must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

fn validate_percentage(field: &str, value: Decimal) -> PrizeResult<()> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(PrizeError::Validation(format!(
            "{field} must be between 0 and 100 (got {value})"
        )));
    }
    Ok(())
}

/// `a * b` for non-negative amounts, pinned to `Decimal::MAX` on overflow.
pub(crate) fn saturating_mul(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b).unwrap_or(Decimal::MAX)
}

/// A prize distribution rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrizeRule {
    pub id: RuleId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub scope: RuleScope,
    pub distribution_type: DistributionType,
    #[serde(default)]
    pub position_config: PositionConfig,
    #[serde(default)]
    pub kill_config: KillConfig,
    /// Kept for operators; not interpreted by the engine
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage_config: Option<serde_json::Value>,
    pub min_participants: u32,
    pub max_participants: u32,
    #[serde(default)]
    pub entry_fee_range: AmountRange,
    #[serde(default)]
    pub prize_pool_range: AmountRange,
    #[serde(default)]
    pub priority: i32,
    pub is_active: bool,
    #[serde(default)]
    pub is_default: bool,
    pub effective: EffectiveWindow,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PrizeRule {
    /// Create an active, unscoped, unbounded rule effective from `now`.
    pub fn new(name: impl Into<String>, distribution_type: DistributionType, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            description: None,
            scope: RuleScope::any(),
            distribution_type,
            position_config: PositionConfig::default(),
            kill_config: KillConfig::default(),
            percentage_config: None,
            min_participants: 0,
            max_participants: u32::MAX,
            entry_fee_range: AmountRange::unbounded(),
            prize_pool_range: AmountRange::unbounded(),
            priority: 0,
            is_active: true,
            is_default: false,
            effective: EffectiveWindow::starting(now),
            version: 1,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_scope(mut self, scope: RuleScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_positions(mut self, config: PositionConfig) -> Self {
        self.position_config = config;
        self
    }

    pub fn with_kills(mut self, config: KillConfig) -> Self {
        self.kill_config = config;
        self
    }

    pub fn with_participants(mut self, min: u32, max: u32) -> Self {
        self.min_participants = min;
        self.max_participants = max;
        self
    }

    pub fn with_entry_fee_range(mut self, range: AmountRange) -> Self {
        self.entry_fee_range = range;
        self
    }

    pub fn with_prize_pool_range(mut self, range: AmountRange) -> Self {
        self.prize_pool_range = range;
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_effective(mut self, window: EffectiveWindow) -> Self {
        self.effective = window;
        self
    }

    pub fn as_default(mut self) -> Self {
        self.is_default = true;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// Reject structurally inconsistent rules before they are stored or used.
    pub fn validate(&self) -> PrizeResult<()> {
        if self.name.trim().is_empty() {
            return Err(PrizeError::Validation("Rule name must not be empty".to_string()));
        }
        if self.version < 1 {
            return Err(PrizeError::Validation("Rule version starts at 1".to_string()));
        }
        for (field, scope) in [
            ("match_type", &self.scope.match_type),
            ("game_type", &self.scope.game_type),
        ] {
            if scope.as_specific().is_some_and(|v| v.trim().is_empty()) {
                return Err(PrizeError::Validation(format!(
                    "Scope {field} must be Any or a non-empty value"
                )));
            }
        }
        if self.min_participants > self.max_participants {
            return Err(PrizeError::Validation(format!(
                "min_participants {} exceeds max_participants {}",
                self.min_participants, self.max_participants
            )));
        }
        self.entry_fee_range.validate("entry_fee_range")?;
        self.prize_pool_range.validate("prize_pool_range")?;
        if let Some(until) = self.effective.until {
            if until < self.effective.from {
                return Err(PrizeError::Validation(
                    "effective window ends before it starts".to_string(),
                ));
            }
        }
        self.position_config.validate()?;
        self.kill_config.validate()?;
        if self.distribution_type == DistributionType::PositionBased
            && self.position_config.positions.is_empty()
        {
            return Err(PrizeError::Validation(
                "position_based rules need at least one paid position".to_string(),
            ));
        }
        Ok(())
    }
}
