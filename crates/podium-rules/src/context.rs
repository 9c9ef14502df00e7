//! Match-side inputs to rule selection and distribution.
//!
//! Both types are produced by the match-results subsystem once a result is
//! verified; the engine only reads them.

use chrono::{DateTime, Utc};
use podium_common::{MatchId, Money, PrizeError, PrizeResult, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Attributes of a finished match used to pick and apply a prize rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_id: Option<MatchId>,
    pub match_type: String,
    pub game_type: String,
    /// Participant cap of the match
    pub max_slots: u32,
    pub entry_fee: Money,
    pub prize_pool: Money,
    /// Evaluation instant for effective windows
    pub now: DateTime<Utc>,
}

impl MatchContext {
    pub fn new(
        match_type: impl Into<String>,
        game_type: impl Into<String>,
        max_slots: u32,
        entry_fee: Money,
        prize_pool: Money,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            match_id: None,
            match_type: match_type.into(),
            game_type: game_type.into(),
            max_slots,
            entry_fee,
            prize_pool,
            now,
        }
    }

    /// Attach the match identifier
    pub fn with_match_id(mut self, match_id: MatchId) -> Self {
        self.match_id = Some(match_id);
        self
    }

    /// Reject contexts that cannot describe a real match.
    pub fn validate(&self) -> PrizeResult<()> {
        if self.match_type.trim().is_empty() {
            return Err(PrizeError::Validation("Match type must not be empty".to_string()));
        }
        if self.game_type.trim().is_empty() {
            return Err(PrizeError::Validation("Game type must not be empty".to_string()));
        }
        if self.entry_fee < Decimal::ZERO {
            return Err(PrizeError::Validation(format!(
                "Entry fee must not be negative (got {})",
                self.entry_fee
            )));
        }
        if self.prize_pool < Decimal::ZERO {
            return Err(PrizeError::Validation(format!(
                "Prize pool must not be negative (got {})",
                self.prize_pool
            )));
        }
        Ok(())
    }
}

/// A single participant's verified result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub user_id: UserId,
    /// Final rank, 1-based. Absent when the participant was not ranked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<u32>,
    #[serde(default)]
    pub kills: u32,
}

impl Participant {
    pub fn new(user_id: UserId, position: Option<u32>, kills: u32) -> Self {
        Self {
            user_id,
            position,
            kills,
        }
    }

    /// Check whether the participant's rank falls in `[start, end]`.
    pub fn ranked_within(&self, start: u32, end: u32) -> bool {
        self.position.is_some_and(|rank| rank >= start && rank <= end)
    }
}
