//! Common types used across Podium crates.

use std::borrow::Borrow;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prize rule ID type
pub type RuleId = Uuid;

/// User ID type
pub type UserId = Uuid;

/// Match ID type
pub type MatchId = Uuid;

/// Currency amount. Always exact decimal, never floating point.
pub type Money = Decimal;

/// Scope of a rule along one match dimension (match type, game type).
///
/// `Any` is the explicit wildcard; a `Specific` value only ever matches an
/// equal value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope<T> {
    Any,
    Specific(T),
}

impl<T> Scope<T> {
    /// Check whether this scope admits the given value.
    pub fn admits<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: PartialEq + ?Sized,
    {
        match self {
            Scope::Any => true,
            Scope::Specific(expected) => expected.borrow() == value,
        }
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Scope::Any)
    }

    /// Borrow the specific value, if any.
    pub fn as_specific(&self) -> Option<&T> {
        match self {
            Scope::Any => None,
            Scope::Specific(value) => Some(value),
        }
    }
}

impl<T> Default for Scope<T> {
    fn default() -> Self {
        Scope::Any
    }
}

/// How a rule turns a prize pool into payouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistributionType {
    /// Fixed prizes per final rank or rank range
    PositionBased,
    /// Operator-interpreted percentage split (no engine computation)
    Percentage,
    /// Prize per elimination
    KillBased,
    /// Position phase followed by kill phase
    Hybrid,
    /// Operator-defined (no engine computation)
    Custom,
}

impl DistributionType {
    /// Whether the position phase runs for this type
    pub fn pays_positions(&self) -> bool {
        matches!(self, DistributionType::PositionBased | DistributionType::Hybrid)
    }

    /// Whether the kill phase runs for this type
    pub fn pays_kills(&self) -> bool {
        matches!(self, DistributionType::KillBased | DistributionType::Hybrid)
    }

    /// Whether the engine has a computed path for this type
    pub fn is_computable(&self) -> bool {
        self.pays_positions() || self.pays_kills()
    }
}

impl std::fmt::Display for DistributionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DistributionType::PositionBased => write!(f, "position_based"),
            DistributionType::Percentage => write!(f, "percentage"),
            DistributionType::KillBased => write!(f, "kill_based"),
            DistributionType::Hybrid => write!(f, "hybrid"),
            DistributionType::Custom => write!(f, "custom"),
        }
    }
}

/// Source of a single payout entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutKind {
    Position,
    Kill,
}

impl std::fmt::Display for PayoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayoutKind::Position => write!(f, "position"),
            PayoutKind::Kill => write!(f, "kill"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scope_admits() {
        let any: Scope<String> = Scope::Any;
        assert!(any.admits(&"squad".to_string()));

        let squad = Scope::Specific("squad".to_string());
        assert!(squad.admits(&"squad".to_string()));
        assert!(!squad.admits(&"solo".to_string()));
    }

    #[test]
    fn test_specific_value_named_all_is_not_a_wildcard() {
        let scope = Scope::Specific("all".to_string());
        assert!(!scope.admits(&"squad".to_string()));
        assert!(!scope.is_any());
    }

    #[test]
    fn test_scope_serialization() {
        let json = serde_json::to_string(&Scope::Specific("tdm".to_string())).unwrap();
        assert_eq!(json, r#"{"specific":"tdm"}"#);

        let any: Scope<String> = serde_json::from_str(r#""any""#).unwrap();
        assert!(any.is_any());
    }

    #[test]
    fn test_distribution_type_phases() {
        assert!(DistributionType::Hybrid.pays_positions());
        assert!(DistributionType::Hybrid.pays_kills());
        assert!(!DistributionType::KillBased.pays_positions());
        assert!(!DistributionType::Percentage.is_computable());
        assert!(!DistributionType::Custom.is_computable());
        assert_eq!(DistributionType::PositionBased.to_string(), "position_based");
    }
}
