//! User intents and the operation slots they occupy.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::asset::AssetKind;
use super::error::DomainError;

/// Independent confirmation track. One in-flight write per slot per account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Slot {
    /// Minting a primary kind.
    Acquire,
    /// Forging a derived kind.
    Transform,
    /// Trading one primary kind for another.
    Exchange,
}

impl Slot {
    /// All slots.
    pub const ALL: [Self; 3] = [Self::Acquire, Self::Transform, Self::Exchange];

    /// Lowercase name for logs and machine output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Acquire => "acquire",
            Self::Transform => "transform",
            Self::Exchange => "exchange",
        }
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-originated request.
///
/// Prefer the validating constructors; [`OperationIntent::validate`] is
/// re-run by the dispatcher for intents built directly from variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum OperationIntent {
    /// Mint one unit of a primary kind.
    Acquire { kind: AssetKind },
    /// Forge one unit of a derived kind from its recipe.
    Transform { kind: AssetKind },
    /// Burn one unit of `give` to receive one unit of `want`.
    Exchange { want: AssetKind, give: AssetKind },
}

impl OperationIntent {
    /// Build a validated Acquire intent.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotAcquirable`] for derived kinds.
    pub fn acquire(kind: AssetKind) -> Result<Self, DomainError> {
        let intent = Self::Acquire { kind };
        intent.validate()?;
        Ok(intent)
    }

    /// Build a validated Transform intent.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotForgeable`] for primary kinds.
    pub fn transform(kind: AssetKind) -> Result<Self, DomainError> {
        let intent = Self::Transform { kind };
        intent.validate()?;
        Ok(intent)
    }

    /// Build a validated Exchange intent.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::NotExchangeable`] if either side is derived,
    /// or [`DomainError::SelfExchange`] if both sides are the same kind.
    pub fn exchange(want: AssetKind, give: AssetKind) -> Result<Self, DomainError> {
        let intent = Self::Exchange { want, give };
        intent.validate()?;
        Ok(intent)
    }

    /// Check the kind constraints for this intent.
    ///
    /// # Errors
    ///
    /// Returns the first violated [`DomainError`].
    pub fn validate(&self) -> Result<(), DomainError> {
        match *self {
            Self::Acquire { kind } if !kind.is_primary() => {
                Err(DomainError::NotAcquirable { kind })
            }
            Self::Transform { kind } if !kind.is_derived() => {
                Err(DomainError::NotForgeable { kind })
            }
            Self::Exchange { want, give } => {
                for kind in [want, give] {
                    if !kind.is_primary() {
                        return Err(DomainError::NotExchangeable { kind });
                    }
                }
                if want == give {
                    return Err(DomainError::SelfExchange { kind: want });
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Slot this intent occupies while in flight.
    #[must_use]
    pub const fn slot(&self) -> Slot {
        match self {
            Self::Acquire { .. } => Slot::Acquire,
            Self::Transform { .. } => Slot::Transform,
            Self::Exchange { .. } => Slot::Exchange,
        }
    }

    /// Kinds burned by this intent, one unit each.
    #[must_use]
    pub fn consumed(&self) -> Vec<AssetKind> {
        match *self {
            Self::Acquire { .. } => Vec::new(),
            Self::Transform { kind } => kind.recipe().to_vec(),
            Self::Exchange { give, .. } => vec![give],
        }
    }

    /// Convert into the ledger call the orchestrator submits.
    #[must_use]
    pub const fn to_call(&self) -> LedgerCall {
        match *self {
            Self::Acquire { kind } => LedgerCall::Acquire { kind },
            Self::Transform { kind } => LedgerCall::Transform { kind },
            Self::Exchange { want, give } => LedgerCall::Exchange { want, give },
        }
    }
}

impl fmt::Display for OperationIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Acquire { kind } => write!(f, "mint {kind}"),
            Self::Transform { kind } => write!(f, "forge {kind}"),
            Self::Exchange { want, give } => write!(f, "trade {give} for {want}"),
        }
    }
}

/// A ledger write, as recorded in a transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "call", rename_all = "lowercase")]
pub enum LedgerCall {
    Acquire { kind: AssetKind },
    Transform { kind: AssetKind },
    Exchange { want: AssetKind, give: AssetKind },
}

impl LedgerCall {
    #[must_use]
    pub const fn slot(&self) -> Slot {
        match self {
            Self::Acquire { .. } => Slot::Acquire,
            Self::Transform { .. } => Slot::Transform,
            Self::Exchange { .. } => Slot::Exchange,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquire_only_accepts_primary() {
        assert!(OperationIntent::acquire(AssetKind::GOLD).is_ok());
        assert_eq!(
            OperationIntent::acquire(AssetKind::SHIELD),
            Err(DomainError::NotAcquirable {
                kind: AssetKind::SHIELD
            })
        );
    }

    #[test]
    fn transform_only_accepts_derived() {
        assert!(OperationIntent::transform(AssetKind::THORS_HAMMER).is_ok());
        assert!(matches!(
            OperationIntent::transform(AssetKind::BRONZE),
            Err(DomainError::NotForgeable { .. })
        ));
    }

    #[test]
    fn exchange_rejects_same_kind() {
        assert_eq!(
            OperationIntent::exchange(AssetKind::SILVER, AssetKind::SILVER),
            Err(DomainError::SelfExchange {
                kind: AssetKind::SILVER
            })
        );
    }

    #[test]
    fn exchange_rejects_derived_side() {
        assert!(matches!(
            OperationIntent::exchange(AssetKind::GOLD, AssetKind::DANTES_KEY),
            Err(DomainError::NotExchangeable { kind }) if kind == AssetKind::DANTES_KEY
        ));
    }

    #[test]
    fn directly_built_variant_is_caught_by_validate() {
        let intent = OperationIntent::Acquire {
            kind: AssetKind::SHIELD,
        };
        assert!(intent.validate().is_err());
    }

    #[test]
    fn consumed_follows_recipe_and_give_side() {
        let forge = OperationIntent::transform(AssetKind::SHIELD).unwrap();
        assert_eq!(forge.consumed(), vec![AssetKind::SILVER, AssetKind::GOLD]);

        let trade = OperationIntent::exchange(AssetKind::GOLD, AssetKind::BRONZE).unwrap();
        assert_eq!(trade.consumed(), vec![AssetKind::BRONZE]);

        let mint = OperationIntent::acquire(AssetKind::BRONZE).unwrap();
        assert!(mint.consumed().is_empty());
    }

    #[test]
    fn slot_matches_call_slot() {
        let intents = [
            OperationIntent::acquire(AssetKind::BRONZE).unwrap(),
            OperationIntent::transform(AssetKind::SHIELD).unwrap(),
            OperationIntent::exchange(AssetKind::GOLD, AssetKind::SILVER).unwrap(),
        ];
        for intent in intents {
            assert_eq!(intent.slot(), intent.to_call().slot());
        }
    }
}
