//! Asset catalog: the seven kinds tracked by the balance ledger.
//!
//! Kinds `0..=2` are primary (mintable and tradable among themselves);
//! kinds `3..=6` are derived and only produced by forging primary kinds.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DomainError;

/// Number of asset kinds in the catalog.
pub const ASSET_KIND_COUNT: usize = 7;

/// Asset kind identifier.
///
/// The inner value is private so every `AssetKind` in circulation is
/// guaranteed to be within the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct AssetKind(u8);

impl AssetKind {
    pub const BRONZE: Self = Self(0);
    pub const SILVER: Self = Self(1);
    pub const GOLD: Self = Self(2);
    pub const THORS_HAMMER: Self = Self(3);
    pub const SHIELD: Self = Self(4);
    pub const OBLIVION_SWORD: Self = Self(5);
    pub const DANTES_KEY: Self = Self(6);

    /// Every kind in catalog order.
    pub const ALL: [Self; ASSET_KIND_COUNT] = [
        Self::BRONZE,
        Self::SILVER,
        Self::GOLD,
        Self::THORS_HAMMER,
        Self::SHIELD,
        Self::OBLIVION_SWORD,
        Self::DANTES_KEY,
    ];

    /// Primary kinds in catalog order.
    pub const PRIMARY: [Self; 3] = [Self::BRONZE, Self::SILVER, Self::GOLD];

    /// Create an asset kind, validating it against the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`DomainError::UnknownAssetKind`] for values above 6.
    pub fn try_new(value: u64) -> Result<Self, DomainError> {
        u8::try_from(value)
            .ok()
            .filter(|v| usize::from(*v) < ASSET_KIND_COUNT)
            .map(Self)
            .ok_or(DomainError::UnknownAssetKind { value })
    }

    /// Raw identifier as used by the ledger contracts.
    #[must_use]
    pub const fn id(self) -> u8 {
        self.0
    }

    /// Position of this kind in catalog-ordered arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// True for kinds that can be minted and traded.
    #[must_use]
    pub const fn is_primary(self) -> bool {
        self.0 < 3
    }

    /// True for kinds produced only by forging.
    #[must_use]
    pub const fn is_derived(self) -> bool {
        !self.is_primary()
    }

    /// Display name shown by front ends.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self.0 {
            0 => "Bronze",
            1 => "Silver",
            2 => "Gold",
            3 => "Thor's Hammer",
            4 => "Shield",
            5 => "Oblivion Sword",
            _ => "Dante's Key",
        }
    }

    /// Primary kinds burned (one unit each) to forge this kind.
    ///
    /// Empty for primary kinds.
    #[must_use]
    pub fn recipe(self) -> &'static [AssetKind] {
        match self.0 {
            3 => &[Self::BRONZE, Self::SILVER],
            4 => &[Self::SILVER, Self::GOLD],
            5 => &[Self::BRONZE, Self::GOLD],
            6 => &[Self::BRONZE, Self::SILVER, Self::GOLD],
            _ => &[],
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (#{})", self.name(), self.0)
    }
}

impl TryFrom<u8> for AssetKind {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::try_new(u64::from(value))
    }
}

impl From<AssetKind> for u8 {
    fn from(kind: AssetKind) -> Self {
        kind.0
    }
}
