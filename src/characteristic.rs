//! Characteristic identifier module.
//!
//! Provides the `CharacteristicId` type, the integer key the item catalog
//! uses for every stat (action points, strength, elemental damage, ...).
//! Tables spell these keys as `characteristic_<n>` columns.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Column prefix used by the item and panoply tables.
pub const COLUMN_PREFIX: &str = "characteristic_";

/// Integer identifier for a character statistic.
///
/// Ids are not contiguous, so collections keyed by them are sparse maps.
///
/// # Examples
///
/// ```rust
/// use loadout_opt::CharacteristicId;
///
/// let ap = CharacteristicId::new(1);
/// assert_eq!(ap, CharacteristicId::AP);
/// assert_eq!(ap.column_name(), "characteristic_1");
///
/// // Both spellings parse
/// let chance: CharacteristicId = "characteristic_13".parse().unwrap();
/// assert_eq!(chance, "13".parse().unwrap());
/// ```
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CharacteristicId(i32);

impl CharacteristicId {
    /// Action points, the primary resource stat.
    pub const AP: Self = Self(1);
    /// Strength ("Force").
    pub const STRENGTH: Self = Self(10);
    pub const VITALITY: Self = Self(11);
    pub const WISDOM: Self = Self(12);
    pub const CHANCE: Self = Self(13);
    pub const AGILITY: Self = Self(14);
    pub const INTELLIGENCE: Self = Self(15);
    /// Range.
    pub const RANGE: Self = Self(19);
    /// Movement points, the secondary resource stat.
    pub const MP: Self = Self(23);
    pub const POWER: Self = Self(25);

    /// Create an id from its raw value.
    pub const fn new(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw integer value.
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// The table column holding this characteristic, e.g. `characteristic_13`.
    pub fn column_name(self) -> String {
        format!("{COLUMN_PREFIX}{}", self.0)
    }

    /// Parse a `characteristic_<n>` column name.
    ///
    /// Returns `None` for any other column.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use loadout_opt::CharacteristicId;
    ///
    /// assert_eq!(
    ///     CharacteristicId::from_column("characteristic_23"),
    ///     Some(CharacteristicId::MP)
    /// );
    /// assert_eq!(CharacteristicId::from_column("niveau"), None);
    /// ```
    pub fn from_column(column: &str) -> Option<Self> {
        column
            .strip_prefix(COLUMN_PREFIX)
            .and_then(|n| n.parse::<i32>().ok())
            .map(Self)
    }
}

impl From<i32> for CharacteristicId {
    fn from(raw: i32) -> Self {
        Self(raw)
    }
}

impl FromStr for CharacteristicId {
    type Err = std::num::ParseIntError;

    /// Accepts either a bare id (`13`) or a column name (`characteristic_13`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let digits = s.strip_prefix(COLUMN_PREFIX).unwrap_or(s);
        digits.parse::<i32>().map(Self)
    }
}

impl fmt::Display for CharacteristicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
