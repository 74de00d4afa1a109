//! Catalog records: equipment items and panoply (item set) definitions.

use crate::characteristic::CharacteristicId;
use crate::slot::SlotType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type ItemId = i64;
pub type PanoplyId = i64;

/// Stat values keyed by characteristic.
pub type StatMap = BTreeMap<CharacteristicId, f64>;

/// One equippable item.
///
/// Immutable once loaded. A `panoply` of `None` means the item belongs to
/// no set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub slot: SlotType,
    pub level: u32,
    pub panoply: Option<PanoplyId>,
    /// Raw equip condition, e.g. `CF>100&CP<12`.
    pub condition: Option<String>,
    pub characteristics: StatMap,
}

impl Item {
    /// Value of one characteristic, 0 when the item does not carry it.
    pub fn stat(&self, id: CharacteristicId) -> f64 {
        self.characteristics.get(&id).copied().unwrap_or(0.0)
    }
}

/// Marginal bonuses per equipped-piece count.
///
/// `tiers[k]` is what moving from `k - 1` to `k` equipped pieces adds, so
/// the total at `k` pieces is the sum of tiers `2..=k`.
///
/// # Examples
///
/// ```rust
/// use loadout_opt::{CharacteristicId, TierBonuses};
///
/// let mut bonuses = TierBonuses::default();
/// bonuses.insert(2, CharacteristicId::AP, 1.0);
/// bonuses.insert(3, CharacteristicId::AP, 1.0);
///
/// assert_eq!(bonuses.bonus(3, CharacteristicId::AP), 1.0);
/// assert_eq!(bonuses.total_at(3, CharacteristicId::AP), 2.0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierBonuses {
    tiers: BTreeMap<u32, StatMap>,
}

impl TierBonuses {
    pub fn insert(&mut self, tier: u32, id: CharacteristicId, value: f64) {
        self.tiers.entry(tier).or_default().insert(id, value);
    }

    /// Marginal bonus of one tier for one characteristic.
    pub fn bonus(&self, tier: u32, id: CharacteristicId) -> f64 {
        self.tiers
            .get(&tier)
            .and_then(|stats| stats.get(&id))
            .copied()
            .unwrap_or(0.0)
    }

    /// All marginal bonuses of one tier.
    pub fn tier(&self, tier: u32) -> Option<&StatMap> {
        self.tiers.get(&tier)
    }

    /// Cumulative bonus with `pieces` items equipped.
    pub fn total_at(&self, pieces: u32, id: CharacteristicId) -> f64 {
        self.tiers
            .range(..=pieces)
            .filter_map(|(_, stats)| stats.get(&id))
            .sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &StatMap)> {
        self.tiers.iter().map(|(tier, stats)| (*tier, stats))
    }

    /// Convert cumulative figures (total bonus at `k` pieces) into the
    /// marginal form.
    ///
    /// Each characteristic is differenced against the sum of its lower
    /// tiers, in tier order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use loadout_opt::{CharacteristicId, TierBonuses};
    ///
    /// let mut cumulative = TierBonuses::default();
    /// cumulative.insert(2, CharacteristicId::STRENGTH, 20.0);
    /// cumulative.insert(3, CharacteristicId::STRENGTH, 50.0);
    ///
    /// let marginal = TierBonuses::from_cumulative(&cumulative);
    /// assert_eq!(marginal.bonus(2, CharacteristicId::STRENGTH), 20.0);
    /// assert_eq!(marginal.bonus(3, CharacteristicId::STRENGTH), 30.0);
    /// ```
    pub fn from_cumulative(cumulative: &TierBonuses) -> TierBonuses {
        let mut marginal = TierBonuses::default();
        let mut running: StatMap = BTreeMap::new();
        for (tier, stats) in cumulative.iter() {
            for (&id, &total) in stats {
                let previous = running.entry(id).or_insert(0.0);
                marginal.insert(tier, id, total - *previous);
                *previous = total;
            }
        }
        marginal
    }
}

/// A named item set granting tiered bonuses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PanoplySet {
    pub id: PanoplyId,
    pub name: String,
    pub bonuses: TierBonuses,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_stat_default_zero() {
        let item = Item {
            id: 1,
            name: "Gelano".into(),
            slot: SlotType::RING,
            level: 60,
            panoply: None,
            condition: None,
            characteristics: [(CharacteristicId::MP, 1.0)].into_iter().collect(),
        };
        assert_eq!(item.stat(CharacteristicId::MP), 1.0);
        assert_eq!(item.stat(CharacteristicId::AP), 0.0);
    }

    #[test]
    fn test_total_at_sums_lower_tiers() {
        let mut bonuses = TierBonuses::default();
        bonuses.insert(2, CharacteristicId::VITALITY, 50.0);
        bonuses.insert(3, CharacteristicId::VITALITY, 30.0);
        bonuses.insert(4, CharacteristicId::VITALITY, 20.0);
        assert_eq!(bonuses.total_at(1, CharacteristicId::VITALITY), 0.0);
        assert_eq!(bonuses.total_at(3, CharacteristicId::VITALITY), 80.0);
        assert_eq!(bonuses.total_at(9, CharacteristicId::VITALITY), 100.0);
    }

    #[test]
    fn test_from_cumulative_skips_tier_without_stat() {
        // Chance appears at tiers 2 and 4 only; tier 4 differences against tier 2.
        let mut cumulative = TierBonuses::default();
        cumulative.insert(2, CharacteristicId::CHANCE, 10.0);
        cumulative.insert(3, CharacteristicId::AP, 1.0);
        cumulative.insert(4, CharacteristicId::CHANCE, 40.0);

        let marginal = TierBonuses::from_cumulative(&cumulative);
        assert_eq!(marginal.bonus(4, CharacteristicId::CHANCE), 30.0);
        assert_eq!(marginal.bonus(3, CharacteristicId::AP), 1.0);
        assert_eq!(marginal.total_at(4, CharacteristicId::CHANCE), 40.0);
    }
}
