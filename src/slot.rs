//! Equipment slot types and their capacity rules.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Catalog equipment category (`type` column).
#[derive(
    Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SlotType(pub u32);

impl SlotType {
    pub const AMULET: Self = Self(1);
    pub const BOW: Self = Self(2);
    pub const WAND: Self = Self(3);
    pub const STAFF: Self = Self(4);
    pub const DAGGER: Self = Self(5);
    pub const SWORD: Self = Self(6);
    pub const HAMMER: Self = Self(7);
    pub const SHOVEL: Self = Self(8);
    pub const RING: Self = Self(9);
    pub const BELT: Self = Self(10);
    pub const BOOTS: Self = Self(11);
    pub const HAT: Self = Self(16);
    pub const CLOAK: Self = Self(17);
    pub const AXE: Self = Self(19);
    pub const SCYTHE: Self = Self(22);
    /// Legendary items ("Dofus").
    pub const DOFUS: Self = Self(23);
    pub const SHIELD: Self = Self(82);
    pub const TROPHY: Self = Self(151);

    /// Display name, `None` for types outside the equipment whitelist.
    pub fn name(self) -> Option<&'static str> {
        let name = match self {
            Self::HAT => "Hat",
            Self::CLOAK => "Cloak",
            Self::RING => "Ring",
            Self::AMULET => "Amulet",
            Self::WAND => "Wand",
            Self::BOOTS => "Boots",
            Self::BELT => "Belt",
            Self::HAMMER => "Hammer",
            Self::STAFF => "Staff",
            Self::BOW => "Bow",
            Self::DAGGER => "Dagger",
            Self::SWORD => "Sword",
            Self::AXE => "Axe",
            Self::SCYTHE => "Scythe",
            Self::SHOVEL => "Shovel",
            Self::TROPHY => "Trophy",
            Self::DOFUS => "Dofus",
            Self::SHIELD => "Shield",
            _ => return None,
        };
        Some(name)
    }
}

impl fmt::Display for SlotType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "type {}", self.0),
        }
    }
}

/// How many items of each slot type a build may wear.
///
/// Individually capped types get their own limit. Types in the weapon
/// group share one hand and are capped jointly. Trophies and dofus also
/// share a combined cap on top of their per-type limits.
///
/// # Examples
///
/// ```rust
/// use loadout_opt::{SlotRules, SlotType};
///
/// let rules = SlotRules::standard();
/// assert_eq!(rules.individual_limit(SlotType::RING), Some(2));
/// assert_eq!(rules.individual_limit(SlotType::HAT), Some(1));
/// // Weapons only count against the shared weapon cap
/// assert_eq!(rules.individual_limit(SlotType::SWORD), None);
/// assert!(rules.is_weapon(SlotType::SWORD));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRules {
    /// Slot types the optimizer will equip at all.
    pub equipment: BTreeSet<SlotType>,
    /// Per-type caps that differ from `default_limit`.
    pub limits: BTreeMap<SlotType, u32>,
    /// Cap for every other individually limited type.
    pub default_limit: u32,
    /// Types sharing the weapon/tool hand.
    pub weapon_group: BTreeSet<SlotType>,
    /// Cap across the whole weapon group.
    pub weapon_limit: u32,
    /// Types sharing the combined trophy cap.
    pub trophy_group: BTreeSet<SlotType>,
    /// Cap across the whole trophy group.
    pub trophy_limit: u32,
}

impl SlotRules {
    /// The game's slot layout.
    pub fn standard() -> Self {
        let weapon_group: BTreeSet<SlotType> = [
            SlotType::WAND,
            SlotType::HAMMER,
            SlotType::STAFF,
            SlotType::BOW,
            SlotType::DAGGER,
            SlotType::SWORD,
            SlotType::AXE,
            SlotType::SCYTHE,
            SlotType::SHOVEL,
        ]
        .into_iter()
        .collect();
        let trophy_group: BTreeSet<SlotType> =
            [SlotType::TROPHY, SlotType::DOFUS].into_iter().collect();

        let mut equipment: BTreeSet<SlotType> = [
            SlotType::HAT,
            SlotType::CLOAK,
            SlotType::RING,
            SlotType::AMULET,
            SlotType::BOOTS,
            SlotType::BELT,
            SlotType::SHIELD,
        ]
        .into_iter()
        .collect();
        equipment.extend(weapon_group.iter().copied());
        equipment.extend(trophy_group.iter().copied());

        let limits = [(SlotType::RING, 2), (SlotType::TROPHY, 6), (SlotType::DOFUS, 6)]
            .into_iter()
            .collect();

        Self {
            equipment,
            limits,
            default_limit: 1,
            weapon_group,
            weapon_limit: 1,
            trophy_group,
            trophy_limit: 6,
        }
    }

    pub fn is_equipment(&self, slot: SlotType) -> bool {
        self.equipment.contains(&slot)
    }

    pub fn is_weapon(&self, slot: SlotType) -> bool {
        self.weapon_group.contains(&slot)
    }

    pub fn is_trophy(&self, slot: SlotType) -> bool {
        self.trophy_group.contains(&slot)
    }

    /// Per-type cap, or `None` for weapon-group types which are only
    /// limited jointly.
    pub fn individual_limit(&self, slot: SlotType) -> Option<u32> {
        if self.is_weapon(slot) {
            return None;
        }
        Some(self.limits.get(&slot).copied().unwrap_or(self.default_limit))
    }
}

impl Default for SlotRules {
    fn default() -> Self {
        Self::standard()
    }
}
