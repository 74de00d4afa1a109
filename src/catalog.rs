//! Read-only views over the item and panoply tables.

use crate::item::{Item, ItemId, PanoplyId, PanoplySet};
use crate::slot::{SlotRules, SlotType};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;
use tracing::warn;

/// Selection criteria for the items a run may consider.
#[derive(Debug, Clone)]
pub struct EligibilityFilter<'a> {
    pub levels: RangeInclusive<u32>,
    pub banned: &'a BTreeSet<ItemId>,
    pub rules: &'a SlotRules,
    /// Drop the trophy group (trophies and dofus) entirely.
    pub exclude_trophies: bool,
}

/// Items keyed by id.
///
/// # Examples
///
/// ```rust
/// use loadout_opt::{EquipmentCatalog, Item, SlotType};
/// use std::collections::BTreeMap;
///
/// let ring = |id| Item {
///     id,
///     name: format!("ring {id}"),
///     slot: SlotType::RING,
///     level: 10,
///     panoply: None,
///     condition: None,
///     characteristics: BTreeMap::new(),
/// };
///
/// let catalog = EquipmentCatalog::new(vec![ring(1), ring(2), ring(1)]);
/// assert_eq!(catalog.len(), 2);
/// assert_eq!(catalog.by_slot()[&SlotType::RING], vec![1, 2]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct EquipmentCatalog {
    items: BTreeMap<ItemId, Item>,
}

impl EquipmentCatalog {
    /// Build a catalog. The first row wins when an id repeats.
    pub fn new(items: impl IntoIterator<Item = Item>) -> Self {
        let mut map = BTreeMap::new();
        for item in items {
            if map.contains_key(&item.id) {
                warn!(item_id = item.id, "duplicate item id, keeping first row");
                continue;
            }
            map.insert(item.id, item);
        }
        Self { items: map }
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.items.keys().copied()
    }

    /// A new catalog holding only the items a run may equip.
    pub fn eligible(&self, filter: &EligibilityFilter<'_>) -> EquipmentCatalog {
        let items = self
            .items
            .values()
            .filter(|item| filter.levels.contains(&item.level))
            .filter(|item| !filter.banned.contains(&item.id))
            .filter(|item| filter.rules.is_equipment(item.slot))
            .filter(|item| !(filter.exclude_trophies && filter.rules.is_trophy(item.slot)))
            .map(|item| (item.id, item.clone()))
            .collect();
        EquipmentCatalog { items }
    }

    /// Item ids grouped by slot type.
    pub fn by_slot(&self) -> BTreeMap<SlotType, Vec<ItemId>> {
        let mut groups: BTreeMap<SlotType, Vec<ItemId>> = BTreeMap::new();
        for item in self.items.values() {
            groups.entry(item.slot).or_default().push(item.id);
        }
        groups
    }

    /// Item ids grouped by panoply.
    ///
    /// Items without a set and items pointing at a set the panoply catalog
    /// does not know are left out.
    pub fn by_panoply(&self, panoplies: &PanoplyCatalog) -> BTreeMap<PanoplyId, Vec<ItemId>> {
        let mut groups: BTreeMap<PanoplyId, Vec<ItemId>> = BTreeMap::new();
        for item in self.items.values() {
            let Some(set_id) = item.panoply else {
                continue;
            };
            if panoplies.get(set_id).is_none() {
                continue;
            }
            groups.entry(set_id).or_default().push(item.id);
        }
        groups
    }
}

/// Panoply sets keyed by id.
#[derive(Debug, Clone, Default)]
pub struct PanoplyCatalog {
    sets: BTreeMap<PanoplyId, PanoplySet>,
}

impl PanoplyCatalog {
    pub fn new(sets: impl IntoIterator<Item = PanoplySet>) -> Self {
        let mut map = BTreeMap::new();
        for set in sets {
            if map.contains_key(&set.id) {
                warn!(panoply_id = set.id, "duplicate panoply id, keeping first row");
                continue;
            }
            map.insert(set.id, set);
        }
        Self { sets: map }
    }

    pub fn get(&self, id: PanoplyId) -> Option<&PanoplySet> {
        self.sets.get(&id)
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PanoplySet> {
        self.sets.values()
    }
}
