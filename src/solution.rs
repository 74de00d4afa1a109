//! Solution projection.
//!
//! Maps the solver's assignment back onto the catalog: selected items,
//! active set tiers, satisfied predicates, and stat totals recomputed from
//! base + items + active tiers rather than read off the objective.

use crate::catalog::{EquipmentCatalog, PanoplyCatalog};
use crate::characteristic::CharacteristicId;
use crate::condition::ConditionPredicate;
use crate::config::BaseStats;
use crate::item::{ItemId, PanoplyId, StatMap};
use crate::model::{Assignment, LoadoutModel, VarKey};
use crate::registry::StatRegistry;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::warn;

/// Slack used when re-checking the assignment against the model.
pub const FEASIBILITY_TOLERANCE: f64 = 1e-6;

/// The outcome of one solve.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Solution {
    pub selected_item_ids: BTreeSet<ItemId>,
    /// `(set, tier)` pairs whose bonus is active.
    pub activated_tiers: BTreeSet<(PanoplyId, u32)>,
    /// Predicates whose gate the solver set to 1.
    pub satisfied_predicates: BTreeSet<ConditionPredicate>,
    pub objective_value: f64,
    /// The assignment satisfies every model constraint.
    pub feasible: bool,
}

/// One equipped item, as shown in a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectedItem {
    pub id: ItemId,
    pub name: String,
    pub slot: String,
    pub level: u32,
    pub panoply: Option<PanoplyId>,
}

/// One active set bonus tier.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveTier {
    pub panoply: PanoplyId,
    pub name: String,
    pub tier: u32,
}

/// Everything the reporting layer needs about a loadout.
///
/// # Examples
///
/// ```rust
/// use loadout_opt::{CharacteristicId, Optimizer, OptimizerConfig, StatRegistry};
/// use loadout_opt::{EquipmentCatalog, Item, PanoplyCatalog, SlotType};
///
/// let hat = Item {
///     id: 7,
///     name: "Wisdom hat".into(),
///     slot: SlotType::HAT,
///     level: 10,
///     panoply: None,
///     condition: None,
///     characteristics: [(CharacteristicId::WISDOM, 40.0)].into_iter().collect(),
/// };
/// let config = OptimizerConfig::default()
///     .with_resource_minimum(CharacteristicId::AP, 0)
///     .with_resource_minimum(CharacteristicId::MP, 0)
///     .with_weight(CharacteristicId::WISDOM, 1.0);
///
/// let report = Optimizer::new(config)
///     .run(&EquipmentCatalog::new(vec![hat]), &PanoplyCatalog::default())
///     .unwrap();
///
/// assert_eq!(report.items[0].slot, "Hat");
/// assert_eq!(report.stat(CharacteristicId::WISDOM), 40.0);
/// let shown: Vec<String> = report
///     .display_stats(StatRegistry::standard())
///     .into_iter()
///     .map(|(name, _)| name)
///     .collect();
/// assert_eq!(shown, vec!["AP", "MP", "Range", "Wisdom"]);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadoutReport {
    pub solution: Solution,
    pub items: Vec<SelectedItem>,
    pub tiers: Vec<ActiveTier>,
    /// Recomputed totals for every characteristic the build touches.
    pub stat_totals: StatMap,
    /// The weights the run optimized.
    pub weights: StatMap,
}

impl LoadoutReport {
    /// Total of one characteristic, 0 when nothing contributes to it.
    pub fn stat(&self, id: CharacteristicId) -> f64 {
        self.stat_totals.get(&id).copied().unwrap_or(0.0)
    }

    /// Resource stats (AP, MP, Range) followed by the weighted ones, with
    /// display names.
    pub fn display_stats(&self, registry: &StatRegistry) -> Vec<(String, f64)> {
        let mut shown = vec![CharacteristicId::AP, CharacteristicId::MP, CharacteristicId::RANGE];
        for &id in self.weights.keys() {
            if !shown.contains(&id) {
                shown.push(id);
            }
        }
        shown
            .into_iter()
            .map(|id| (registry.name(id), self.stat(id)))
            .collect()
    }
}

/// Reads assignments back against the catalogs a model was built from.
#[derive(Debug, Clone)]
pub struct SolutionProjector<'a> {
    items: &'a EquipmentCatalog,
    panoplies: &'a PanoplyCatalog,
    base: &'a BaseStats,
}

impl<'a> SolutionProjector<'a> {
    pub fn new(
        items: &'a EquipmentCatalog,
        panoplies: &'a PanoplyCatalog,
        base: &'a BaseStats,
    ) -> Self {
        Self {
            items,
            panoplies,
            base,
        }
    }

    pub fn solution(&self, model: &LoadoutModel, assignment: &Assignment) -> Solution {
        let mut selected_item_ids = BTreeSet::new();
        let mut activated_tiers = BTreeSet::new();
        let mut satisfied_predicates = BTreeSet::new();
        for key in assignment.iter() {
            match key {
                VarKey::Item(id) => {
                    selected_item_ids.insert(*id);
                }
                VarKey::Tier { panoply, tier } => {
                    activated_tiers.insert((*panoply, *tier));
                }
                VarKey::Gate(predicate) => {
                    satisfied_predicates.insert(predicate.clone());
                }
            }
        }

        let mut feasible = true;
        for constraint in model.violations(assignment, FEASIBILITY_TOLERANCE) {
            warn!(
                constraint = constraint.name.as_str(),
                lhs = constraint.lhs(assignment),
                rhs = constraint.rhs,
                "assignment violates constraint"
            );
            feasible = false;
        }

        Solution {
            selected_item_ids,
            activated_tiers,
            satisfied_predicates,
            objective_value: model.objective_value(assignment),
            feasible,
        }
    }

    /// Base + equipped items + active tier bonuses, per characteristic.
    pub fn stat_totals(&self, solution: &Solution) -> StatMap {
        let mut totals: StatMap = self.base.iter().collect();
        for item in solution
            .selected_item_ids
            .iter()
            .filter_map(|&id| self.items.get(id))
        {
            for (&id, &value) in &item.characteristics {
                *totals.entry(id).or_insert(0.0) += value;
            }
        }
        for &(panoply, tier) in &solution.activated_tiers {
            let Some(bonus) = self
                .panoplies
                .get(panoply)
                .and_then(|set| set.bonuses.tier(tier))
            else {
                continue;
            };
            for (&id, &value) in bonus {
                *totals.entry(id).or_insert(0.0) += value;
            }
        }
        totals
    }

    pub fn report(
        &self,
        model: &LoadoutModel,
        assignment: &Assignment,
        weights: &StatMap,
    ) -> LoadoutReport {
        let solution = self.solution(model, assignment);
        let stat_totals = self.stat_totals(&solution);

        let items = solution
            .selected_item_ids
            .iter()
            .filter_map(|&id| self.items.get(id))
            .map(|item| SelectedItem {
                id: item.id,
                name: item.name.clone(),
                slot: item.slot.to_string(),
                level: item.level,
                panoply: item.panoply,
            })
            .collect();

        let tiers = solution
            .activated_tiers
            .iter()
            .map(|&(panoply, tier)| ActiveTier {
                panoply,
                name: self
                    .panoplies
                    .get(panoply)
                    .map(|set| set.name.clone())
                    .unwrap_or_default(),
                tier,
            })
            .collect();

        LoadoutReport {
            solution,
            items,
            tiers,
            stat_totals,
            weights: weights.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{Item, PanoplySet, TierBonuses};
    use crate::model::ModelBuilder;
    use crate::slot::SlotType;

    fn item(id: ItemId, slot: SlotType, panoply: Option<PanoplyId>, ap: f64) -> Item {
        Item {
            id,
            name: format!("item {id}"),
            slot,
            level: 1,
            panoply,
            condition: None,
            characteristics: [(CharacteristicId::AP, ap), (CharacteristicId::VITALITY, 10.0)]
                .into_iter()
                .collect(),
        }
    }

    fn fixture() -> (EquipmentCatalog, PanoplyCatalog) {
        let items = EquipmentCatalog::new(vec![
            item(1, SlotType::HAT, Some(5), 1.0),
            item(2, SlotType::CLOAK, Some(5), 0.0),
            item(3, SlotType::RING, None, 0.0),
        ]);
        let mut bonuses = TierBonuses::default();
        bonuses.insert(2, CharacteristicId::AP, 1.0);
        let panoplies = PanoplyCatalog::new(vec![PanoplySet {
            id: 5,
            name: "Gobball".into(),
            bonuses,
        }]);
        (items, panoplies)
    }

    #[test]
    fn test_totals_recomputed_from_base_items_and_tiers() {
        let (items, panoplies) = fixture();
        let base = BaseStats::for_level(200);
        let model = ModelBuilder::new(&items, &panoplies).build();
        let assignment = Assignment::from_set([
            VarKey::Item(1),
            VarKey::Item(2),
            VarKey::Tier { panoply: 5, tier: 2 },
        ]);

        let projector = SolutionProjector::new(&items, &panoplies, &base);
        let solution = projector.solution(&model, &assignment);
        assert!(solution.feasible);
        assert_eq!(solution.activated_tiers, [(5, 2)].into_iter().collect());

        let totals = projector.stat_totals(&solution);
        assert_eq!(totals[&CharacteristicId::AP], 6.0 + 1.0 + 1.0);
        assert_eq!(totals[&CharacteristicId::MP], 2.0);
        assert_eq!(totals[&CharacteristicId::VITALITY], 20.0);
    }

    #[test]
    fn test_inconsistent_assignment_is_flagged() {
        let (items, panoplies) = fixture();
        let base = BaseStats::default();
        let model = ModelBuilder::new(&items, &panoplies).build();
        // Tier 2 without its two pieces
        let assignment = Assignment::from_set([VarKey::Item(1), VarKey::Tier { panoply: 5, tier: 2 }]);

        let solution = SolutionProjector::new(&items, &panoplies, &base).solution(&model, &assignment);
        assert!(!solution.feasible);
    }

    #[test]
    fn test_report_names_items_and_tiers() {
        let (items, panoplies) = fixture();
        let base = BaseStats::default();
        let model = ModelBuilder::new(&items, &panoplies).build();
        let assignment = Assignment::from_set([
            VarKey::Item(1),
            VarKey::Item(2),
            VarKey::Item(3),
            VarKey::Tier { panoply: 5, tier: 2 },
        ]);
        let weights: StatMap = [(CharacteristicId::VITALITY, 1.0)].into_iter().collect();

        let report = SolutionProjector::new(&items, &panoplies, &base).report(&model, &assignment, &weights);
        let slots: Vec<&str> = report.items.iter().map(|i| i.slot.as_str()).collect();
        assert_eq!(slots, vec!["Hat", "Cloak", "Ring"]);
        assert_eq!(report.tiers[0].name, "Gobball");
        assert_eq!(report.stat(CharacteristicId::VITALITY), 30.0);
        assert_eq!(report.stat(CharacteristicId::RANGE), 0.0);

        let shown = report.display_stats(StatRegistry::standard());
        assert_eq!(shown.len(), 4);
        assert_eq!(shown[3], ("Vitality".to_string(), 30.0));
    }

    #[test]
    fn test_report_serializes() {
        let (items, panoplies) = fixture();
        let base = BaseStats::default();
        let model = ModelBuilder::new(&items, &panoplies).build();
        let assignment = Assignment::from_set([VarKey::Item(3)]);

        let report = SolutionProjector::new(&items, &panoplies, &base).report(&model, &assignment, &StatMap::new());
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["solution"]["selected_item_ids"][0], 3);
        assert_eq!(json["items"][0]["slot"], "Ring");
    }
}
