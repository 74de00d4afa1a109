//! Loadout model construction.
//!
//! `ModelBuilder` turns the eligible catalog into a 0/1 linear program:
//!
//! ```text
//! x[item]      is the item equipped
//! y[set, k]    is the k-piece bonus of the set active      (2 <= k <= pieces)
//! z[predicate] does the build satisfy the equip predicate
//! ```
//!
//! Constraints cover slot capacity, set-tier feasibility, resource minimums
//! and big-M gating of conditional items. The objective is the weighted sum
//! of item and tier contributions.
//!
//! The model is solver independent: terms are sparse maps keyed by
//! `VarKey`, so two builds over the same inputs compare equal.

use crate::catalog::{EquipmentCatalog, PanoplyCatalog};
use crate::characteristic::CharacteristicId;
use crate::condition::{Comparison, ConditionPredicate, PredicateIndex};
use crate::config::BaseStats;
use crate::item::{ItemId, PanoplyId, StatMap};
use crate::registry::StatRegistry;
use crate::slot::SlotRules;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::{debug, info};

/// Decision variable key. Every variable is binary.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum VarKey {
    /// Item is equipped.
    Item(ItemId),
    /// Set bonus tier is active.
    Tier { panoply: PanoplyId, tier: u32 },
    /// Predicate holds for the build.
    Gate(ConditionPredicate),
}

impl fmt::Display for VarKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarKey::Item(id) => write!(f, "item_{id}"),
            VarKey::Tier { panoply, tier } => write!(f, "bonus_{panoply}_{tier}"),
            VarKey::Gate(predicate) => write!(f, "gate_{predicate}"),
        }
    }
}

/// Linear expression: variable -> coefficient.
pub type Terms = BTreeMap<VarKey, f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sense {
    LessEqual,
    GreaterEqual,
    Equal,
}

/// `terms sense rhs`, with a name for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearConstraint {
    pub name: String,
    pub terms: Terms,
    pub sense: Sense,
    pub rhs: f64,
}

impl LinearConstraint {
    fn new(name: impl Into<String>, terms: Terms, sense: Sense, rhs: f64) -> Self {
        Self {
            name: name.into(),
            terms,
            sense,
            rhs,
        }
    }

    /// Left-hand side under an assignment.
    pub fn lhs(&self, assignment: &Assignment) -> f64 {
        self.terms
            .iter()
            .filter(|(key, _)| assignment.is_set(key))
            .map(|(_, coefficient)| coefficient)
            .sum()
    }

    pub fn is_satisfied_by(&self, assignment: &Assignment, tolerance: f64) -> bool {
        let lhs = self.lhs(assignment);
        match self.sense {
            Sense::LessEqual => lhs <= self.rhs + tolerance,
            Sense::GreaterEqual => lhs >= self.rhs - tolerance,
            Sense::Equal => (lhs - self.rhs).abs() <= tolerance,
        }
    }
}

/// Values the solver chose for the binary variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Assignment {
    set: BTreeSet<VarKey>,
}

impl Assignment {
    /// An assignment with exactly `keys` at 1.
    pub fn from_set(keys: impl IntoIterator<Item = VarKey>) -> Self {
        Self {
            set: keys.into_iter().collect(),
        }
    }

    pub fn is_set(&self, key: &VarKey) -> bool {
        self.set.contains(key)
    }

    /// Variables at 1, in key order.
    pub fn iter(&self) -> impl Iterator<Item = &VarKey> {
        self.set.iter()
    }
}

/// A fully specified optimization problem, built once per run.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadoutModel {
    variables: BTreeSet<VarKey>,
    constraints: Vec<LinearConstraint>,
    objective: Terms,
    big_m: BTreeMap<ConditionPredicate, f64>,
}

impl LoadoutModel {
    pub fn variables(&self) -> impl Iterator<Item = &VarKey> {
        self.variables.iter()
    }

    pub fn variable_count(&self) -> usize {
        self.variables.len()
    }

    pub fn contains(&self, key: &VarKey) -> bool {
        self.variables.contains(key)
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn constraint(&self, name: &str) -> Option<&LinearConstraint> {
        self.constraints.iter().find(|c| c.name == name)
    }

    /// Objective coefficients (maximised).
    pub fn objective(&self) -> &Terms {
        &self.objective
    }

    pub fn objective_value(&self, assignment: &Assignment) -> f64 {
        self.objective
            .iter()
            .filter(|(key, _)| assignment.is_set(key))
            .map(|(_, coefficient)| coefficient)
            .sum()
    }

    /// Tier variables in key order.
    pub fn tier_keys(&self) -> impl Iterator<Item = (PanoplyId, u32)> + '_ {
        self.variables.iter().filter_map(|key| match key {
            VarKey::Tier { panoply, tier } => Some((*panoply, *tier)),
            _ => None,
        })
    }

    /// Gating predicates in key order.
    pub fn gates(&self) -> impl Iterator<Item = &ConditionPredicate> {
        self.variables.iter().filter_map(|key| match key {
            VarKey::Gate(predicate) => Some(predicate),
            _ => None,
        })
    }

    /// The big-M constant used to relax a predicate's gating constraints.
    pub fn big_m(&self, predicate: &ConditionPredicate) -> Option<f64> {
        self.big_m.get(predicate).copied()
    }

    /// Constraints the assignment violates.
    pub fn violations<'a>(
        &'a self,
        assignment: &'a Assignment,
        tolerance: f64,
    ) -> impl Iterator<Item = &'a LinearConstraint> + 'a {
        self.constraints
            .iter()
            .filter(move |c| !c.is_satisfied_by(assignment, tolerance))
    }
}

/// Builds a `LoadoutModel` from an eligible catalog.
///
/// The catalog must already be filtered (levels, bans, slot whitelist);
/// every item in it gets a selection variable.
///
/// # Examples
///
/// ```rust
/// use loadout_opt::model::{ModelBuilder, VarKey};
/// use loadout_opt::{CharacteristicId, EquipmentCatalog, Item, PanoplyCatalog, SlotType};
///
/// let ring = |id, chance| Item {
///     id,
///     name: format!("ring {id}"),
///     slot: SlotType::RING,
///     level: 1,
///     panoply: None,
///     condition: None,
///     characteristics: [(CharacteristicId::CHANCE, chance)].into_iter().collect(),
/// };
/// let items = EquipmentCatalog::new(vec![ring(1, 10.0), ring(2, 20.0)]);
/// let panoplies = PanoplyCatalog::default();
///
/// let model = ModelBuilder::new(&items, &panoplies)
///     .weight(CharacteristicId::CHANCE, 2.0)
///     .build();
///
/// assert_eq!(model.variable_count(), 2);
/// assert_eq!(model.objective()[&VarKey::Item(2)], 40.0);
/// assert!(model.constraint("slot_9").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct ModelBuilder<'a> {
    items: &'a EquipmentCatalog,
    panoplies: &'a PanoplyCatalog,
    predicates: Option<&'a PredicateIndex>,
    rules: SlotRules,
    weights: StatMap,
    resource_minimums: BTreeMap<CharacteristicId, i64>,
    base: BaseStats,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(items: &'a EquipmentCatalog, panoplies: &'a PanoplyCatalog) -> Self {
        Self {
            items,
            panoplies,
            predicates: None,
            rules: SlotRules::standard(),
            weights: StatMap::new(),
            resource_minimums: BTreeMap::new(),
            base: BaseStats::default(),
        }
    }

    pub fn rules(mut self, rules: SlotRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn weights(mut self, weights: StatMap) -> Self {
        self.weights = weights;
        self
    }

    pub fn weight(mut self, id: CharacteristicId, weight: f64) -> Self {
        self.weights.insert(id, weight);
        self
    }

    pub fn resource_minimums(mut self, minimums: BTreeMap<CharacteristicId, i64>) -> Self {
        self.resource_minimums = minimums;
        self
    }

    pub fn resource_minimum(mut self, id: CharacteristicId, minimum: i64) -> Self {
        self.resource_minimums.insert(id, minimum);
        self
    }

    pub fn base_stats(mut self, base: BaseStats) -> Self {
        self.base = base;
        self
    }

    /// Reverse index of equip predicates over the same catalog. Without
    /// one, `build` indexes the catalog with the standard registry.
    pub fn predicates(mut self, predicates: &'a PredicateIndex) -> Self {
        self.predicates = Some(predicates);
        self
    }

    pub fn build(&self) -> LoadoutModel {
        let mut model = LoadoutModel {
            variables: BTreeSet::new(),
            constraints: Vec::new(),
            objective: Terms::new(),
            big_m: BTreeMap::new(),
        };

        model
            .variables
            .extend(self.items.ids().map(VarKey::Item));

        let set_members = self.eligible_sets();
        for (&panoply, members) in &set_members {
            for tier in 2..=members.len() as u32 {
                model.variables.insert(VarKey::Tier { panoply, tier });
            }
        }

        let stat_terms = self.stat_terms(&set_members);

        let indexed;
        let predicates = match self.predicates {
            Some(predicates) => predicates,
            None => {
                indexed = PredicateIndex::build(self.items, StatRegistry::standard());
                &indexed
            }
        };

        self.add_slot_constraints(&mut model);
        self.add_tier_constraints(&mut model, &set_members);
        self.add_resource_constraints(&mut model, &stat_terms);
        self.add_gating_constraints(&mut model, predicates, &stat_terms);
        self.set_objective(&mut model, &stat_terms);

        info!(
            event = "model_built",
            items = self.items.len(),
            sets = set_members.len(),
            gates = model.big_m.len(),
            variables = model.variables.len(),
            constraints = model.constraints.len(),
        );
        model
    }

    /// Sets with at least two eligible pieces.
    fn eligible_sets(&self) -> BTreeMap<PanoplyId, Vec<ItemId>> {
        let mut sets = self.items.by_panoply(self.panoplies);
        sets.retain(|_, members| members.len() >= 2);
        sets
    }

    /// Per characteristic: every variable contributing to it and by how much.
    fn stat_terms(
        &self,
        set_members: &BTreeMap<PanoplyId, Vec<ItemId>>,
    ) -> BTreeMap<CharacteristicId, Terms> {
        let mut terms: BTreeMap<CharacteristicId, Terms> = BTreeMap::new();
        for item in self.items.iter() {
            for (&id, &value) in &item.characteristics {
                if value != 0.0 {
                    terms.entry(id).or_default().insert(VarKey::Item(item.id), value);
                }
            }
        }
        for (&panoply, members) in set_members {
            let Some(set) = self.panoplies.get(panoply) else {
                continue;
            };
            for tier in 2..=members.len() as u32 {
                let Some(bonuses) = set.bonuses.tier(tier) else {
                    continue;
                };
                for (&id, &value) in bonuses {
                    if value != 0.0 {
                        terms
                            .entry(id)
                            .or_default()
                            .insert(VarKey::Tier { panoply, tier }, value);
                    }
                }
            }
        }
        terms
    }

    fn add_slot_constraints(&self, model: &mut LoadoutModel) {
        let mut weapons = Terms::new();
        let mut trophies = Terms::new();

        for (slot, ids) in self.items.by_slot() {
            let group: Terms = ids.iter().map(|&id| (VarKey::Item(id), 1.0)).collect();
            if self.rules.is_weapon(slot) {
                weapons.extend(group.clone());
            }
            if self.rules.is_trophy(slot) {
                trophies.extend(group.clone());
            }
            if let Some(limit) = self.rules.individual_limit(slot) {
                model.constraints.push(LinearConstraint::new(
                    format!("slot_{}", slot.0),
                    group,
                    Sense::LessEqual,
                    f64::from(limit),
                ));
            }
        }

        if !weapons.is_empty() {
            model.constraints.push(LinearConstraint::new(
                "weapon_group",
                weapons,
                Sense::LessEqual,
                f64::from(self.rules.weapon_limit),
            ));
        }
        if !trophies.is_empty() {
            model.constraints.push(LinearConstraint::new(
                "trophy_group",
                trophies,
                Sense::LessEqual,
                f64::from(self.rules.trophy_limit),
            ));
        }
        debug!(constraints = model.constraints.len(), "slot capacity constraints added");
    }

    /// `k * y[set, k] - sum(x[set members]) <= 0`: tier k needs k pieces.
    fn add_tier_constraints(
        &self,
        model: &mut LoadoutModel,
        set_members: &BTreeMap<PanoplyId, Vec<ItemId>>,
    ) {
        let mut added = 0usize;
        for (&panoply, members) in set_members {
            for tier in 2..=members.len() as u32 {
                let mut terms: Terms = members.iter().map(|&id| (VarKey::Item(id), -1.0)).collect();
                terms.insert(VarKey::Tier { panoply, tier }, f64::from(tier));
                model.constraints.push(LinearConstraint::new(
                    format!("panoply_{panoply}_tier_{tier}"),
                    terms,
                    Sense::LessEqual,
                    0.0,
                ));
                added += 1;
            }
        }
        debug!(constraints = added, "set tier constraints added");
    }

    /// Equipment plus active tiers must cover `minimum - base`.
    fn add_resource_constraints(
        &self,
        model: &mut LoadoutModel,
        stat_terms: &BTreeMap<CharacteristicId, Terms>,
    ) {
        for (&id, &minimum) in &self.resource_minimums {
            let terms = stat_terms.get(&id).cloned().unwrap_or_default();
            let rhs = minimum as f64 - self.base.get(id);
            model.constraints.push(LinearConstraint::new(
                format!("resource_{id}"),
                terms,
                Sense::GreaterEqual,
                rhs,
            ));
        }
    }

    /// Big-M gating of conditional items.
    ///
    /// With `T` the build's total of the predicate's stat and `z` its gate:
    ///
    /// ```text
    /// >   T >= t + 1 - M(1 - z)
    /// >=  T >= t     - M(1 - z)
    /// <   T <= t - 1 + M(1 - z)
    /// <=  T <= t     + M(1 - z)
    /// =   both of the inclusive forms
    /// ```
    ///
    /// and every item requiring the predicate is capped by `z`. `M` bounds
    /// how far `T` can sit from the threshold, so `z = 0` always relaxes.
    fn add_gating_constraints(
        &self,
        model: &mut LoadoutModel,
        predicates: &PredicateIndex,
        stat_terms: &BTreeMap<CharacteristicId, Terms>,
    ) {
        for (predicate, holders) in predicates.iter() {
            let holders: Vec<ItemId> = holders
                .iter()
                .copied()
                .filter(|&id| self.items.get(id).is_some())
                .collect();
            if holders.is_empty() {
                continue;
            }

            let gate = VarKey::Gate(predicate.clone());
            let stat = stat_terms.get(&predicate.characteristic).cloned().unwrap_or_default();
            let base = self.base.get(predicate.characteristic);
            let threshold = predicate.threshold as f64;
            let magnitude: f64 = stat.values().map(|v| v.abs()).sum();
            let big_m = magnitude + base.abs() + threshold.abs() + 1.0;

            let lower = match predicate.comparison {
                Comparison::Greater => Some(threshold + 1.0),
                Comparison::GreaterEqual | Comparison::Equal => Some(threshold),
                _ => None,
            };
            let upper = match predicate.comparison {
                Comparison::Less => Some(threshold - 1.0),
                Comparison::LessEqual | Comparison::Equal => Some(threshold),
                _ => None,
            };

            // T - M z >= bound - base - M
            if let Some(bound) = lower {
                let mut terms = stat.clone();
                terms.insert(gate.clone(), -big_m);
                model.constraints.push(LinearConstraint::new(
                    format!("gate_{predicate}_lower"),
                    terms,
                    Sense::GreaterEqual,
                    bound - base - big_m,
                ));
            }
            // T + M z <= bound - base + M
            if let Some(bound) = upper {
                let mut terms = stat.clone();
                terms.insert(gate.clone(), big_m);
                model.constraints.push(LinearConstraint::new(
                    format!("gate_{predicate}_upper"),
                    terms,
                    Sense::LessEqual,
                    bound - base + big_m,
                ));
            }

            let mut link: Terms = holders.iter().map(|&id| (VarKey::Item(id), 1.0)).collect();
            link.insert(gate.clone(), -(holders.len() as f64));
            model.constraints.push(LinearConstraint::new(
                format!("gate_{predicate}_link"),
                link,
                Sense::LessEqual,
                0.0,
            ));

            debug!(%predicate, holders = holders.len(), big_m, "gating constraints added");
            model.variables.insert(gate);
            model.big_m.insert(predicate.clone(), big_m);
        }
    }

    /// Weighted contributions; unknown or unweighted characteristics add 0.
    fn set_objective(
        &self,
        model: &mut LoadoutModel,
        stat_terms: &BTreeMap<CharacteristicId, Terms>,
    ) {
        for (id, &weight) in &self.weights {
            if weight == 0.0 {
                continue;
            }
            let Some(terms) = stat_terms.get(id) else {
                continue;
            };
            for (key, &value) in terms {
                *model.objective.entry(key.clone()).or_insert(0.0) += weight * value;
            }
        }
        model.objective.retain(|_, coefficient| *coefficient != 0.0);
    }
}
