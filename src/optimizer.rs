//! One-call optimization pipeline.
//!
//! ```text
//! tables -> eligible catalog -> predicate index -> model -> solver -> report
//! ```

use crate::catalog::{EligibilityFilter, EquipmentCatalog, PanoplyCatalog};
use crate::condition::PredicateIndex;
use crate::config::OptimizerConfig;
use crate::error::LoadoutError;
use crate::model::{LoadoutModel, ModelBuilder};
use crate::registry::StatRegistry;
use crate::slot::SlotRules;
use crate::solution::{LoadoutReport, SolutionProjector};
use crate::solver::{LoadoutSolver, MilpSolver};
use crate::table;
use std::path::Path;
use tracing::info;

/// Runs the whole pipeline for one configuration.
///
/// Catalogs are filtered per run, so one `Optimizer` can be reused across
/// catalogs and one catalog across optimizers.
///
/// # Examples
///
/// ```rust
/// use loadout_opt::{CharacteristicId, Optimizer, OptimizerConfig};
///
/// let items = r#"[
///     {"id": 1, "name": "Gelano", "type": 9, "level": 60, "panoply": -1,
///      "condition": null, "characteristic_23": 1, "characteristic_13": 5},
///     {"id": 2, "name": "Chance ring", "type": 9, "level": 40, "panoply": -1,
///      "condition": "", "characteristic_13": 30},
///     {"id": 3, "name": "Old ring", "type": 9, "level": 10, "panoply": -1,
///      "condition": null, "characteristic_13": 10}
/// ]"#;
/// let config = OptimizerConfig::default()
///     .with_resource_minimum(CharacteristicId::AP, 6)
///     .with_resource_minimum(CharacteristicId::MP, 3)
///     .with_weight(CharacteristicId::CHANCE, 1.0);
///
/// let report = Optimizer::new(config).run_tables(items, "[]").unwrap();
///
/// // The MP minimum forces the Gelano in next to the best chance ring.
/// let ids: Vec<i64> = report.solution.selected_item_ids.iter().copied().collect();
/// assert_eq!(ids, vec![1, 2]);
/// assert_eq!(report.stat(CharacteristicId::CHANCE), 35.0);
/// ```
#[derive(Debug, Clone)]
pub struct Optimizer<S = MilpSolver> {
    config: OptimizerConfig,
    rules: SlotRules,
    registry: StatRegistry,
    solver: S,
}

impl Optimizer<MilpSolver> {
    /// An optimizer using the bundled MILP solver with the configured
    /// time limit.
    pub fn new(config: OptimizerConfig) -> Self {
        let solver = MilpSolver::new().with_time_limit(config.time_limit());
        Self {
            config,
            rules: SlotRules::standard(),
            registry: StatRegistry::standard().clone(),
            solver,
        }
    }

    /// Loads the configuration from a TOML file.
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, LoadoutError> {
        Ok(Self::new(OptimizerConfig::load(path)?))
    }
}

impl<S: LoadoutSolver> Optimizer<S> {
    /// Swap the solver backend.
    pub fn with_solver<T: LoadoutSolver>(self, solver: T) -> Optimizer<T> {
        Optimizer {
            config: self.config,
            rules: self.rules,
            registry: self.registry,
            solver,
        }
    }

    pub fn with_rules(mut self, rules: SlotRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_registry(mut self, registry: StatRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    pub fn registry(&self) -> &StatRegistry {
        &self.registry
    }

    /// Items this run may equip.
    pub fn eligible(&self, items: &EquipmentCatalog) -> EquipmentCatalog {
        let banned = self.config.banned();
        let filter = EligibilityFilter {
            levels: self.config.levels(),
            banned: &banned,
            rules: &self.rules,
            exclude_trophies: self.config.exclude_trophies,
        };
        let eligible = items.eligible(&filter);
        info!(
            event = "catalog_filtered",
            items = items.len(),
            eligible = eligible.len(),
            min_level = self.config.min_level,
            max_level = self.config.max_level,
        );
        eligible
    }

    /// The model a run would hand to the solver.
    pub fn build_model(&self, items: &EquipmentCatalog, panoplies: &PanoplyCatalog) -> LoadoutModel {
        self.model_for(&self.eligible(items), panoplies)
    }

    fn model_for(&self, eligible: &EquipmentCatalog, panoplies: &PanoplyCatalog) -> LoadoutModel {
        let predicates = PredicateIndex::build(eligible, &self.registry);
        ModelBuilder::new(eligible, panoplies)
            .rules(self.rules.clone())
            .weights(self.config.weights())
            .resource_minimums(self.config.resource_minimums())
            .base_stats(self.config.base_stats())
            .predicates(&predicates)
            .build()
    }

    /// Filter, build, solve and project.
    ///
    /// # Errors
    ///
    /// `Infeasible` or `Timeout` when no loadout was found, `Solver` for
    /// backend failures.
    pub fn run(
        &self,
        items: &EquipmentCatalog,
        panoplies: &PanoplyCatalog,
    ) -> Result<LoadoutReport, LoadoutError> {
        let eligible = self.eligible(items);
        let model = self.model_for(&eligible, panoplies);
        let assignment = self.solver.solve(&model)?;

        let base = self.config.base_stats();
        let report = SolutionProjector::new(&eligible, panoplies, &base).report(
            &model,
            &assignment,
            &self.config.weights(),
        );
        info!(
            event = "loadout_ready",
            items = report.items.len(),
            tiers = report.tiers.len(),
            objective = report.solution.objective_value,
            feasible = report.solution.feasible,
        );
        Ok(report)
    }

    /// [`run`](Self::run) over raw JSON tables. Table contract violations
    /// are reported before any model is built.
    pub fn run_tables(&self, items_json: &str, panoplies_json: &str) -> Result<LoadoutReport, LoadoutError> {
        let items = EquipmentCatalog::new(table::parse_items(items_json)?);
        let panoplies = PanoplyCatalog::new(table::parse_panoplies(panoplies_json)?);
        self.run(&items, &panoplies)
    }
}
