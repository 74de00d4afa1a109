//! # loadout-opt - Optimal Equipment Loadouts as 0/1 Linear Programs
//!
//! Picks the equipment loadout that maximizes a weighted sum of character
//! stats while respecting:
//! - **Slot capacity** (two rings, one weapon, six trophies/dofus, ...)
//! - **Set bonuses** activated by the number of equipped pieces
//! - **Resource minimums** on AP, MP or any other stat
//! - **Equip conditions** such as `CF>100`, solved jointly with the build
//!
//! ## Pipeline
//!
//! ```text
//! [item/set tables] → [EquipmentCatalog] → [ModelBuilder] → [LoadoutSolver] → [LoadoutReport]
//! ```
//!
//! 1. **Catalogs** filter items by level, ban list and slot whitelist
//! 2. **Conditions** are parsed into predicates with a reverse index
//! 3. **ModelBuilder** emits variables, constraints and the objective
//! 4. **MilpSolver** solves the model, optionally under a time limit
//! 5. **SolutionProjector** recomputes stat totals from the assignment
//!
//! ## Example
//!
//! ```rust
//! use loadout_opt::*;
//!
//! let ring = |id, chance| Item {
//!     id,
//!     name: format!("ring {id}"),
//!     slot: SlotType::RING,
//!     level: 50,
//!     panoply: None,
//!     condition: None,
//!     characteristics: [(CharacteristicId::CHANCE, chance)].into_iter().collect(),
//! };
//! let items = EquipmentCatalog::new(vec![ring(1, 20.0), ring(2, 30.0), ring(3, 10.0)]);
//!
//! let config = OptimizerConfig::default()
//!     .with_resource_minimum(CharacteristicId::AP, 6)
//!     .with_resource_minimum(CharacteristicId::MP, 2)
//!     .with_weight(CharacteristicId::CHANCE, 1.0);
//!
//! let report = Optimizer::new(config).run(&items, &PanoplyCatalog::default()).unwrap();
//! assert_eq!(report.solution.selected_item_ids.len(), 2);
//! assert_eq!(report.stat(CharacteristicId::CHANCE), 50.0);
//! ```
//!
//! ## Modules
//!
//! - [`characteristic`] - Characteristic identifiers
//! - [`registry`] - Condition codes and display names
//! - [`slot`] - Slot types and capacity rules
//! - [`item`] - Items and panoply sets
//! - [`table`] - Upstream table decoding
//! - [`catalog`] - Item and panoply catalogs
//! - [`condition`] - Equip condition parsing
//! - [`config`] - Run configuration
//! - [`model`] - Model construction
//! - [`solver`] - Solver adapter
//! - [`solution`] - Solution projection and reports
//! - [`optimizer`] - End-to-end pipeline
//! - [`error`] - Error types

pub mod catalog;
pub mod characteristic;
pub mod condition;
pub mod config;
pub mod error;
pub mod item;
pub mod model;
pub mod optimizer;
pub mod registry;
pub mod slot;
pub mod solution;
pub mod solver;
pub mod table;

// Re-export main types for convenience
pub use catalog::{EligibilityFilter, EquipmentCatalog, PanoplyCatalog};
pub use characteristic::CharacteristicId;
pub use condition::{Comparison, ConditionPredicate, PredicateIndex};
pub use config::{BaseStats, OptimizerConfig};
pub use error::{ConfigError, EntryError, LoadoutError};
pub use item::{Item, ItemId, PanoplyId, PanoplySet, StatMap, TierBonuses};
pub use optimizer::Optimizer;
pub use registry::StatRegistry;
pub use slot::{SlotRules, SlotType};

// Re-export model and solver types
pub use model::{Assignment, LoadoutModel, ModelBuilder, VarKey};
pub use solution::{LoadoutReport, Solution, SolutionProjector};
pub use solver::{LoadoutSolver, MilpSolver};
