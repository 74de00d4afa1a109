//! Solver adapter.
//!
//! `LoadoutSolver` is the seam to the external 0/1 integer program solver.
//! `MilpSolver` lowers a `LoadoutModel` into `good_lp` and solves it with
//! the pure-Rust `microlp` backend, which enforces the time limit itself.

use crate::error::LoadoutError;
use crate::model::{Assignment, LoadoutModel, Sense, VarKey};
use good_lp::solvers::{SolutionStatus, WithTimeLimit};
use good_lp::{
    constraint, microlp, variable, Expression, ProblemVariables, ResolutionError, Solution,
    SolverModel, Variable,
};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Values above this count as 1 when reading binaries back.
pub const BINARY_THRESHOLD: f64 = 0.5;

/// Slack allowed for constraints without variables.
const CONSTANT_TOLERANCE: f64 = 1e-9;

/// Anything that can solve a `LoadoutModel` to optimality.
pub trait LoadoutSolver {
    /// Solve the model.
    ///
    /// # Errors
    ///
    /// `LoadoutError::Infeasible` when no assignment satisfies the model,
    /// `LoadoutError::Timeout` when the limit expires before optimality is
    /// proven, and `LoadoutError::Solver` for any other backend failure.
    fn solve(&self, model: &LoadoutModel) -> Result<Assignment, LoadoutError>;
}

/// Branch-and-bound MILP solver backed by `good_lp` + `microlp`.
///
/// # Examples
///
/// ```rust
/// use loadout_opt::model::{ModelBuilder, VarKey};
/// use loadout_opt::solver::{LoadoutSolver, MilpSolver};
/// use loadout_opt::{CharacteristicId, EquipmentCatalog, Item, PanoplyCatalog, SlotType};
/// use std::time::Duration;
///
/// let hat = |id, wisdom| Item {
///     id,
///     name: format!("hat {id}"),
///     slot: SlotType::HAT,
///     level: 1,
///     panoply: None,
///     condition: None,
///     characteristics: [(CharacteristicId::WISDOM, wisdom)].into_iter().collect(),
/// };
/// let items = EquipmentCatalog::new(vec![hat(1, 10.0), hat(2, 30.0)]);
/// let panoplies = PanoplyCatalog::default();
/// let model = ModelBuilder::new(&items, &panoplies)
///     .weight(CharacteristicId::WISDOM, 1.0)
///     .build();
///
/// let solver = MilpSolver::new().with_time_limit(Some(Duration::from_secs(10)));
/// let assignment = solver.solve(&model).unwrap();
/// assert!(assignment.is_set(&VarKey::Item(2)));
/// assert!(!assignment.is_set(&VarKey::Item(1)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MilpSolver {
    time_limit: Option<Duration>,
}

impl MilpSolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bound the time the backend may spend searching.
    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit
    }
}

impl LoadoutSolver for MilpSolver {
    fn solve(&self, model: &LoadoutModel) -> Result<Assignment, LoadoutError> {
        check_constant_constraints(model)?;
        if model.variable_count() == 0 {
            return Ok(Assignment::default());
        }

        info!(
            event = "solve_start",
            variables = model.variable_count(),
            constraints = model.constraints().len(),
            time_limit_secs = self.time_limit.map(|d| d.as_secs_f64()),
        );
        let started = Instant::now();

        let result = solve_model(model, self.time_limit);

        match &result {
            Ok(assignment) => info!(
                event = "solve_end",
                status = "optimal",
                objective = model.objective_value(assignment),
                elapsed_secs = started.elapsed().as_secs_f64(),
            ),
            Err(err) => info!(
                event = "solve_end",
                status = %err,
                elapsed_secs = started.elapsed().as_secs_f64(),
            ),
        }
        result
    }
}

/// Constraints left without variables (e.g. a resource minimum no item can
/// feed) are decided here instead of being handed to the backend.
fn check_constant_constraints(model: &LoadoutModel) -> Result<(), LoadoutError> {
    let empty = Assignment::default();
    for constraint in model.constraints().iter().filter(|c| c.terms.is_empty()) {
        if !constraint.is_satisfied_by(&empty, CONSTANT_TOLERANCE) {
            warn!(constraint = constraint.name.as_str(), "constraint cannot be met by any loadout");
            return Err(LoadoutError::Infeasible);
        }
    }
    Ok(())
}

/// Whether a backend error reports an expired time limit.
fn is_time_limit_error(err: &ResolutionError) -> bool {
    match err {
        ResolutionError::Other(message) => message.to_ascii_lowercase().contains("time limit"),
        ResolutionError::Str(message) => message.to_ascii_lowercase().contains("time limit"),
        _ => false,
    }
}

fn solve_model(model: &LoadoutModel, time_limit: Option<Duration>) -> Result<Assignment, LoadoutError> {
    let mut problem_vars = ProblemVariables::new();
    let handles: BTreeMap<VarKey, Variable> = model
        .variables()
        .map(|key| {
            let var = problem_vars.add(variable().binary().name(key.to_string()));
            (key.clone(), var)
        })
        .collect();

    let linear = |terms: &BTreeMap<VarKey, f64>| -> Expression {
        terms
            .iter()
            .filter_map(|(key, &coefficient)| {
                handles
                    .get(key)
                    .map(|&var| Expression::from(var) * coefficient)
            })
            .sum()
    };

    let objective = linear(model.objective());
    let mut problem = problem_vars.maximise(objective).using(microlp);
    if let Some(limit) = time_limit {
        problem = problem.with_time_limit(limit.as_secs_f64());
    }

    for c in model.constraints().iter().filter(|c| !c.terms.is_empty()) {
        let lhs = linear(&c.terms);
        let lowered = match c.sense {
            Sense::LessEqual => constraint::leq(lhs, c.rhs),
            Sense::GreaterEqual => constraint::geq(lhs, c.rhs),
            Sense::Equal => constraint::eq(lhs, c.rhs),
        };
        problem.add_constraint(lowered);
    }

    let solution = problem.solve().map_err(|err| match (err, time_limit) {
        (ResolutionError::Infeasible, _) => LoadoutError::Infeasible,
        (err, Some(limit)) if is_time_limit_error(&err) => LoadoutError::Timeout { limit },
        (other, _) => LoadoutError::Solver(other.to_string()),
    })?;

    // An incumbent found before the limit is not a proven optimum.
    if let (SolutionStatus::TimeLimit, Some(limit)) = (solution.status(), time_limit) {
        warn!(limit_secs = limit.as_secs_f64(), "solver time limit reached");
        return Err(LoadoutError::Timeout { limit });
    }

    Ok(Assignment::from_set(
        handles
            .iter()
            .filter(|(_, &var)| solution.value(var) > BINARY_THRESHOLD)
            .map(|(key, _)| key.clone()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{EquipmentCatalog, PanoplyCatalog};
    use crate::characteristic::CharacteristicId;
    use crate::item::Item;
    use crate::model::ModelBuilder;
    use crate::slot::SlotType;

    fn boots(id: i64, mp: f64) -> Item {
        Item {
            id,
            name: format!("boots {id}"),
            slot: SlotType::BOOTS,
            level: 1,
            panoply: None,
            condition: None,
            characteristics: [(CharacteristicId::MP, mp)].into_iter().collect(),
        }
    }

    #[test]
    fn test_unreachable_minimum_is_infeasible() {
        let items = EquipmentCatalog::new(vec![boots(1, 1.0), boots(2, 1.0)]);
        let panoplies = PanoplyCatalog::default();
        // One boots slot: at most +1 MP.
        let model = ModelBuilder::new(&items, &panoplies)
            .resource_minimum(CharacteristicId::MP, 2)
            .build();

        let err = MilpSolver::new().solve(&model).unwrap_err();
        assert!(matches!(err, LoadoutError::Infeasible));
    }

    #[test]
    fn test_constant_constraint_short_circuits() {
        let items = EquipmentCatalog::new(vec![boots(1, 1.0)]);
        let panoplies = PanoplyCatalog::default();
        let model = ModelBuilder::new(&items, &panoplies)
            .resource_minimum(CharacteristicId::AP, 1)
            .build();

        assert!(matches!(check_constant_constraints(&model), Err(LoadoutError::Infeasible)));
    }

    #[test]
    fn test_empty_model_solves() {
        let items = EquipmentCatalog::default();
        let panoplies = PanoplyCatalog::default();
        let model = ModelBuilder::new(&items, &panoplies).build();

        let assignment = MilpSolver::new().solve(&model).unwrap();
        assert_eq!(assignment.iter().count(), 0);
    }

    #[test]
    fn test_time_limit_path_returns_result() {
        let items = EquipmentCatalog::new(vec![boots(1, 1.0), boots(2, 2.0)]);
        let panoplies = PanoplyCatalog::default();
        let model = ModelBuilder::new(&items, &panoplies)
            .weight(CharacteristicId::MP, 1.0)
            .build();

        let solver = MilpSolver::new().with_time_limit(Some(Duration::from_secs(30)));
        let assignment = solver.solve(&model).unwrap();
        assert!(assignment.is_set(&VarKey::Item(2)));
    }

    #[test]
    fn test_time_limit_errors_are_recognized() {
        assert!(is_time_limit_error(&ResolutionError::Other("Time limit reached")));
        assert!(is_time_limit_error(&ResolutionError::Str("hit the TIME LIMIT".into())));
        assert!(!is_time_limit_error(&ResolutionError::Other("numerical trouble")));
        assert!(!is_time_limit_error(&ResolutionError::Unbounded));
    }
}
