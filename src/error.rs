//! Error types for loading, model building and solving.
//!
//! Table contract violations and solver outcomes are `LoadoutError`
//! variants. Malformed configuration entries are `EntryError`s, which the
//! configuration layer logs and skips.

use std::time::Duration;
use thiserror::Error;

/// Errors that end an optimization run.
///
/// # Examples
///
/// ```rust
/// use loadout_opt::LoadoutError;
///
/// let err = LoadoutError::MissingColumn {
///     table: "items",
///     column: "level".into(),
///     row: 3,
/// };
/// assert_eq!(err.to_string(), "items table: row 3 is missing column `level`");
/// ```
#[derive(Debug, Error)]
pub enum LoadoutError {
    /// A required column is absent from a table row.
    #[error("{table} table: row {row} is missing column `{column}`")]
    MissingColumn {
        table: &'static str,
        column: String,
        row: usize,
    },

    /// A required cell holds a value of the wrong type.
    #[error("{table} table: row {row}, column `{column}`: {reason}")]
    InvalidCell {
        table: &'static str,
        column: String,
        row: usize,
        reason: String,
    },

    /// The table document is not a JSON array of records.
    #[error("Malformed table: {0}")]
    Table(#[from] serde_json::Error),

    /// The solver proved that no loadout satisfies every constraint.
    #[error("No loadout satisfies the constraints")]
    Infeasible,

    /// The solver did not finish within its time limit.
    #[error("No solution found within {limit:?}")]
    Timeout { limit: Duration },

    /// Any other solver failure.
    #[error("Solver failure: {0}")]
    Solver(String),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl LoadoutError {
    /// True for the two "no solution" outcomes, as opposed to bad input.
    pub fn is_no_solution(&self) -> bool {
        matches!(self, LoadoutError::Infeasible | LoadoutError::Timeout { .. })
    }
}

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// A malformed `characteristic:value` entry.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum EntryError {
    #[error("`{0}` has no `:` separator")]
    MissingSeparator(String),

    #[error("`{0}` does not name a characteristic")]
    InvalidCharacteristic(String),

    #[error("`{0}` does not carry a numeric value")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infeasible_and_timeout_are_distinct() {
        let infeasible = LoadoutError::Infeasible;
        let timeout = LoadoutError::Timeout {
            limit: Duration::from_secs(5),
        };
        assert!(infeasible.is_no_solution());
        assert!(timeout.is_no_solution());
        assert_ne!(infeasible.to_string(), timeout.to_string());
        assert!(timeout.to_string().contains("5s"));
    }

    #[test]
    fn test_entry_error_display() {
        let err = EntryError::MissingSeparator("13".into());
        assert!(err.to_string().contains("`13`"));
    }

    #[test]
    fn test_config_error_wraps() {
        let err: LoadoutError = ConfigError::Invalid("max_level < min_level".into()).into();
        assert!(err.to_string().contains("max_level"));
        assert!(!err.is_no_solution());
    }
}
