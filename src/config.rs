//! Run configuration.
//!
//! `OptimizerConfig` carries everything the caller decides: level range,
//! resource minimums, stat weights, base-stat overrides, banned items and
//! the solver time limit. It loads from TOML like any other settings file.
//!
//! Weights and overrides are written as `characteristic:value` strings
//! (`characteristic_13:1.5` or `13:1.5`). Malformed entries are logged and
//! skipped; they never fail a run.
//!
//! # Examples
//!
//! ```
//! use loadout_opt::{CharacteristicId, OptimizerConfig};
//! use std::time::Duration;
//!
//! let config = OptimizerConfig::from_toml_str(r#"
//!     max_level = 80
//!     weights = ["characteristic_13:1.0", "oops"]
//!     time_limit_secs = 30
//!
//!     [resource_minimums]
//!     1 = 7
//!     23 = 3
//! "#).unwrap();
//!
//! assert_eq!(config.time_limit(), Some(Duration::from_secs(30)));
//! assert_eq!(config.weights().len(), 1);
//! assert_eq!(config.resource_minimums()[&CharacteristicId::AP], 7);
//! // AP base is 5 below level 100
//! assert_eq!(config.base_stats().get(CharacteristicId::AP), 5.0);
//! ```

use crate::characteristic::CharacteristicId;
use crate::error::{ConfigError, EntryError};
use crate::item::{ItemId, StatMap};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

/// Items the catalog lists but no character can actually wear.
pub const DEFAULT_BANNED_ITEMS: &[ItemId] = &[
    2155, 2447, 8575, 9031, 27265, 27266, 27267, 27268, 27278, 27280, 27282, 27284,
];

/// Main run configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default, rename_all = "snake_case")]
pub struct OptimizerConfig {
    pub min_level: u32,
    pub max_level: u32,

    /// Minimum total per resource stat, keyed by characteristic (`1` or
    /// `characteristic_1`).
    pub resource_minimums: BTreeMap<String, i64>,

    /// Leave trophies and dofus out of the build.
    pub exclude_trophies: bool,

    /// `characteristic:weight` entries.
    pub weights: Vec<String>,

    /// `characteristic:value` entries replacing the level-based base stats.
    pub base_overrides: Vec<String>,

    pub banned_items: Vec<ItemId>,

    /// Solver wall-clock limit in seconds, fractions allowed; unbounded
    /// when absent.
    pub time_limit_secs: Option<f64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            min_level: 1,
            max_level: 200,
            resource_minimums: [
                (CharacteristicId::AP.to_string(), 9),
                (CharacteristicId::MP.to_string(), 4),
            ]
            .into_iter()
            .collect(),
            exclude_trophies: false,
            weights: Vec::new(),
            base_overrides: Vec::new(),
            banned_items: DEFAULT_BANNED_ITEMS.to_vec(),
            time_limit_secs: None,
        }
    }
}

impl OptimizerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns error if the file can't be read, holds invalid TOML, or
    /// describes an empty level range.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Parses configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings no run can use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_level > self.max_level {
            return Err(ConfigError::Invalid(format!(
                "min_level {} is above max_level {}",
                self.min_level, self.max_level
            )));
        }
        if let Some(secs) = self.time_limit_secs {
            if !secs.is_finite() || secs <= 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "time_limit_secs must be a positive number of seconds, got {secs}"
                )));
            }
        }
        Ok(())
    }

    pub fn with_levels(mut self, min_level: u32, max_level: u32) -> Self {
        self.min_level = min_level;
        self.max_level = max_level;
        self
    }

    pub fn with_resource_minimum(mut self, id: CharacteristicId, minimum: i64) -> Self {
        self.resource_minimums.insert(id.to_string(), minimum);
        self
    }

    pub fn with_weight(mut self, id: CharacteristicId, weight: f64) -> Self {
        self.weights.push(format!("{id}:{weight}"));
        self
    }

    pub fn with_base_override(mut self, id: CharacteristicId, value: f64) -> Self {
        self.base_overrides.push(format!("{id}:{value}"));
        self
    }

    pub fn with_banned_items(mut self, banned: impl IntoIterator<Item = ItemId>) -> Self {
        self.banned_items = banned.into_iter().collect();
        self
    }

    pub fn with_exclude_trophies(mut self, exclude: bool) -> Self {
        self.exclude_trophies = exclude;
        self
    }

    pub fn with_time_limit(mut self, limit: Duration) -> Self {
        self.time_limit_secs = Some(limit.as_secs_f64());
        self
    }

    pub fn levels(&self) -> RangeInclusive<u32> {
        self.min_level..=self.max_level
    }

    /// The limit as a `Duration`; zero, negative or non-finite values
    /// mean no limit.
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok())
    }

    pub fn banned(&self) -> BTreeSet<ItemId> {
        self.banned_items.iter().copied().collect()
    }

    /// Parsed resource minimums; keys that name no characteristic are
    /// skipped.
    pub fn resource_minimums(&self) -> BTreeMap<CharacteristicId, i64> {
        let mut minimums = BTreeMap::new();
        for (key, &minimum) in &self.resource_minimums {
            match key.parse::<CharacteristicId>() {
                Ok(id) => {
                    minimums.insert(id, minimum);
                }
                Err(_) => warn!(key = key.as_str(), "skipping unknown resource stat"),
            }
        }
        minimums
    }

    /// Parsed weights. Later entries for the same characteristic win.
    pub fn weights(&self) -> StatMap {
        collect_entries("weight", &self.weights)
    }

    /// Level-based base stats with the caller's overrides applied.
    pub fn base_stats(&self) -> BaseStats {
        let mut base = BaseStats::for_level(self.max_level);
        for (id, value) in collect_entries("base override", &self.base_overrides) {
            base.set(id, value);
        }
        base
    }
}

/// Parse one `characteristic:value` entry.
///
/// # Examples
///
/// ```rust
/// use loadout_opt::config::parse_entry;
/// use loadout_opt::{CharacteristicId, EntryError};
///
/// assert_eq!(parse_entry("characteristic_13:1.5"), Ok((CharacteristicId::CHANCE, 1.5)));
/// assert_eq!(parse_entry("13"), Err(EntryError::MissingSeparator("13".into())));
/// ```
pub fn parse_entry(entry: &str) -> Result<(CharacteristicId, f64), EntryError> {
    let (id, value) = entry
        .split_once(':')
        .ok_or_else(|| EntryError::MissingSeparator(entry.to_string()))?;
    let id: CharacteristicId = id
        .parse()
        .map_err(|_| EntryError::InvalidCharacteristic(entry.to_string()))?;
    let value: f64 = value
        .trim()
        .parse()
        .ok()
        .filter(|v: &f64| v.is_finite())
        .ok_or_else(|| EntryError::InvalidValue(entry.to_string()))?;
    Ok((id, value))
}

fn collect_entries(kind: &str, entries: &[String]) -> StatMap {
    let mut parsed = BTreeMap::new();
    for entry in entries {
        match parse_entry(entry) {
            Ok((id, value)) => {
                parsed.insert(id, value);
            }
            Err(err) => warn!(kind, %err, "skipping malformed entry"),
        }
    }
    parsed
}

/// Stats a character has before any equipment.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BaseStats {
    values: StatMap,
}

impl BaseStats {
    /// The game's defaults: 6 AP from level 100 (5 below), 2 MP.
    pub fn for_level(max_level: u32) -> Self {
        let ap = if max_level >= 100 { 6.0 } else { 5.0 };
        let values = [(CharacteristicId::AP, ap), (CharacteristicId::MP, 2.0)]
            .into_iter()
            .collect();
        Self { values }
    }

    pub fn get(&self, id: CharacteristicId) -> f64 {
        self.values.get(&id).copied().unwrap_or(0.0)
    }

    pub fn set(&mut self, id: CharacteristicId, value: f64) {
        self.values.insert(id, value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (CharacteristicId, f64)> + '_ {
        self.values.iter().map(|(&id, &value)| (id, value))
    }
}
