//! Equip condition parsing.
//!
//! Items may carry a free-form requirement string such as
//! `CF>100&(CI>100|CA>100)&CP<12`. Only atomic stat thresholds are kept:
//! each `code op integer` token whose code the registry knows becomes a
//! `ConditionPredicate`. Everything else is ignored.
//!
//! Separators are not interpreted. A string that offers alternatives
//! (`CI>100|CA>100`) gates the item on all of them, which can only
//! over-restrict a build, never admit an unwearable item.

use crate::catalog::EquipmentCatalog;
use crate::characteristic::CharacteristicId;
use crate::item::ItemId;
use crate::registry::StatRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use tracing::trace;

/// Threshold comparison operator.
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Comparison {
    Less,
    LessEqual,
    Equal,
    GreaterEqual,
    Greater,
}

impl Comparison {
    pub fn symbol(self) -> &'static str {
        match self {
            Comparison::Less => "<",
            Comparison::LessEqual => "<=",
            Comparison::Equal => "=",
            Comparison::GreaterEqual => ">=",
            Comparison::Greater => ">",
        }
    }

    /// Whether `value op threshold` holds.
    pub fn holds(self, value: f64, threshold: i64) -> bool {
        let threshold = threshold as f64;
        match self {
            Comparison::Less => value < threshold,
            Comparison::LessEqual => value <= threshold,
            Comparison::Equal => value == threshold,
            Comparison::GreaterEqual => value >= threshold,
            Comparison::Greater => value > threshold,
        }
    }
}

/// One atomic requirement, e.g. strength greater than 100.
///
/// Ordered and hashable so it can key the gating variables.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConditionPredicate {
    /// Canonical condition code, e.g. `CF`.
    pub code: String,
    pub characteristic: CharacteristicId,
    pub comparison: Comparison,
    pub threshold: i64,
}

impl ConditionPredicate {
    /// Whether a stat total satisfies this predicate.
    pub fn is_satisfied_by(&self, total: f64) -> bool {
        self.comparison.holds(total, self.threshold)
    }
}

impl fmt::Display for ConditionPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.code, self.comparison.symbol(), self.threshold)
    }
}

fn is_separator(c: char) -> bool {
    matches!(c, '&' | '|' | '(' | ')' | ',' | ';') || c.is_whitespace()
}

/// Parse a raw condition into its distinct predicates.
///
/// Unknown codes, unsupported operators and malformed thresholds are
/// skipped; this never fails.
///
/// # Examples
///
/// ```rust
/// use loadout_opt::condition::parse_condition;
/// use loadout_opt::StatRegistry;
///
/// let registry = StatRegistry::standard();
/// let predicates = parse_condition("CS>100&CF>100&PG=1&CP<12", registry);
///
/// let canonical: Vec<String> = predicates.iter().map(|p| p.to_string()).collect();
/// assert_eq!(canonical, vec!["CF>100", "CP<12"]);
/// ```
pub fn parse_condition(raw: &str, registry: &StatRegistry) -> BTreeSet<ConditionPredicate> {
    raw.split(is_separator)
        .filter(|token| !token.is_empty())
        .filter_map(|token| {
            let predicate = parse_token(token, registry);
            if predicate.is_none() {
                trace!(token, "ignoring condition token");
            }
            predicate
        })
        .collect()
}

fn parse_token(token: &str, registry: &StatRegistry) -> Option<ConditionPredicate> {
    let op_start = token.find(|c| matches!(c, '<' | '>' | '=' | '!' | '~'))?;
    let (code, rest) = token.split_at(op_start);

    let (comparison, digits) = if let Some(d) = rest.strip_prefix("<=") {
        (Comparison::LessEqual, d)
    } else if let Some(d) = rest.strip_prefix(">=") {
        (Comparison::GreaterEqual, d)
    } else if let Some(d) = rest.strip_prefix('<') {
        (Comparison::Less, d)
    } else if let Some(d) = rest.strip_prefix('>') {
        (Comparison::Greater, d)
    } else if let Some(d) = rest.strip_prefix('=') {
        (Comparison::Equal, d)
    } else {
        return None;
    };

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let threshold: i64 = digits.parse().ok()?;
    let characteristic = registry.characteristic_for(code)?;
    let code = registry.canonical_code(code)?.to_string();

    Some(ConditionPredicate {
        code,
        characteristic,
        comparison,
        threshold,
    })
}

/// Reverse index: predicate -> ids of the items that require it.
///
/// Built once over the eligible catalog so the model builder never
/// re-scans items per predicate.
///
/// # Examples
///
/// ```rust
/// use loadout_opt::{EquipmentCatalog, Item, PredicateIndex, SlotType, StatRegistry};
/// use std::collections::BTreeMap;
///
/// let gated = |id, condition: &str| Item {
///     id,
///     name: format!("item {id}"),
///     slot: SlotType::HAT,
///     level: 1,
///     panoply: None,
///     condition: Some(condition.to_string()),
///     characteristics: BTreeMap::new(),
/// };
/// let catalog = EquipmentCatalog::new(vec![gated(1, "CF>100"), gated(2, "CS>100&CI<5")]);
///
/// let index = PredicateIndex::build(&catalog, StatRegistry::standard());
/// assert_eq!(index.len(), 2);
/// let (strength, holders) = index.iter().next().unwrap();
/// assert_eq!(strength.to_string(), "CF>100");
/// assert_eq!(holders.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredicateIndex {
    holders: BTreeMap<ConditionPredicate, BTreeSet<ItemId>>,
}

impl PredicateIndex {
    pub fn build(catalog: &EquipmentCatalog, registry: &StatRegistry) -> Self {
        let mut holders: BTreeMap<ConditionPredicate, BTreeSet<ItemId>> = BTreeMap::new();
        for item in catalog.iter() {
            let Some(raw) = item.condition.as_deref() else {
                continue;
            };
            for predicate in parse_condition(raw, registry) {
                holders.entry(predicate).or_default().insert(item.id);
            }
        }
        Self { holders }
    }

    /// Items that require `predicate`.
    pub fn holders(&self, predicate: &ConditionPredicate) -> Option<&BTreeSet<ItemId>> {
        self.holders.get(predicate)
    }

    /// Predicates in canonical order with their holders.
    pub fn iter(&self) -> impl Iterator<Item = (&ConditionPredicate, &BTreeSet<ItemId>)> {
        self.holders.iter()
    }

    pub fn len(&self) -> usize {
        self.holders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.holders.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: &str) -> Vec<String> {
        parse_condition(raw, StatRegistry::standard())
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_all_operators() {
        assert_eq!(
            parse("CF<1&CI<=2&CA=3&CC>=4&CW>5"),
            vec!["CA=3", "CC>=4", "CF<1", "CI<=2", "CW>5"]
        );
    }

    #[test]
    fn test_empty_and_garbage() {
        assert!(parse("").is_empty());
        assert!(parse("   ").is_empty());
        assert!(parse("&&||()").is_empty());
        assert!(parse("CF>").is_empty());
        assert!(parse("CF>abc").is_empty());
        assert!(parse("CF>-5").is_empty());
        assert!(parse("PX=1&Pk>3").is_empty());
    }

    #[test]
    fn test_unsupported_operators_ignored() {
        assert!(parse("CF!100").is_empty());
        assert!(parse("CF~100").is_empty());
    }

    #[test]
    fn test_lowercase_code_and_whitespace() {
        assert_eq!(parse(" cf > 100 "), Vec::<String>::new());
        assert_eq!(parse("cf>100 , cp<12"), vec!["CF>100", "CP<12"]);
    }

    #[test]
    fn test_duplicates_collapse() {
        assert_eq!(parse("CF>100&CF>100|CS>100"), vec!["CF>100"]);
    }

    /// Alternatives are gated conjunctively: both sides become predicates.
    #[test]
    fn test_or_is_treated_as_and() {
        assert_eq!(parse("(CI>100|CA>100)"), vec!["CA>100", "CI>100"]);
    }

    #[test]
    fn test_comparison_holds() {
        assert!(Comparison::Greater.holds(101.0, 100));
        assert!(!Comparison::Greater.holds(100.0, 100));
        assert!(Comparison::GreaterEqual.holds(100.0, 100));
        assert!(Comparison::Less.holds(11.0, 12));
        assert!(Comparison::LessEqual.holds(12.0, 12));
        assert!(Comparison::Equal.holds(3.0, 3));
        assert!(!Comparison::Equal.holds(3.5, 3));
    }
}
