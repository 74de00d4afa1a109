//! Static stat lookup tables.
//!
//! The `StatRegistry` binds the compact codes used in equip conditions
//! (`CF>100`, `CP<12`, ...) to characteristic ids, and holds the display
//! names used by reports. It is built once and shared read-only.

use crate::characteristic::CharacteristicId;
use std::collections::HashMap;
use std::sync::OnceLock;

/// Condition codes. The first code listed for a characteristic is canonical.
const CONDITION_CODES: &[(&str, i32)] = &[
    ("CF", 10),
    ("CS", 10),
    ("CV", 11),
    ("CW", 12),
    ("CC", 13),
    ("CA", 14),
    ("CI", 15),
    ("CP", 1),
    ("CM", 23),
];

const CHARACTERISTIC_NAMES: &[(i32, &str)] = &[
    (-1, "Neutral damage"),
    (0, "Hunting weapon"),
    (1, "AP"),
    (10, "Strength"),
    (11, "Vitality"),
    (12, "Wisdom"),
    (13, "Chance"),
    (14, "Agility"),
    (15, "Intelligence"),
    (16, "Damage"),
    (18, "% Critical"),
    (19, "Range"),
    (23, "MP"),
    (25, "Power"),
    (26, "Summons"),
    (27, "AP parry"),
    (28, "MP parry"),
    (33, "% Earth resistance"),
    (34, "% Fire resistance"),
    (35, "% Water resistance"),
    (36, "% Air resistance"),
    (37, "% Neutral resistance"),
    (40, "Pods"),
    (44, "Initiative"),
    (48, "Prospecting"),
    (49, "Heals"),
    (50, "Reflected damage"),
    (54, "Earth resistance"),
    (55, "Fire resistance"),
    (56, "Water resistance"),
    (57, "Air resistance"),
    (58, "Neutral resistance"),
    (69, "Trap power"),
    (70, "Trap damage"),
    (78, "Dodge"),
    (79, "Lock"),
    (82, "AP reduction"),
    (83, "MP reduction"),
    (84, "Pushback damage"),
    (85, "Pushback resistance"),
    (86, "Critical damage"),
    (87, "Critical resistance"),
    (88, "Earth damage"),
    (89, "Fire damage"),
    (90, "Water damage"),
    (91, "Air damage"),
    (92, "Neutral damage"),
    (121, "% Ranged resistance"),
    (122, "Weapon damage"),
    (123, "Spell damage"),
    (124, "% Melee resistance"),
];

/// Read-only registry of condition codes and characteristic names.
///
/// # Examples
///
/// ```rust
/// use loadout_opt::{CharacteristicId, StatRegistry};
///
/// let registry = StatRegistry::standard();
/// assert_eq!(registry.characteristic_for("CF"), Some(CharacteristicId::STRENGTH));
/// assert_eq!(registry.canonical_code("cs"), Some("CF"));
/// assert_eq!(registry.name(CharacteristicId::AP), "AP");
/// ```
#[derive(Debug, Clone)]
pub struct StatRegistry {
    codes: HashMap<String, CharacteristicId>,
    canonical: HashMap<CharacteristicId, String>,
    names: HashMap<CharacteristicId, String>,
}

impl StatRegistry {
    /// The process-wide registry with the catalog's codes and names.
    pub fn standard() -> &'static StatRegistry {
        static STANDARD: OnceLock<StatRegistry> = OnceLock::new();
        STANDARD.get_or_init(|| {
            let mut registry = StatRegistry::empty();
            for &(code, id) in CONDITION_CODES {
                registry.register_code(code, CharacteristicId::new(id));
            }
            for &(id, name) in CHARACTERISTIC_NAMES {
                registry.register_name(CharacteristicId::new(id), name);
            }
            registry
        })
    }

    /// An empty registry, for callers with their own code tables.
    pub fn empty() -> Self {
        Self {
            codes: HashMap::new(),
            canonical: HashMap::new(),
            names: HashMap::new(),
        }
    }

    /// Bind a condition code. The first code bound to a characteristic
    /// becomes its canonical spelling.
    pub fn register_code(&mut self, code: &str, id: CharacteristicId) {
        let code = code.trim().to_ascii_uppercase();
        self.canonical.entry(id).or_insert_with(|| code.clone());
        self.codes.insert(code, id);
    }

    pub fn register_name(&mut self, id: CharacteristicId, name: impl Into<String>) {
        self.names.insert(id, name.into());
    }

    /// Characteristic bound to a condition code (case-insensitive).
    pub fn characteristic_for(&self, code: &str) -> Option<CharacteristicId> {
        self.codes.get(&code.trim().to_ascii_uppercase()).copied()
    }

    /// Canonical code for any registered code or alias.
    pub fn canonical_code(&self, code: &str) -> Option<&str> {
        let id = self.characteristic_for(code)?;
        self.canonical.get(&id).map(String::as_str)
    }

    /// Display name, falling back to the column name for unknown ids.
    pub fn name(&self, id: CharacteristicId) -> String {
        self.names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| id.column_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_codes() {
        let registry = StatRegistry::standard();
        assert_eq!(registry.characteristic_for("CP"), Some(CharacteristicId::AP));
        assert_eq!(registry.characteristic_for("cm"), Some(CharacteristicId::MP));
        assert_eq!(registry.characteristic_for("CI"), Some(CharacteristicId::INTELLIGENCE));
        assert_eq!(registry.characteristic_for("PG"), None);
    }

    #[test]
    fn test_aliases_share_canonical_code() {
        let registry = StatRegistry::standard();
        assert_eq!(registry.canonical_code("CS"), Some("CF"));
        assert_eq!(registry.canonical_code("CF"), Some("CF"));
        assert_eq!(registry.canonical_code("ZZ"), None);
    }

    #[test]
    fn test_unknown_name_falls_back_to_column() {
        let registry = StatRegistry::standard();
        assert_eq!(registry.name(CharacteristicId::new(9999)), "characteristic_9999");
    }

    #[test]
    fn test_custom_registry() {
        let mut registry = StatRegistry::empty();
        registry.register_code("xq", CharacteristicId::new(500));
        assert_eq!(registry.canonical_code("XQ"), Some("XQ"));
    }
}
