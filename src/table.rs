//! Decoding of the upstream item and panoply tables.
//!
//! Both tables arrive as JSON arrays of records, one object per row, with
//! stat values spread over `characteristic_<n>` columns (items) and
//! `bonus_<k>_characteristic_<n>` columns (panoplies). Missing required
//! columns are data contract violations and abort loading.

use crate::characteristic::{CharacteristicId, COLUMN_PREFIX};
use crate::error::LoadoutError;
use crate::item::{Item, PanoplyId, PanoplySet, StatMap, TierBonuses};
use crate::slot::SlotType;
use serde_json::{Map, Value};

type Row = Map<String, Value>;

const ITEMS: &str = "items";
const PANOPLIES: &str = "panoplies";

/// A required column and the spellings it may appear under.
struct Column {
    name: &'static str,
    aliases: &'static [&'static str],
}

impl Column {
    const fn new(name: &'static str, aliases: &'static [&'static str]) -> Self {
        Self { name, aliases }
    }

    fn lookup<'a>(&self, row: &'a Row) -> Option<&'a Value> {
        std::iter::once(&self.name)
            .chain(self.aliases.iter())
            .find_map(|key| row.get(*key))
    }

    fn require<'a>(
        &self,
        table: &'static str,
        index: usize,
        row: &'a Row,
    ) -> Result<&'a Value, LoadoutError> {
        self.lookup(row).ok_or_else(|| LoadoutError::MissingColumn {
            table,
            column: self.name.to_string(),
            row: index,
        })
    }

    fn invalid(&self, table: &'static str, index: usize, reason: &str) -> LoadoutError {
        LoadoutError::InvalidCell {
            table,
            column: self.name.to_string(),
            row: index,
            reason: reason.to_string(),
        }
    }
}

const ID: Column = Column::new("id", &[]);
const NAME: Column = Column::new("name", &["nom"]);
const SLOT: Column = Column::new("type", &["slot_type"]);
const LEVEL: Column = Column::new("level", &["niveau"]);
const PANOPLY: Column = Column::new("panoply", &["pano", "panoply_id"]);
const CONDITION: Column = Column::new("condition", &[]);

/// Decode the item table.
///
/// # Errors
///
/// `LoadoutError::Table` if the document is not an array of objects,
/// `MissingColumn` / `InvalidCell` if a row breaks the contract.
///
/// # Examples
///
/// ```rust
/// use loadout_opt::table::parse_items;
/// use loadout_opt::CharacteristicId;
///
/// let items = parse_items(r#"[
///     {"id": 44, "nom": "Gelano", "type": 9, "niveau": 60, "pano": null,
///      "condition": "", "characteristic_23": 1.0, "characteristic_1": null}
/// ]"#).unwrap();
///
/// assert_eq!(items[0].name, "Gelano");
/// assert_eq!(items[0].panoply, None);
/// assert_eq!(items[0].stat(CharacteristicId::MP), 1.0);
/// assert_eq!(items[0].stat(CharacteristicId::AP), 0.0);
/// ```
pub fn parse_items(json: &str) -> Result<Vec<Item>, LoadoutError> {
    let rows: Vec<Row> = serde_json::from_str(json)?;
    rows.iter()
        .enumerate()
        .map(|(index, row)| item_from_row(index, row))
        .collect()
}

/// Decode the panoply table. Tier bonuses are taken as marginal.
///
/// # Examples
///
/// ```rust
/// use loadout_opt::table::parse_panoplies;
/// use loadout_opt::CharacteristicId;
///
/// let sets = parse_panoplies(r#"[
///     {"id": 7, "nom": "Bouftou", "item_1": 100, "item_2": 101,
///      "bonus_2_characteristic_10": 10, "bonus_3_characteristic_1": 1}
/// ]"#).unwrap();
///
/// assert_eq!(sets[0].name, "Bouftou");
/// assert_eq!(sets[0].bonuses.bonus(2, CharacteristicId::STRENGTH), 10.0);
/// assert_eq!(sets[0].bonuses.bonus(3, CharacteristicId::AP), 1.0);
/// ```
pub fn parse_panoplies(json: &str) -> Result<Vec<PanoplySet>, LoadoutError> {
    let rows: Vec<Row> = serde_json::from_str(json)?;
    rows.iter()
        .enumerate()
        .map(|(index, row)| panoply_from_row(index, row))
        .collect()
}

fn item_from_row(index: usize, row: &Row) -> Result<Item, LoadoutError> {
    let id = integer_cell(&ID, ITEMS, index, ID.require(ITEMS, index, row)?)?;
    let slot = integer_cell(&SLOT, ITEMS, index, SLOT.require(ITEMS, index, row)?)?;
    let level = integer_cell(&LEVEL, ITEMS, index, LEVEL.require(ITEMS, index, row)?)?;
    let panoply = panoply_cell(index, PANOPLY.require(ITEMS, index, row)?)?;
    let condition = match CONDITION.require(ITEMS, index, row)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    };
    let name = NAME
        .lookup(row)
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("item {id}"));

    let slot = u32::try_from(slot).map_err(|_| SLOT.invalid(ITEMS, index, "negative slot type"))?;
    let level = u32::try_from(level).map_err(|_| LEVEL.invalid(ITEMS, index, "negative level"))?;

    let characteristics: StatMap = row
        .iter()
        .filter_map(|(column, value)| {
            CharacteristicId::from_column(column).map(|id| (id, numeric_or_zero(value)))
        })
        .filter(|(_, value)| *value != 0.0)
        .collect();

    Ok(Item {
        id,
        name,
        slot: SlotType(slot),
        level,
        panoply,
        condition,
        characteristics,
    })
}

fn panoply_from_row(index: usize, row: &Row) -> Result<PanoplySet, LoadoutError> {
    let id = integer_cell(&ID, PANOPLIES, index, ID.require(PANOPLIES, index, row)?)?;
    let name = match NAME.require(PANOPLIES, index, row)? {
        Value::String(s) => s.clone(),
        Value::Null => format!("panoply {id}"),
        other => other.to_string(),
    };

    let mut bonuses = TierBonuses::default();
    for (column, value) in row {
        if let Some((tier, characteristic)) = bonus_column(column) {
            let value = numeric_or_zero(value);
            if value != 0.0 {
                bonuses.insert(tier, characteristic, value);
            }
        }
    }

    Ok(PanoplySet { id, name, bonuses })
}

/// Split `bonus_<k>_characteristic_<n>` into its tier and characteristic.
fn bonus_column(column: &str) -> Option<(u32, CharacteristicId)> {
    let rest = column.strip_prefix("bonus_")?;
    let (tier, characteristic) = rest.split_once('_')?;
    if !characteristic.starts_with(COLUMN_PREFIX) {
        return None;
    }
    Some((tier.parse().ok()?, CharacteristicId::from_column(characteristic)?))
}

fn integer_cell(
    column: &Column,
    table: &'static str,
    index: usize,
    value: &Value,
) -> Result<i64, LoadoutError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().and_then(whole_number))
            .ok_or_else(|| column.invalid(table, index, "not an integer")),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| column.invalid(table, index, "not an integer")),
        Value::Null => Err(column.invalid(table, index, "missing value")),
        _ => Err(column.invalid(table, index, "not an integer")),
    }
}

/// Largest magnitude an `f64` holds without skipping integers.
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// `f` as an integer when it is one exactly.
fn whole_number(f: f64) -> Option<i64> {
    (f.is_finite() && f.fract() == 0.0 && f.abs() <= MAX_EXACT_FLOAT).then_some(f as i64)
}

/// Panoply reference. Null, blank or non-numeric text and non-positive ids
/// mean "no set"; a fractional or out-of-range number is an invalid cell.
fn panoply_cell(index: usize, value: &Value) -> Result<Option<PanoplyId>, LoadoutError> {
    let fractional = || PANOPLY.invalid(ITEMS, index, "not an integer");
    let id = match value {
        Value::Number(n) => match n.as_i64() {
            Some(id) => id,
            None => n.as_f64().and_then(whole_number).ok_or_else(fractional)?,
        },
        Value::String(s) => {
            let s = s.trim();
            match (s.parse::<i64>(), s.parse::<f64>()) {
                (Ok(id), _) => id,
                (Err(_), Ok(f)) => whole_number(f).ok_or_else(fractional)?,
                (Err(_), Err(_)) => return Ok(None),
            }
        }
        _ => return Ok(None),
    };
    Ok((id > 0).then_some(id))
}

/// Stat cells are coerced: null, NaN and non-numeric text count as 0.
fn numeric_or_zero(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        Value::Bool(b) => f64::from(u8::from(*b)),
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_required_column() {
        let err = parse_items(r#"[{"id": 1, "type": 9, "niveau": 1, "pano": -1}]"#).unwrap_err();
        match err {
            LoadoutError::MissingColumn { table, column, row } => {
                assert_eq!(table, "items");
                assert_eq!(column, "condition");
                assert_eq!(row, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_panoply_name() {
        let err = parse_panoplies(r#"[{"id": 1}]"#).unwrap_err();
        assert!(matches!(err, LoadoutError::MissingColumn { column, .. } if column == "name"));
    }

    #[test]
    fn test_invalid_id_cell() {
        let err = parse_items(
            r#"[{"id": "abc", "type": 9, "level": 1, "panoply": null, "condition": null}]"#,
        )
        .unwrap_err();
        assert!(matches!(err, LoadoutError::InvalidCell { .. }));
    }

    #[test]
    fn test_not_an_array() {
        assert!(matches!(parse_items("{}"), Err(LoadoutError::Table(_))));
    }

    #[test]
    fn test_float_ids_and_sentinel_panoply() {
        let items = parse_items(
            r#"[{"id": 12.0, "type": 16.0, "level": 100, "pano": -1.0, "condition": "CF>10",
                 "characteristic_10": 40.0, "characteristic_11": null}]"#,
        )
        .unwrap();
        assert_eq!(items[0].id, 12);
        assert_eq!(items[0].slot, SlotType::HAT);
        assert_eq!(items[0].panoply, None);
        assert_eq!(items[0].condition.as_deref(), Some("CF>10"));
        assert_eq!(items[0].characteristics.len(), 1);
    }

    fn item_row(id: &str, panoply: &str) -> String {
        format!(
            r#"[{{"id": {id}, "type": 16, "level": 1, "pano": {panoply}, "condition": null}}]"#
        )
    }

    #[test]
    fn test_fractional_panoply_is_invalid() {
        for panoply in ["3.7", "\"3.7\"", "1e300"] {
            let err = parse_items(&item_row("1", panoply)).unwrap_err();
            assert!(
                matches!(&err, LoadoutError::InvalidCell { column, .. } if column == "panoply"),
                "{panoply}: {err}"
            );
        }
        let items = parse_items(&item_row("1", "3.0")).unwrap();
        assert_eq!(items[0].panoply, Some(3));
        let items = parse_items(&item_row("1", "\"none\"")).unwrap();
        assert_eq!(items[0].panoply, None);
    }

    #[test]
    fn test_huge_float_id_is_invalid() {
        for id in ["1e300", "-1e300", "12.5"] {
            let err = parse_items(&item_row(id, "-1")).unwrap_err();
            assert!(
                matches!(&err, LoadoutError::InvalidCell { column, .. } if column == "id"),
                "{id}: {err}"
            );
        }
    }

    #[test]
    fn test_whole_number() {
        assert_eq!(whole_number(-4.0), Some(-4));
        assert_eq!(whole_number(3.7), None);
        assert_eq!(whole_number(f64::NAN), None);
        assert_eq!(whole_number(f64::INFINITY), None);
        assert_eq!(whole_number(1e300), None);
    }

    #[test]
    fn test_bonus_column_parsing() {
        assert_eq!(
            bonus_column("bonus_4_characteristic_-1"),
            Some((4, CharacteristicId::new(-1)))
        );
        assert_eq!(bonus_column("bonus_x_characteristic_1"), None);
        assert_eq!(bonus_column("item_3"), None);
        assert_eq!(bonus_column("bonus_2_other_1"), None);
    }
}
