use approx::assert_relative_eq;
use loadout_opt::config::parse_entry;
use loadout_opt::*;
use std::io::Write;

const ITEMS: &str = r#"[
    {"id": 100, "nom": "Bouftou hat", "type": 16, "niveau": 10, "pano": 1,
     "condition": null, "characteristic_11": 20, "characteristic_12": 10},
    {"id": 101, "nom": "Bouftou cloak", "type": 17, "niveau": 10, "pano": 1,
     "condition": null, "characteristic_11": 20, "characteristic_12": 10},
    {"id": 102, "nom": "Wisdom cloak", "type": 17, "niveau": 12, "pano": -1,
     "condition": "", "characteristic_12": 25},
    {"id": 103, "nom": "Strong hat", "type": 16, "niveau": 90, "pano": null,
     "condition": "CS>200", "characteristic_12": 80},
    {"id": 104, "nom": "Pet", "type": 18, "niveau": 1, "pano": -1,
     "condition": null, "characteristic_12": 500},
    {"id": 2155, "nom": "Banned ring", "type": 9, "niveau": 1, "pano": -1,
     "condition": null, "characteristic_12": 500}
]"#;

const PANOPLIES: &str = r#"[
    {"id": 1, "nom": "Bouftou", "item_1": 100, "item_2": 101,
     "bonus_2_characteristic_12": 10, "bonus_2_characteristic_1": null}
]"#;

fn relaxed() -> OptimizerConfig {
    OptimizerConfig::default()
        .with_resource_minimum(CharacteristicId::AP, 0)
        .with_resource_minimum(CharacteristicId::MP, 0)
}

// ============================================================================
// Table contract
// ============================================================================

#[test]
fn test_run_tables_end_to_end() {
    let config = relaxed().with_weight(CharacteristicId::WISDOM, 1.0);
    let report = Optimizer::new(config).run_tables(ITEMS, PANOPLIES).unwrap();

    // 10 + 25 beats the full set's 10 + 10 + 10.
    let ids: Vec<ItemId> = report.solution.selected_item_ids.iter().copied().collect();
    assert_eq!(ids, vec![100, 102]);
    assert_relative_eq!(report.stat(CharacteristicId::WISDOM), 35.0);
    // Not equipment, banned and out of reach respectively
    assert!(!ids.contains(&104));
    assert!(!ids.contains(&2155));
    assert!(!ids.contains(&103));
}

#[test]
fn test_set_bonus_from_table() {
    let config = relaxed()
        .with_weight(CharacteristicId::WISDOM, 1.0)
        .with_weight(CharacteristicId::VITALITY, 1.0);
    let report = Optimizer::new(config).run_tables(ITEMS, PANOPLIES).unwrap();

    // The full set scores 70, the mixed build 55.
    let ids: Vec<ItemId> = report.solution.selected_item_ids.iter().copied().collect();
    assert_eq!(ids, vec![100, 101]);
    assert_eq!(report.tiers.len(), 1);
    assert_eq!(report.tiers[0].name, "Bouftou");
    assert_relative_eq!(report.stat(CharacteristicId::WISDOM), 30.0);
}

#[test]
fn test_missing_item_column_is_fatal() {
    let items = r#"[{"id": 1, "type": 16, "level": 1, "condition": null}]"#;
    let err = Optimizer::new(relaxed()).run_tables(items, "[]").unwrap_err();
    match err {
        LoadoutError::MissingColumn { table, column, row } => {
            assert_eq!(table, "items");
            assert_eq!(column, "panoply");
            assert_eq!(row, 0);
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_missing_panoply_column_is_fatal() {
    let err = Optimizer::new(relaxed())
        .run_tables(ITEMS, r#"[{"id": 1}]"#)
        .unwrap_err();
    assert!(matches!(err, LoadoutError::MissingColumn { table: "panoplies", .. }));
    assert!(!err.is_no_solution());
}

#[test]
fn test_malformed_document() {
    let err = Optimizer::new(relaxed()).run_tables("not json", "[]").unwrap_err();
    assert!(matches!(err, LoadoutError::Table(_)));
}

#[test]
fn test_second_row_reported() {
    let items = r#"[
        {"id": 1, "type": 16, "level": 1, "panoply": -1, "condition": null},
        {"id": 2, "type": "hat", "level": 1, "panoply": -1, "condition": null}
    ]"#;
    let err = table::parse_items(items).unwrap_err();
    assert!(matches!(err, LoadoutError::InvalidCell { row: 1, .. }));
    assert!(err.to_string().contains("row 1"));
}

#[test]
fn test_duplicate_item_rows_keep_first() {
    let items = table::parse_items(
        r#"[
            {"id": 5, "nom": "first", "type": 16, "level": 1, "panoply": -1, "condition": null},
            {"id": 5, "nom": "second", "type": 16, "level": 1, "panoply": -1, "condition": null}
        ]"#,
    )
    .unwrap();
    let catalog = EquipmentCatalog::new(items);
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog.get(5).unwrap().name, "first");
}

#[test]
fn test_cumulative_bonuses_convert_to_marginal() {
    let mut cumulative = TierBonuses::default();
    cumulative.insert(2, CharacteristicId::STRENGTH, 10.0);
    cumulative.insert(3, CharacteristicId::STRENGTH, 25.0);
    cumulative.insert(3, CharacteristicId::AP, 1.0);

    let marginal = TierBonuses::from_cumulative(&cumulative);
    assert_relative_eq!(marginal.bonus(2, CharacteristicId::STRENGTH), 10.0);
    assert_relative_eq!(marginal.bonus(3, CharacteristicId::STRENGTH), 15.0);
    assert_relative_eq!(marginal.bonus(3, CharacteristicId::AP), 1.0);
    assert_relative_eq!(marginal.total_at(3, CharacteristicId::STRENGTH), 25.0);
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn test_malformed_entries_never_fail_a_run() {
    let config = OptimizerConfig::from_toml_str(
        r#"
        weights = ["characteristic_12:1", "12", "abc:2", "11:lots"]
        base_overrides = ["1:x", "23"]

        [resource_minimums]
        1 = 0
        23 = 0
        "#,
    )
    .unwrap();

    assert_eq!(config.weights().len(), 1);
    assert_eq!(config.base_stats(), BaseStats::for_level(200));

    let report = Optimizer::new(config).run_tables(ITEMS, PANOPLIES).unwrap();
    assert_relative_eq!(report.stat(CharacteristicId::WISDOM), 35.0);
}

#[test]
fn test_entry_errors_are_typed() {
    assert!(matches!(parse_entry("12"), Err(EntryError::MissingSeparator(_))));
    assert!(matches!(parse_entry("abc:2"), Err(EntryError::InvalidCharacteristic(_))));
    assert!(matches!(parse_entry("11:lots"), Err(EntryError::InvalidValue(_))));
    assert_eq!(parse_entry("25:0.5"), Ok((CharacteristicId::POWER, 0.5)));
}

#[test]
fn test_config_file_round_trip() {
    let path = std::env::temp_dir().join(format!("loadout-opt-{}.toml", std::process::id()));
    let mut file = std::fs::File::create(&path).unwrap();
    writeln!(
        file,
        r#"
        min_level = 1
        max_level = 50
        exclude_trophies = true
        weights = ["12:1.0"]
        banned_items = [102, 2155]
        time_limit_secs = 30

        [resource_minimums]
        1 = 5
        23 = 2
        "#
    )
    .unwrap();
    drop(file);

    let optimizer = Optimizer::from_config_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(optimizer.config().levels(), 1..=50);
    assert!(optimizer.config().exclude_trophies);

    // The wisdom cloak is banned, so the set wins on wisdom.
    let report = optimizer.run_tables(ITEMS, PANOPLIES).unwrap();
    let ids: Vec<ItemId> = report.solution.selected_item_ids.iter().copied().collect();
    assert_eq!(ids, vec![100, 101]);
    // Base AP below level 100
    assert_relative_eq!(report.stat(CharacteristicId::AP), 5.0);
}

#[test]
fn test_missing_config_file() {
    let err = Optimizer::from_config_file("/nonexistent/loadout.toml").unwrap_err();
    assert!(matches!(err, LoadoutError::Config(ConfigError::Io(_))));
}

#[test]
fn test_report_serializes_to_json() {
    let config = relaxed().with_weight(CharacteristicId::WISDOM, 1.0);
    let report = Optimizer::new(config).run_tables(ITEMS, PANOPLIES).unwrap();

    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["items"][0]["name"], "Bouftou hat");
    assert_eq!(json["stat_totals"]["12"], 35.0);
}
