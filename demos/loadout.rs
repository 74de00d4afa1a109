//! Loadout example: Full pipeline over small item and panoply tables
//!
//! This example demonstrates:
//! - Decoding JSON item and panoply tables
//! - Weights, resource minimums and a time limit from TOML
//! - A set bonus and an equip condition solved with the build
//! - Reading the report
//!
//! Run with `RUST_LOG=info` to see the pipeline events.

use loadout_opt::*;

const ITEMS: &str = r#"[
    {"id": 1, "name": "Gobball Hat", "type": 16, "level": 20, "panoply": 10,
     "condition": null, "characteristic_10": 15, "characteristic_11": 20},
    {"id": 2, "name": "Gobball Cape", "type": 17, "level": 20, "panoply": 10,
     "condition": null, "characteristic_10": 15, "characteristic_11": 20},
    {"id": 3, "name": "Gobball Belt", "type": 10, "level": 20, "panoply": 10,
     "condition": null, "characteristic_10": 10},
    {"id": 4, "name": "Brute Boots", "type": 11, "level": 60, "panoply": -1,
     "condition": "CF>100", "characteristic_10": 60, "characteristic_23": 1},
    {"id": 5, "name": "Plain Boots", "type": 11, "level": 10, "panoply": -1,
     "condition": "", "characteristic_10": 10},
    {"id": 6, "name": "Gelano", "type": 9, "level": 60, "panoply": -1,
     "condition": null, "characteristic_23": 1, "characteristic_11": 10},
    {"id": 7, "name": "Strength Ring", "type": 9, "level": 40, "panoply": -1,
     "condition": null, "characteristic_10": 25},
    {"id": 8, "name": "Weak Ring", "type": 9, "level": 5, "panoply": -1,
     "condition": null, "characteristic_10": 5},
    {"id": 9, "name": "Hammer", "type": 7, "level": 50, "panoply": -1,
     "condition": null, "characteristic_10": 40, "characteristic_1": 1},
    {"id": 10, "name": "Bow", "type": 2, "level": 50, "panoply": -1,
     "condition": null, "characteristic_10": 45}
]"#;

const PANOPLIES: &str = r#"[
    {"id": 10, "name": "Gobball", "item_1": 1, "item_2": 2, "item_3": 3,
     "bonus_2_characteristic_10": 10, "bonus_3_characteristic_1": 1}
]"#;

const CONFIG: &str = r#"
    max_level = 100
    weights = ["characteristic_10:1.0", "characteristic_11:0.5"]
    time_limit_secs = 5.0

    [resource_minimums]
    1 = 7
    23 = 3
"#;

fn main() -> Result<(), LoadoutError> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = OptimizerConfig::from_toml_str(CONFIG)?;
    println!("Configuration:");
    println!("  - Levels: {:?}", config.levels());
    println!("  - Time limit: {:?}", config.time_limit());
    for (id, minimum) in config.resource_minimums() {
        println!("  - Minimum {}: {minimum}", StatRegistry::standard().name(id));
    }

    let optimizer = Optimizer::new(config);
    println!("\nSolving...");
    let report = match optimizer.run_tables(ITEMS, PANOPLIES) {
        Ok(report) => report,
        Err(err) if err.is_no_solution() => {
            println!("No loadout found: {err}");
            return Ok(());
        }
        Err(err) => return Err(err),
    };

    println!("\n=== Equipped Items ===");
    for item in &report.items {
        println!("  {:<8} {} (level {})", item.slot, item.name, item.level);
    }

    println!("\n=== Set Bonuses ===");
    if report.tiers.is_empty() {
        println!("  none");
    }
    for tier in &report.tiers {
        println!("  {} ({} pieces)", tier.name, tier.tier);
    }

    println!("\n=== Equip Conditions Met ===");
    for predicate in &report.solution.satisfied_predicates {
        println!("  {predicate}");
    }

    println!("\n=== Stats ===");
    for (name, value) in report.display_stats(optimizer.registry()) {
        println!("  {name}: {value}");
    }
    println!("\nObjective: {:.1}", report.solution.objective_value);

    Ok(())
}
