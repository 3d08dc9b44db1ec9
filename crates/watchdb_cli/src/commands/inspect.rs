//! Inspect command implementation.

use super::open_store;
use serde::Serialize;
use std::path::Path;

/// Store inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Store path.
    pub path: String,
    /// Record log size in bytes.
    pub log_bytes: u64,
    /// Live records across all databases.
    pub total_records: usize,
    /// Per-database figures.
    pub databases: Vec<DatabaseSummary>,
}

/// Figures for one database.
#[derive(Debug, Serialize)]
pub struct DatabaseSummary {
    /// Database name.
    pub name: String,
    /// Wire id.
    pub id: u8,
    /// Live records.
    pub records: usize,
    /// Sum of value sizes in bytes.
    pub value_bytes: usize,
}

/// Collects the inspection result.
pub fn inspect(path: &Path) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let store = open_store(path, false)?;
    let stats = store.stats()?;

    let databases: Vec<_> = stats
        .databases
        .iter()
        .map(|db| DatabaseSummary {
            name: db.database.name().to_string(),
            id: db.database.as_u8(),
            records: db.records,
            value_bytes: db.value_bytes,
        })
        .collect();

    Ok(InspectResult {
        path: path.display().to_string(),
        log_bytes: stats.log_bytes,
        total_records: databases.iter().map(|d| d.records).sum(),
        databases,
    })
}

/// Runs the inspect command.
pub fn run(path: &Path, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(path)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => print_text_output(&result),
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("watchdb Store: {}", result.path);
    println!("Record log: {} bytes", result.log_bytes);
    println!("Records: {}", result.total_records);
    println!();
    println!("{:<14} {:>4} {:>8} {:>12}", "Database", "Id", "Records", "Value bytes");
    for db in &result.databases {
        println!(
            "{:<14} 0x{:02x} {:>8} {:>12}",
            db.name, db.id, db.records, db.value_bytes
        );
    }
}
