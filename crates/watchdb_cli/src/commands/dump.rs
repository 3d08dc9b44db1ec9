//! Dump command implementation.

use super::open_store;
use serde::Serialize;
use std::path::Path;
use watchdb_core::{DatabaseId, DisplayText, Notification};

/// One listed record.
#[derive(Debug, Serialize)]
pub struct DumpEntry {
    /// Key, hex-encoded.
    pub key: String,
    /// Value size in bytes.
    pub value_size: usize,
    /// Derived title, for timeline databases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Derived subtitle, for timeline databases.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
}

fn is_timeline(database: DatabaseId) -> bool {
    matches!(
        database,
        DatabaseId::Notification | DatabaseId::Pin | DatabaseId::Reminder
    )
}

/// Lists up to `limit` records of `database`, in store order.
pub fn dump(
    path: &Path,
    database: DatabaseId,
    limit: Option<usize>,
) -> Result<Vec<DumpEntry>, Box<dyn std::error::Error>> {
    let store = open_store(path, false)?;
    let handle = store.open(database)?;

    let entries = handle
        .iterate()?
        .take(limit.unwrap_or(usize::MAX))
        .map(|record| {
            let text = is_timeline(database)
                .then(|| Notification::from_value(record.value()).ok())
                .flatten()
                .map(|n| n.display_text());
            DumpEntry {
                key: hex::encode(record.key()),
                value_size: record.value().len(),
                title: text.as_ref().map(|t| t.title.clone()),
                subtitle: text.and_then(|t| t.subtitle),
            }
        })
        .collect();

    Ok(entries)
}

/// Runs the dump command.
pub fn run(
    path: &Path,
    database: DatabaseId,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let entries = dump(path, database, limit)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        _ => {
            if entries.is_empty() && database == DatabaseId::Notification {
                let empty = DisplayText::empty_feed();
                println!("{}", empty.title);
                println!("  {}", empty.subtitle.unwrap_or_default());
                return Ok(());
            }

            println!("{} ({} records)", database, entries.len());
            for entry in &entries {
                print!("  {}  {} bytes", entry.key, entry.value_size);
                if let Some(title) = &entry.title {
                    print!("  {title}");
                }
                if let Some(subtitle) = &entry.subtitle {
                    print!(" / {subtitle}");
                }
                println!();
            }
        }
    }

    Ok(())
}
