//! `--migrate-configuration`: rewrite a legacy configuration file.
//!
//! The pre-1.0 schema used camelCase keys. Migration renames every such key
//! to its snake_case spelling in place, preserving formatting and comments,
//! after writing a backup next to the original.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use toml_edit::{DocumentMut, Item, Table, Value};

use attest_core::file_config::{is_legacy_key, legacy_key_to_snake};
use attest_core::RunExitCode;

/// Migrate the located configuration file to the current schema.
///
/// # Errors
///
/// Returns an error when the file cannot be read, parsed, backed up, or
/// written.
pub fn execute(path: Option<&Path>) -> anyhow::Result<RunExitCode> {
    let Some(path) = path else {
        println!("No configuration file found to migrate");
        return Ok(RunExitCode::Failure);
    };

    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let mut document: DocumentMut = content
        .parse()
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let renamed = migrate_table(document.as_table_mut());
    if renamed == 0 {
        println!("Configuration already uses the current schema");
        return Ok(RunExitCode::Success);
    }

    let backup = PathBuf::from(format!("{}.bak", path.display()));
    fs::copy(path, &backup)
        .with_context(|| format!("failed to write backup {}", backup.display()))?;
    fs::write(path, document.to_string())
        .with_context(|| format!("failed to write {}", path.display()))?;

    println!("Created backup         {}", backup.display());
    println!("Migrated configuration {} ({renamed} key(s) renamed)", path.display());
    Ok(RunExitCode::Success)
}

fn migrate_table(table: &mut Table) -> usize {
    let legacy: Vec<String> = table
        .iter()
        .map(|(key, _)| key.to_string())
        .filter(|key| is_legacy_key(key))
        .collect();

    let mut renamed = legacy.len();
    for key in legacy {
        if let Some(item) = table.remove(key.as_str()) {
            let _ = table.insert(legacy_key_to_snake(&key).as_str(), item);
        }
    }

    for (_, item) in table.iter_mut() {
        renamed += migrate_item(item);
    }
    renamed
}

fn migrate_item(item: &mut Item) -> usize {
    match item {
        Item::Table(table) => migrate_table(table),
        Item::ArrayOfTables(tables) => tables.iter_mut().map(migrate_table).sum(),
        Item::Value(Value::InlineTable(inline)) => {
            let legacy: Vec<String> = inline
                .iter()
                .map(|(key, _)| key.to_string())
                .filter(|key| is_legacy_key(key))
                .collect();
            let renamed = legacy.len();
            for key in legacy {
                if let Some(value) = inline.remove(key.as_str()) {
                    let _ = inline.insert(legacy_key_to_snake(&key).as_str(), value);
                }
            }
            renamed
        },
        Item::Value(_) | Item::None => 0,
    }
}
