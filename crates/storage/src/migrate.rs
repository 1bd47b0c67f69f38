// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Schema migration
//!
//! Rebuilds a store under its registered schema: a fresh file is created next
//! to the store, rows are copied for every column the old and new tables share,
//! and the fresh file is renamed over the store. Tables no longer registered
//! are dropped; new columns take their defaults.

use crate::error::StorageError;
use crate::fsutil::remove_sidecars;
use crate::registry::StoreRegistry;
use rusqlite::Connection;
use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::info;

/// Rows copied per table, and tables dropped
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub copied: Vec<(String, usize)>,
    pub dropped: Vec<String>,
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

fn columns(conn: &Connection, schema: &str, table: &str) -> Result<Vec<String>, StorageError> {
    let mut stmt = conn.prepare(&format!("PRAGMA {schema}.table_info({})", quote(table)))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

fn tables(conn: &Connection, schema: &str) -> Result<Vec<String>, StorageError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT name FROM {schema}.sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'"
    ))?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(names)
}

/// Migrate one store to its registered schema.
///
/// A store file that does not exist yet is simply initialised.
pub fn migrate_store(
    registry: &StoreRegistry,
    store_id: &str,
) -> Result<MigrationReport, StorageError> {
    let def = registry.get(store_id)?;
    let live = registry.path_of(store_id)?;
    if !live.is_file() {
        registry.init_store(store_id)?;
        return Ok(MigrationReport::default());
    }

    let tmp = NamedTempFile::new_in(registry.data_dir())?;
    let mut report = MigrationReport::default();
    {
        let mut conn = Connection::open(tmp.path())?;
        for table in &def.tables {
            conn.execute_batch(&table.ddl)?;
        }
        conn.execute(
            "ATTACH DATABASE ?1 AS old",
            [live.to_string_lossy().as_ref()],
        )?;

        let old_tables = tables(&conn, "old")?;
        let tx = conn.transaction()?;
        for table in &def.tables {
            if !old_tables.contains(&table.name) {
                report.copied.push((table.name.clone(), 0));
                continue;
            }
            let old_cols = columns(&tx, "old", &table.name)?;
            let shared: Vec<String> = columns(&tx, "main", &table.name)?
                .into_iter()
                .filter(|c| old_cols.contains(c))
                .map(|c| quote(&c))
                .collect();
            let copied = if shared.is_empty() {
                0
            } else {
                let list = shared.join(", ");
                tx.execute(
                    &format!(
                        "INSERT INTO main.{t} ({list}) SELECT {list} FROM old.{t}",
                        t = quote(&table.name)
                    ),
                    [],
                )?
            };
            report.copied.push((table.name.clone(), copied));
        }
        tx.commit()?;
        conn.execute_batch("DETACH DATABASE old")?;

        // Triggers go in after the copy so they do not fire on migrated rows
        for sql in &def.extras {
            conn.execute_batch(sql)?;
        }

        report.dropped = old_tables
            .into_iter()
            .filter(|name| !def.tables.iter().any(|t| &t.name == name))
            .collect();
    }

    tmp.as_file().sync_all()?;
    remove_sidecars(&live)?;
    tmp.persist(&live).map_err(|e| e.error)?;
    info!(
        store = store_id,
        tables = report.copied.len(),
        dropped = report.dropped.len(),
        "store migrated"
    );
    Ok(report)
}

#[cfg(test)]
#[path = "migrate_tests.rs"]
mod tests;
