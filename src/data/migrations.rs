//! Versioned schema for the preference database.
//!
//! Applied versions are recorded in `schema_migrations`. Each pending step
//! runs in its own transaction together with its bookkeeping row, so a
//! failed step leaves no trace.

use std::collections::HashSet;

use rusqlite::{params, Connection, Transaction};

/// One schema step
pub struct Migration {
    pub version: i64,
    pub name: &'static str,
    pub sql: &'static str,
}

/// Schema steps in ascending version order. Append only.
pub const MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    name: "create_app_state_table",
    sql: "CREATE TABLE IF NOT EXISTS app_state (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL,
              updated_at TEXT NOT NULL
          );",
}];

const CREATE_BOOKKEEPING: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
);";

fn applied_versions(conn: &Connection) -> rusqlite::Result<HashSet<i64>> {
    let mut stmt = conn.prepare("SELECT version FROM schema_migrations")?;
    let versions = stmt
        .query_map([], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<HashSet<i64>>>()?;
    Ok(versions)
}

fn apply(tx: &Transaction<'_>, migration: &Migration) -> rusqlite::Result<()> {
    tx.execute_batch(migration.sql)?;
    tx.execute(
        "INSERT INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
        params![
            migration.version,
            migration.name,
            chrono::Utc::now().to_rfc3339()
        ],
    )?;
    Ok(())
}

/// Bring the schema up to date and return how many steps ran.
pub fn run_migrations(conn: &mut Connection) -> rusqlite::Result<usize> {
    conn.execute_batch(CREATE_BOOKKEEPING)?;
    let applied = applied_versions(conn)?;

    let mut ran = 0;
    for migration in MIGRATIONS.iter().filter(|m| !applied.contains(&m.version)) {
        let tx = conn.transaction()?;
        if let Err(e) = apply(&tx, migration) {
            tracing::error!(version = migration.version, name = migration.name, error = %e, "Schema step failed");
            return Err(e);
        }
        tx.commit()?;
        tracing::info!(version = migration.version, name = migration.name, "Schema step applied");
        ran += 1;
    }
    Ok(ran)
}
