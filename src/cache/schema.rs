//! Schema migrations for the local store.
//!
//! The stored schema version lives in SQLite's `user_version` pragma. Steps
//! are applied in order for every version above the stored one, and each
//! step only ever adds tables or indexes with `IF NOT EXISTS`, so replaying a
//! step against a database that already has it changes nothing.

use rusqlite::Connection;
use tracing::{debug, warn};

use super::error::CacheError;

/// A single additive upgrade step.
#[derive(Debug)]
pub struct Migration {
  pub version: u32,
  pub description: &'static str,
  pub sql: &'static str,
}

/// Ordered upgrade steps. Versions are strictly increasing but not
/// contiguous; version 2 never shipped.
pub const MIGRATIONS: &[Migration] = &[
  Migration {
    version: 1,
    description: "create currencies collection",
    sql: r#"
CREATE TABLE IF NOT EXISTS currencies (
    id TEXT PRIMARY KEY NOT NULL,
    data BLOB NOT NULL,
    seq INTEGER NOT NULL
);
"#,
  },
  Migration {
    version: 3,
    description: "index currencies by id",
    sql: r#"
CREATE UNIQUE INDEX IF NOT EXISTS idx_currencies_id ON currencies(id);
CREATE INDEX IF NOT EXISTS idx_currencies_seq ON currencies(seq);
"#,
  },
  Migration {
    version: 4,
    description: "create currencyRates collection",
    sql: r#"
CREATE TABLE IF NOT EXISTS currencyRates (
    query TEXT PRIMARY KEY NOT NULL,
    data BLOB NOT NULL,
    seq INTEGER NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_currencyRates_query ON currencyRates(query);
CREATE INDEX IF NOT EXISTS idx_currencyRates_seq ON currencyRates(seq);
"#,
  },
];

/// Version the store is upgraded to on open.
pub fn target_version() -> u32 {
  MIGRATIONS.last().map(|m| m.version).unwrap_or(0)
}

/// Read the schema version stored in the database.
pub fn current_version(conn: &Connection) -> Result<u32, CacheError> {
  let version: u32 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
  Ok(version)
}

/// Apply every step above the stored version, in order.
///
/// Returns the version the store ends up at.
pub fn migrate(conn: &mut Connection) -> Result<u32, CacheError> {
  let from = current_version(conn)?;
  let target = target_version();

  if from > target {
    warn!(from, target, "Store schema is newer than this build, leaving it as is");
    return Ok(from);
  }

  for step in MIGRATIONS.iter().filter(|m| m.version > from) {
    debug!(version = step.version, "Applying migration: {}", step.description);
    let tx = conn.transaction()?;
    tx.execute_batch(step.sql)?;
    // PRAGMA does not accept bound parameters
    tx.execute_batch(&format!("PRAGMA user_version = {}", step.version))?;
    tx.commit()?;
  }

  current_version(conn)
}
