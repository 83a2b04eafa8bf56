//! Schema definitions and migration runner for SurrealDB.
//!
//! Vertices live in one SCHEMAFULL table per kind; edges live in
//! relation tables named after the edge label. Record ids are the
//! vertex ids (UUID strings for resources, principal ids for users).

use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::info;

use crate::error::DbError;

/// Bookkeeping table; created before anything else on every run.
const LEDGER_DDL: &str = "\
DEFINE TABLE IF NOT EXISTS _migration SCHEMAFULL;
DEFINE FIELD IF NOT EXISTS version ON TABLE _migration TYPE int;
DEFINE FIELD IF NOT EXISTS label ON TABLE _migration TYPE string;
DEFINE FIELD IF NOT EXISTS applied_at ON TABLE _migration TYPE datetime DEFAULT time::now();
DEFINE INDEX IF NOT EXISTS uniq_migration ON TABLE _migration FIELDS version UNIQUE;
";

#[derive(Debug, SurrealValue)]
struct AppliedRow {
    version: u32,
}

/// One forward-only schema step.
struct Step {
    version: u32,
    label: &'static str,
    ddl: &'static str,
}

static STEPS: &[Step] = &[Step {
    version: 1,
    label: "vertex_and_edge_tables",
    ddl: SCHEMA_V1,
}];

const SCHEMA_V1: &str = "\
-- vertices: one table per kind, unique by name
DEFINE TABLE user SCHEMAFULL;
DEFINE FIELD name ON user TYPE string;
DEFINE FIELD created_at ON user TYPE datetime DEFAULT time::now();
DEFINE INDEX uniq_user_name ON user FIELDS name UNIQUE;

DEFINE TABLE directory SCHEMAFULL;
DEFINE FIELD name ON directory TYPE string;
DEFINE FIELD is_public ON directory TYPE bool DEFAULT false;
DEFINE FIELD created_at ON directory TYPE datetime DEFAULT time::now();
DEFINE INDEX uniq_directory_name ON directory FIELDS name UNIQUE;

DEFINE TABLE video SCHEMAFULL;
DEFINE FIELD name ON video TYPE string;
DEFINE FIELD is_public ON video TYPE bool DEFAULT false;
DEFINE FIELD created_at ON video TYPE datetime DEFAULT time::now();
DEFINE INDEX uniq_video_name ON video FIELDS name UNIQUE;

-- edges: user -OWNER-> directory|video
DEFINE TABLE owner TYPE RELATION IN user OUT directory | video SCHEMAFULL;
DEFINE FIELD created_at ON owner TYPE datetime DEFAULT time::now();

-- edges: directory|video -MEMBEROF-> directory
DEFINE TABLE member_of TYPE RELATION IN directory | video OUT directory SCHEMAFULL;
DEFINE FIELD created_at ON member_of TYPE datetime DEFAULT time::now();
";

async fn applied_version<C: Connection>(db: &Surreal<C>) -> Result<u32, DbError> {
    let mut result = db
        .query("SELECT version FROM _migration ORDER BY version DESC LIMIT 1")
        .await?;
    let rows: Vec<AppliedRow> = result.take(0)?;
    Ok(rows.first().map_or(0, |row| row.version))
}

async fn apply<C: Connection>(db: &Surreal<C>, step: &Step) -> Result<(), DbError> {
    info!(version = step.version, label = step.label, "Applying schema step");

    db.query(step.ddl)
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("v{} {}: {e}", step.version, step.label)))?;

    db.query("CREATE _migration SET version = $version, label = $label")
        .bind(("version", step.version))
        .bind(("label", step.label))
        .await?
        .check()
        .map_err(|e| DbError::Migration(format!("recording v{}: {e}", step.version)))?;
    Ok(())
}

/// Bring the database up to the latest schema. Steps already recorded in
/// `_migration` are skipped, so running this on every start is safe.
pub async fn run_migrations<C: Connection>(db: &Surreal<C>) -> Result<(), DbError> {
    db.query(LEDGER_DDL)
        .await?
        .check()
        .map_err(|e| DbError::Migration(e.to_string()))?;

    let current = applied_version(db).await?;
    for step in STEPS.iter().filter(|s| s.version > current) {
        apply(db, step).await?;
    }
    Ok(())
}

/// Raw DDL of the first schema step.
pub fn schema_v1() -> &'static str {
    SCHEMA_V1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_defines_every_vertex_and_edge_table() {
        for table in ["user", "directory", "video", "owner", "member_of"] {
            assert!(
                SCHEMA_V1.contains(&format!("DEFINE TABLE {table} ")),
                "missing table {table}"
            );
        }
    }

    #[test]
    fn steps_ascend_from_one() {
        assert_eq!(STEPS.first().map(|s| s.version), Some(1));
        assert!(STEPS.windows(2).all(|w| w[0].version < w[1].version));
    }
}
