//! Explicit, idempotent schema initialization

use super::{DatabaseError, Result};
use crate::db::schema::Schema;
use surrealdb::{Connection, Surreal};

/// Latest schema version known to this build
pub const SCHEMA_VERSION: u32 = 1;

/// Database migration runner
pub struct MigrationRunner;

impl MigrationRunner {
    /// Run all migrations
    ///
    /// Called once while connecting. Safe to call again: every statement
    /// is create-if-absent and applied versions are skipped.
    pub async fn run<C: Connection>(db: &Surreal<C>) -> Result<()> {
        let current_version = Self::get_schema_version(db).await?;

        if current_version < 1 {
            tracing::info!("Running migration v1: Initial schema");
            Self::migrate_v1(db).await?;
            Self::update_schema_version(db, 1).await?;
        }

        Ok(())
    }

    /// Migration v1: users and friend answer sets
    async fn migrate_v1<C: Connection>(db: &Surreal<C>) -> Result<()> {
        for table in Schema::tables() {
            tracing::debug!("Defining table {}", table.name);
            db.query(&table.schema)
                .await
                .map_err(DatabaseError::QueryFailed)?
                .check()
                .map_err(DatabaseError::QueryFailed)?;

            for index in &table.indexes {
                db.query(index)
                    .await
                    .map_err(DatabaseError::QueryFailed)?
                    .check()
                    .map_err(DatabaseError::QueryFailed)?;
            }
        }

        Ok(())
    }

    /// Get schema version
    pub(crate) async fn get_schema_version<C: Connection>(db: &Surreal<C>) -> Result<u32> {
        let mut result = db
            .query("SELECT schema_version FROM system_metadata LIMIT 1")
            .await
            .map_err(DatabaseError::QueryFailed)?;

        #[derive(serde::Deserialize)]
        struct SchemaVersion {
            schema_version: u32,
        }

        // A fresh database has no system_metadata table yet
        let versions: Vec<SchemaVersion> = result.take(0).unwrap_or_default();

        Ok(versions.first().map(|v| v.schema_version).unwrap_or(0))
    }

    /// Update schema version
    async fn update_schema_version<C: Connection>(db: &Surreal<C>, version: u32) -> Result<()> {
        let updated: Vec<serde_json::Value> = db
            .query("UPDATE system_metadata SET schema_version = $version, updated_at = time::now()")
            .bind(("version", version))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .unwrap_or_default();

        if updated.is_empty() {
            db.query("CREATE system_metadata SET schema_version = $version, created_at = time::now(), updated_at = time::now()")
                .bind(("version", version))
                .await
                .map_err(DatabaseError::QueryFailed)?
                .check()
                .map_err(DatabaseError::QueryFailed)?;
        }

        Ok(())
    }
}
