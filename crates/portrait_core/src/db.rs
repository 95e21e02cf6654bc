//! Persistent storage for users and friend answer sets
//!
//! Backed by SurrealDB: an embedded SurrealKV file in production and the
//! in-memory engine in tests. The schema is applied once, explicitly, when
//! a [`Store`] connects.

use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use surrealdb::Surreal;
use surrealdb::engine::any::{self, Any};
use thiserror::Error;

use crate::UserId;

pub mod migration;
pub mod ops;
pub mod schema;

const NAMESPACE: &str = "portrait";
const DATABASE: &str = "portrait";

/// Core database error type
#[derive(Error, Debug, Diagnostic)]
pub enum DatabaseError {
    #[error("Connection failed")]
    #[diagnostic(help("Check your database configuration and ensure the database is reachable"))]
    ConnectionFailed(#[source] surrealdb::Error),

    #[error("Query failed")]
    #[diagnostic(help("Check the query syntax and table schema"))]
    QueryFailed(#[source] surrealdb::Error),

    #[error("Record not found: {entity}")]
    NotFound { entity: String },

    #[error("Database error: {0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, DatabaseError>;

/// Configuration for database backends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DatabaseConfig {
    Embedded {
        #[serde(default = "default_db_path")]
        path: String,
    },
    /// Nothing survives a restart
    Memory,
}

fn default_db_path() -> String {
    "./portrait.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig::Embedded {
            path: default_db_path(),
        }
    }
}

impl DatabaseConfig {
    pub fn endpoint(&self) -> String {
        match self {
            DatabaseConfig::Embedded { path } if !path.is_empty() => format!("surrealkv://{path}"),
            _ => "memory".to_string(),
        }
    }
}

/// A registered user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    #[serde(default)]
    pub referrer_id: Option<UserId>,
    pub answers_count: u32,
    pub analysis_sent: bool,
    pub created_at: surrealdb::Datetime,
}

/// The five answers one friend gave about `user_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FriendAnswerSet {
    pub id: surrealdb::RecordId,
    pub user_id: UserId,
    pub friend_id: UserId,
    pub answers: Vec<String>,
    pub created_at: surrealdb::Datetime,
}

/// Row counts for admin tooling
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub users: u64,
    pub answer_sets: u64,
}

/// Handle to the portrait database
#[derive(Debug, Clone)]
pub struct Store {
    db: Surreal<Any>,
}

impl Store {
    /// Connect and run schema initialization
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        if let DatabaseConfig::Embedded { path } = config {
            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).map_err(|e| {
                        DatabaseError::Other(format!("Failed to create database directory: {e}"))
                    })?;
                }
            }
        }

        let endpoint = config.endpoint();
        tracing::info!("Connecting to database at: {}", endpoint);
        let connect_start = std::time::Instant::now();
        let db = any::connect(endpoint)
            .await
            .map_err(DatabaseError::ConnectionFailed)?;

        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(DatabaseError::ConnectionFailed)?;
        tracing::info!(
            "Database connection established in {:?}",
            connect_start.elapsed()
        );

        let migration_start = std::time::Instant::now();
        migration::MigrationRunner::run(&db).await?;
        tracing::info!("Migrations completed in {:?}", migration_start.elapsed());

        Ok(Self { db })
    }

    /// Fresh in-memory database, used by tests
    pub async fn in_memory() -> Result<Self> {
        Self::connect(&DatabaseConfig::Memory).await
    }
}

impl AsRef<Surreal<Any>> for Store {
    fn as_ref(&self) -> &Surreal<Any> {
        &self.db
    }
}
