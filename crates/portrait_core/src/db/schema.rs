//! Database schema definitions

/// Table names, shared by the schema and the queries in `ops`
pub const USER_TABLE: &str = "user";
pub const FRIEND_ANSWERS_TABLE: &str = "friend_answers";
pub const SYSTEM_METADATA_TABLE: &str = "system_metadata";

/// SQL schema definitions for the database
pub struct Schema;

impl Schema {
    /// Get all table definitions
    pub fn tables() -> Vec<TableDefinition> {
        vec![Self::system_metadata(), Self::users(), Self::friend_answers()]
    }

    /// System metadata table
    pub fn system_metadata() -> TableDefinition {
        TableDefinition {
            name: SYSTEM_METADATA_TABLE.to_string(),
            schema: r#"
                DEFINE TABLE IF NOT EXISTS system_metadata SCHEMAFULL;
                DEFINE FIELD IF NOT EXISTS schema_version ON system_metadata TYPE int;
                DEFINE FIELD IF NOT EXISTS created_at ON system_metadata TYPE datetime;
                DEFINE FIELD IF NOT EXISTS updated_at ON system_metadata TYPE datetime;
            "#
            .to_string(),
            indexes: vec![],
        }
    }

    /// Registered users, keyed `user:<platform id>`
    pub fn users() -> TableDefinition {
        TableDefinition {
            name: USER_TABLE.to_string(),
            schema: r#"
                DEFINE TABLE IF NOT EXISTS user SCHEMAFULL;
                DEFINE FIELD IF NOT EXISTS user_id ON user TYPE int;
                DEFINE FIELD IF NOT EXISTS referrer_id ON user TYPE option<int>;
                DEFINE FIELD IF NOT EXISTS answers_count ON user TYPE int DEFAULT 0;
                DEFINE FIELD IF NOT EXISTS analysis_sent ON user TYPE bool DEFAULT false;
                DEFINE FIELD IF NOT EXISTS created_at ON user TYPE datetime DEFAULT time::now();
            "#
            .to_string(),
            indexes: vec![
                "DEFINE INDEX IF NOT EXISTS user_user_id ON user FIELDS user_id UNIQUE"
                    .to_string(),
            ],
        }
    }

    /// One row per completed friend interview
    pub fn friend_answers() -> TableDefinition {
        TableDefinition {
            name: FRIEND_ANSWERS_TABLE.to_string(),
            schema: r#"
                DEFINE TABLE IF NOT EXISTS friend_answers SCHEMAFULL;
                DEFINE FIELD IF NOT EXISTS user_id ON friend_answers TYPE int;
                DEFINE FIELD IF NOT EXISTS friend_id ON friend_answers TYPE int;
                DEFINE FIELD IF NOT EXISTS answers ON friend_answers TYPE array<string, 5>;
                DEFINE FIELD IF NOT EXISTS created_at ON friend_answers TYPE datetime;
            "#
            .to_string(),
            indexes: vec![
                "DEFINE INDEX IF NOT EXISTS friend_answers_user ON friend_answers FIELDS user_id"
                    .to_string(),
            ],
        }
    }
}

/// Table definition with schema and indexes
#[derive(Debug, Clone)]
pub struct TableDefinition {
    pub name: String,
    pub schema: String,
    pub indexes: Vec<String>,
}
