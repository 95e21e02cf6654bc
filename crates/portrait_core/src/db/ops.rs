//! Queries against the user and answer-set tables

use std::time::Duration;

use serde::{Deserialize, Serialize};
use surrealdb::RecordId;

use super::schema::{FRIEND_ANSWERS_TABLE, USER_TABLE};
use super::{DatabaseError, FriendAnswerSet, Result, Store, StoreStats, User};
use crate::{CompletedInterview, UserId};

/// Attempts at a write that keeps losing optimistic-transaction conflicts
const MAX_CONFLICT_ATTEMPTS: u32 = 20;

fn user_record(id: UserId) -> RecordId {
    RecordId::from_table_key(USER_TABLE, id.get())
}

/// SurrealKV and the memory engine abort one of two transactions writing the
/// same record; the aborted one rolled back and can simply run again
fn is_retryable_conflict(error: &surrealdb::Error) -> bool {
    let message = error.to_string().to_lowercase();
    message.contains("can be retried") || message.contains("conflict")
}

fn conflict_backoff(attempt: u32) -> Duration {
    let ceiling = 2u64 << attempt.min(6);
    Duration::from_millis(rand::random_range(1..=ceiling))
}

#[derive(Debug, Serialize)]
struct NewAnswerSet {
    user_id: UserId,
    friend_id: UserId,
    answers: Vec<String>,
    created_at: surrealdb::Datetime,
}

#[derive(Debug, Deserialize)]
struct CountRow {
    count: u64,
}

impl Store {
    // ===== User Operations =====

    /// Register a user unless they already exist
    ///
    /// An existing record keeps its original referrer and counters. Returns
    /// whether a new record was created.
    pub async fn register_user(&self, user: UserId, referrer: Option<UserId>) -> Result<bool> {
        let created: Vec<User> = self
            .as_ref()
            .query(
                "INSERT IGNORE INTO user { id: $id, user_id: $user_id, referrer_id: $referrer_id, answers_count: 0, analysis_sent: false }",
            )
            .bind(("id", user_record(user)))
            .bind(("user_id", user))
            .bind(("referrer_id", referrer))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        if !created.is_empty() {
            tracing::info!(user = %user, referrer = ?referrer, "Registered user");
        }
        Ok(!created.is_empty())
    }

    /// Get a user by ID
    pub async fn get_user(&self, user: UserId) -> Result<Option<User>> {
        self.as_ref()
            .select(user_record(user))
            .await
            .map_err(DatabaseError::QueryFailed)
    }

    /// Completed interviews about `user`, or `None` if they never registered
    pub async fn answers_count(&self, user: UserId) -> Result<Option<u32>> {
        Ok(self.get_user(user).await?.map(|u| u.answers_count))
    }

    /// Add one completed interview to the user's count and return the new value
    ///
    /// A single UPSERT, run again whenever the storage engine aborts it on a
    /// write conflict, so concurrent completions for the same referrer never
    /// lose an increment. A referrer who never sent /start themselves is
    /// created here.
    pub async fn increment_answers(&self, user: UserId) -> Result<u32> {
        let mut attempt = 1;
        loop {
            match self.try_increment_answers(user).await {
                Err(DatabaseError::QueryFailed(e))
                    if attempt < MAX_CONFLICT_ATTEMPTS && is_retryable_conflict(&e) =>
                {
                    tracing::debug!(
                        "Increment for {} conflicted (attempt {}), retrying",
                        user,
                        attempt
                    );
                    tokio::time::sleep(conflict_backoff(attempt)).await;
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    async fn try_increment_answers(&self, user: UserId) -> Result<u32> {
        let updated: Option<User> = self
            .as_ref()
            .query("UPSERT $id SET user_id = $user_id, answers_count = (answers_count ?? 0) + 1")
            .bind(("id", user_record(user)))
            .bind(("user_id", user))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        updated
            .map(|u| u.answers_count)
            .ok_or_else(|| DatabaseError::NotFound {
                entity: format!("{USER_TABLE}:{user}"),
            })
    }

    /// Flag that a portrait reached the user
    ///
    /// One boolean for the user, overwritten on every successful portrait.
    pub async fn mark_analysis_sent(&self, user: UserId) -> Result<()> {
        self.as_ref()
            .query("UPDATE $id SET analysis_sent = true")
            .bind(("id", user_record(user)))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .check()
            .map_err(DatabaseError::QueryFailed)?;
        Ok(())
    }

    // ===== Answer Set Operations =====

    /// Persist a finished interview as one immutable answer set
    pub async fn save_answer_set(&self, interview: &CompletedInterview) -> Result<FriendAnswerSet> {
        let record = NewAnswerSet {
            user_id: interview.referrer,
            friend_id: interview.friend,
            answers: interview.answers.to_vec(),
            created_at: chrono::Utc::now().into(),
        };

        // ULID keys sort in creation order, breaking created_at ties
        let created: Option<FriendAnswerSet> = self
            .as_ref()
            .query("CREATE type::thing($table, rand::ulid()) CONTENT $record")
            .bind(("table", FRIEND_ANSWERS_TABLE))
            .bind(("record", record))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)?;

        created.ok_or_else(|| DatabaseError::Other("Failed to create answer set".into()))
    }

    /// Every answer set about `user`, oldest first
    pub async fn answer_sets_for(&self, user: UserId) -> Result<Vec<FriendAnswerSet>> {
        self.as_ref()
            .query("SELECT * FROM friend_answers WHERE user_id = $user_id ORDER BY created_at ASC, id ASC")
            .bind(("user_id", user))
            .await
            .map_err(DatabaseError::QueryFailed)?
            .take(0)
            .map_err(DatabaseError::QueryFailed)
    }

    // ===== Admin =====

    pub async fn stats(&self) -> Result<StoreStats> {
        let mut response = self
            .as_ref()
            .query("SELECT count() FROM user GROUP ALL; SELECT count() FROM friend_answers GROUP ALL")
            .await
            .map_err(DatabaseError::QueryFailed)?;

        let users: Option<CountRow> = response.take(0).map_err(DatabaseError::QueryFailed)?;
        let answer_sets: Option<CountRow> =
            response.take(1).map_err(DatabaseError::QueryFailed)?;

        Ok(StoreStats {
            users: users.map(|r| r.count).unwrap_or(0),
            answer_sets: answer_sets.map(|r| r.count).unwrap_or(0),
        })
    }
}
