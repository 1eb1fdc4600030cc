// Slot store - isolates all database side effects behind one seam.
//
// Each named slot holds a whole JSON-serialized collection, the way the
// original kept one browser-storage key per collection. Writes are
// conditional on a version column so concurrent read-modify-write cycles
// cannot silently clobber each other.
use async_trait::async_trait;
use rusqlite::params;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::state::DbPool;

/// Slot key for the active session user (single object).
pub const SESSION_SLOT: &str = "minecraft_user";
/// Slot key for the Users collection.
pub const USERS_SLOT: &str = "minecraft_users";
/// Slot key for service listings.
pub const LISTINGS_SLOT: &str = "minecraft_posts";
/// Slot key for service requests.
pub const REQUESTS_SLOT: &str = "minecraft_service_requests";
/// Slot key for community posts.
pub const COMMUNITY_SLOT: &str = "minecraft_community_posts";

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("Database error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The slot exists but its JSON does not parse. Deliberately distinct
    /// from an absent slot: a corrupt collection must never read as empty.
    #[error("Corrupt slot {slot}: {source}")]
    Corrupt {
        slot: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode slot {slot}: {source}")]
    Encode {
        slot: String,
        #[source]
        source: serde_json::Error,
    },

    /// A concurrent writer advanced the slot since it was read.
    #[error("Version conflict on slot {slot}")]
    Conflict { slot: String },
}

/// Slot store trait - all persistence operations.
#[async_trait]
pub trait SlotStore: Send + Sync {
    /// Read a slot's raw JSON and version. `None` when the slot is absent.
    async fn read(&self, slot: &str) -> Result<Option<(String, i64)>, SlotError>;

    /// Conditionally write a slot. `expected` is the version the caller
    /// read (0 for an absent slot). Returns the new version, or
    /// [`SlotError::Conflict`] when another writer got there first.
    async fn write(&self, slot: &str, json: &str, expected: i64) -> Result<i64, SlotError>;

    /// Unconditionally overwrite a slot (idempotent upsert).
    async fn put(&self, slot: &str, json: &str) -> Result<(), SlotError>;

    /// Remove a slot entirely.
    async fn clear(&self, slot: &str) -> Result<(), SlotError>;
}

/// SQLite implementation
pub struct SqliteSlotStore {
    pool: DbPool,
}

impl SqliteSlotStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SlotStore for SqliteSlotStore {
    async fn read(&self, slot: &str) -> Result<Option<(String, i64)>, SlotError> {
        let conn = self.pool.get()?;

        let result = conn.query_row(
            "SELECT value_json, version FROM slots WHERE key = ?1",
            params![slot],
            |row| Ok((row.get(0)?, row.get(1)?)),
        );

        match result {
            Ok(pair) => Ok(Some(pair)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, slot: &str, json: &str, expected: i64) -> Result<i64, SlotError> {
        let conn = self.pool.get()?;

        let rows = if expected == 0 {
            conn.execute(
                "INSERT INTO slots (key, value_json, version) VALUES (?1, ?2, 1)
                 ON CONFLICT(key) DO NOTHING",
                params![slot, json],
            )?
        } else {
            conn.execute(
                "UPDATE slots SET value_json = ?2, version = version + 1,
                        updated_at = datetime('now')
                 WHERE key = ?1 AND version = ?3",
                params![slot, json, expected],
            )?
        };

        if rows == 0 {
            return Err(SlotError::Conflict { slot: slot.into() });
        }
        Ok(expected + 1)
    }

    async fn put(&self, slot: &str, json: &str) -> Result<(), SlotError> {
        let conn = self.pool.get()?;

        conn.execute(
            "INSERT INTO slots (key, value_json, version) VALUES (?1, ?2, 1)
             ON CONFLICT(key) DO UPDATE SET
               value_json = excluded.value_json,
               version = version + 1,
               updated_at = datetime('now')",
            params![slot, json],
        )?;

        Ok(())
    }

    async fn clear(&self, slot: &str) -> Result<(), SlotError> {
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM slots WHERE key = ?1", params![slot])?;
        Ok(())
    }
}

/// Type alias for Arc-wrapped store (for AppState and collections)
pub type DynSlotStore = Arc<dyn SlotStore>;

/// A collection together with the slot version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<T> {
    pub records: T,
    pub version: i64,
}

/// Retry budget for conflicting read-modify-write cycles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub base_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_backoff_ms: 25,
        }
    }
}

impl RetryPolicy {
    fn delay_for_attempt(&self, attempt: usize) -> Duration {
        Duration::from_millis(self.base_backoff_ms.saturating_mul(attempt as u64))
    }
}

/// Load a whole collection. An absent slot is an empty collection at
/// version 0; a present-but-unparseable slot is [`SlotError::Corrupt`].
pub async fn load_records<T>(store: &dyn SlotStore, slot: &str) -> Result<Versioned<Vec<T>>, SlotError>
where
    T: DeserializeOwned,
{
    match store.read(slot).await? {
        None => Ok(Versioned {
            records: Vec::new(),
            version: 0,
        }),
        Some((json, version)) => {
            let records = serde_json::from_str(&json).map_err(|source| SlotError::Corrupt {
                slot: slot.into(),
                source,
            })?;
            Ok(Versioned { records, version })
        }
    }
}

/// Serialize and conditionally write a whole collection.
pub async fn save_records<T>(
    store: &dyn SlotStore,
    slot: &str,
    records: &[T],
    expected: i64,
) -> Result<i64, SlotError>
where
    T: Serialize,
{
    let json = serde_json::to_string(records).map_err(|source| SlotError::Encode {
        slot: slot.into(),
        source,
    })?;
    store.write(slot, &json, expected).await
}

/// One load-transform-save cycle over a collection, retried on version
/// conflict. The transform runs again on each retry against fresh records,
/// so it must not carry side effects of its own.
pub async fn update_records<T, R, E, F>(
    store: &dyn SlotStore,
    slot: &str,
    mut apply: F,
) -> Result<R, E>
where
    T: Serialize + DeserializeOwned,
    E: From<SlotError>,
    F: FnMut(&mut Vec<T>) -> Result<R, E>,
{
    let policy = RetryPolicy::default();

    for attempt in 1..=policy.max_attempts {
        let Versioned { mut records, version } = load_records::<T>(store, slot).await?;
        let out = apply(&mut records)?;

        match save_records(store, slot, &records, version).await {
            Ok(_) => return Ok(out),
            Err(SlotError::Conflict { .. }) if attempt < policy.max_attempts => {
                tracing::warn!(slot, attempt, "slot version conflict, retrying");
                tokio::time::sleep(policy.delay_for_attempt(attempt)).await;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Err(SlotError::Conflict { slot: slot.into() }.into())
}

/// Load a single-object slot (the session slot). `None` when absent.
pub async fn load_record<T>(store: &dyn SlotStore, slot: &str) -> Result<Option<T>, SlotError>
where
    T: DeserializeOwned,
{
    match store.read(slot).await? {
        None => Ok(None),
        Some((json, _)) => {
            let record = serde_json::from_str(&json).map_err(|source| SlotError::Corrupt {
                slot: slot.into(),
                source,
            })?;
            Ok(Some(record))
        }
    }
}

/// Overwrite a single-object slot. Last writer wins; the slot has exactly
/// one owner so there is no cycle to protect.
pub async fn save_record<T>(store: &dyn SlotStore, slot: &str, record: &T) -> Result<(), SlotError>
where
    T: Serialize,
{
    let json = serde_json::to_string(record).map_err(|source| SlotError::Encode {
        slot: slot.into(),
        source,
    })?;
    store.put(slot, &json).await
}
