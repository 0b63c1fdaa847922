//! Text metadata with effective-from versioning
//!
//! Every metadatum is an append-only row: a key, a text value, the moment it
//! takes effect, who wrote it and (optionally) who approved it. The current
//! value of a key is the entry with the latest `effective_from` that is not
//! after the reference time. Newer values supersede older ones by being
//! added, never by editing.
//!
//! Subjects (shows, seasons, timeslots) each keep their entries in their own
//! table. All of those tables share the column layout described by
//! [`MetadataTable`] and differ only in the foreign key to their subject.
//!
//! When a subject has no current value for a key, lookups fall back to its
//! parent subject: timeslot → season → show.

use crate::time::{from_epoch_nanos, to_epoch_nanos};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, warn};

/// Key for show titles
pub const TITLE_KEY: &str = "title";

/// Key for show descriptions
pub const DESCRIPTION_KEY: &str = "description";

/// Key for free-form tags (multiple values may be current)
pub const TAG_KEY: &str = "tag";

/// A metadata key, which defines the semantics of a piece of metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataKey {
    pub id: i64,
    /// Human-readable name, e.g. "title"
    pub name: String,
    /// If true, several values of this key can be current at once (tags)
    pub allow_multiple: bool,
}

/// Column layout shared by every per-subject metadata table
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct MetadataTable {
    /// Metadata table name
    pub table: &'static str,
    /// Primary key column of the metadata table
    pub id_column: &'static str,
    /// Foreign key column pointing at the subject
    pub subject_column: &'static str,
    /// Table the subject lives in
    pub subject_table: &'static str,
}

/// Show metadata (`show_metadata.show_id → show`)
pub static SHOW_METADATA: MetadataTable = MetadataTable {
    table: "show_metadata",
    id_column: "show_metadata_id",
    subject_column: "show_id",
    subject_table: "show",
};

/// Season metadata (`season_metadata.show_season_id → show_season`)
pub static SEASON_METADATA: MetadataTable = MetadataTable {
    table: "season_metadata",
    id_column: "season_metadata_id",
    subject_column: "show_season_id",
    subject_table: "show_season",
};

/// Timeslot metadata (`timeslot_metadata.show_season_timeslot_id → show_season_timeslot`)
pub static TIMESLOT_METADATA: MetadataTable = MetadataTable {
    table: "timeslot_metadata",
    id_column: "timeslot_metadata_id",
    subject_column: "show_season_timeslot_id",
    subject_table: "show_season_timeslot",
};

/// All metadata tables, in creation order
pub static METADATA_TABLES: [&MetadataTable; 3] =
    [&SHOW_METADATA, &SEASON_METADATA, &TIMESLOT_METADATA];

impl MetadataTable {
    /// Create this metadata table if it does not exist
    pub async fn create(&self, pool: &SqlitePool) -> Result<()> {
        let sql = format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                {id} INTEGER PRIMARY KEY AUTOINCREMENT,
                {subject} INTEGER NOT NULL REFERENCES {subject_table}({subject}) ON DELETE CASCADE,
                metadata_key_id INTEGER NOT NULL REFERENCES metadata_key(metadata_key_id),
                metadata_value TEXT NOT NULL,
                effective_from INTEGER NOT NULL,
                memberid INTEGER NOT NULL REFERENCES member(memberid),
                approvedid INTEGER REFERENCES member(memberid)
            )
            "#,
            table = self.table,
            id = self.id_column,
            subject = self.subject_column,
            subject_table = self.subject_table,
        );
        sqlx::query(&sql).execute(pool).await?;

        let index = format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_lookup ON {table} ({subject}, metadata_key_id, effective_from)",
            table = self.table,
            subject = self.subject_column,
        );
        sqlx::query(&index).execute(pool).await?;

        Ok(())
    }
}

/// The metadata attached to one subject: a table plus the subject's id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MetadataSet {
    pub table: &'static MetadataTable,
    pub subject_id: i64,
}

impl MetadataSet {
    pub fn new(table: &'static MetadataTable, subject_id: i64) -> Self {
        Self { table, subject_id }
    }
}

impl fmt::Display for MetadataSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} #{}", self.table.subject_table, self.subject_id)
    }
}

/// One stored metadatum
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataEntry {
    pub id: i64,
    pub key_id: i64,
    pub value: String,
    pub effective_from: DateTime<Utc>,
    pub creator: i64,
    pub approver: Option<i64>,
}

impl MetadataEntry {
    pub fn is_approved(&self) -> bool {
        self.approver.is_some()
    }
}

/// Something that can own metadata
///
/// Implemented by each subject type; `metadata_parent` names the subject
/// whose metadata is inherited when this one has none for a key.
#[async_trait]
pub trait MetadataSubject: Send + Sync {
    /// Where this subject's metadata entries live
    fn metadata_set(&self) -> MetadataSet;

    /// Subject to inherit metadata from, if any
    async fn metadata_parent(&self, pool: &SqlitePool) -> Result<Option<Box<dyn MetadataSubject>>>;
}

/// Look up a metadata key by name
///
/// Fails with [`Error::NotFound`] for unknown names.
pub async fn load_metadata_key(pool: &SqlitePool, name: &str) -> Result<MetadataKey> {
    let row = sqlx::query(
        "SELECT metadata_key_id, name, allow_multiple FROM metadata_key WHERE name = ?",
    )
    .bind(name)
    .fetch_optional(pool)
    .await?;

    match row {
        Some(row) => Ok(MetadataKey {
            id: row.get("metadata_key_id"),
            name: row.get("name"),
            allow_multiple: row.get::<i64, _>("allow_multiple") != 0,
        }),
        None => Err(Error::NotFound(format!("Metadata key '{}'", name))),
    }
}

/// List every metadata key, alphabetically
pub async fn list_metadata_keys(pool: &SqlitePool) -> Result<Vec<MetadataKey>> {
    let rows = sqlx::query(
        "SELECT metadata_key_id, name, allow_multiple FROM metadata_key ORDER BY name ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows
        .iter()
        .map(|row| MetadataKey {
            id: row.get("metadata_key_id"),
            name: row.get("name"),
            allow_multiple: row.get::<i64, _>("allow_multiple") != 0,
        })
        .collect())
}

/// Create a metadata key (idempotent on name)
pub async fn ensure_metadata_key(
    pool: &SqlitePool,
    name: &str,
    allow_multiple: bool,
) -> Result<MetadataKey> {
    sqlx::query("INSERT OR IGNORE INTO metadata_key (name, allow_multiple) VALUES (?, ?)")
        .bind(name)
        .bind(allow_multiple as i64)
        .execute(pool)
        .await?;

    load_metadata_key(pool, name).await
}

/// Append a metadatum to a subject
///
/// This is the only write the metadata system offers. `effective_from` is
/// supplied by the caller; scheduling a change in advance is just a future
/// `effective_from`.
pub async fn record_metadatum(
    pool: &SqlitePool,
    set: MetadataSet,
    key_name: &str,
    value: &str,
    creator: i64,
    approver: Option<i64>,
    effective_from: DateTime<Utc>,
) -> Result<MetadataEntry> {
    let key = load_metadata_key(pool, key_name).await?;

    let sql = format!(
        "INSERT INTO {} ({}, metadata_key_id, metadata_value, effective_from, memberid, approvedid) \
         VALUES (?, ?, ?, ?, ?, ?)",
        set.table.table, set.table.subject_column,
    );
    let result = sqlx::query(&sql)
        .bind(set.subject_id)
        .bind(key.id)
        .bind(value)
        .bind(to_epoch_nanos(effective_from)?)
        .bind(creator)
        .bind(approver)
        .execute(pool)
        .await?;

    debug!(
        "Recorded {} = {:?} on {} effective {}",
        key.name, value, set, effective_from
    );

    Ok(MetadataEntry {
        id: result.last_insert_rowid(),
        key_id: key.id,
        value: value.to_string(),
        effective_from,
        creator,
        approver,
    })
}

/// Every entry for one key on one subject, oldest first
///
/// Includes future and unapproved entries; this is the raw history.
pub async fn metadata_history(
    pool: &SqlitePool,
    set: MetadataSet,
    key_name: &str,
) -> Result<Vec<MetadataEntry>> {
    let key = load_metadata_key(pool, key_name).await?;

    let sql = format!(
        "SELECT {id} AS id, metadata_key_id, metadata_value, effective_from, memberid, approvedid \
         FROM {table} WHERE {subject} = ? AND metadata_key_id = ? \
         ORDER BY effective_from ASC, {id} ASC",
        id = set.table.id_column,
        table = set.table.table,
        subject = set.table.subject_column,
    );
    let rows = sqlx::query(&sql)
        .bind(set.subject_id)
        .bind(key.id)
        .fetch_all(pool)
        .await?;

    Ok(rows
        .iter()
        .map(|row| MetadataEntry {
            id: row.get("id"),
            key_id: row.get("metadata_key_id"),
            value: row.get("metadata_value"),
            effective_from: from_epoch_nanos(row.get("effective_from")),
            creator: row.get("memberid"),
            approver: row.get("approvedid"),
        })
        .collect())
}

/// Resolves current metadata values, following subject inheritance
#[derive(Debug, Clone)]
pub struct MetadataResolver {
    pool: SqlitePool,
    require_approval: bool,
    max_depth: usize,
}

impl MetadataResolver {
    /// Default longest parent chain followed
    pub const DEFAULT_MAX_DEPTH: usize = 8;

    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            require_approval: false,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        }
    }

    /// Only count entries that have an approver
    pub fn require_approval(mut self, require: bool) -> Self {
        self.require_approval = require;
        self
    }

    /// Longest parent chain followed before failing with
    /// [`Error::InheritanceCycle`]
    ///
    /// With 0 any lookup that needs a parent fails, so configuration
    /// rejects it; see [`ScheduleConfig::validate`](crate::config::ScheduleConfig::validate).
    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Current value of `key_name` on `subject` as of `as_of`
    ///
    /// The current value is the most recently effected value that is not in
    /// the future. If the subject has none and `inherit` is true, the lookup
    /// moves up to the subject's parent.
    ///
    /// Returns `Ok(None)` when nothing in the chain has a value; unknown key
    /// names are [`Error::NotFound`].
    pub async fn current_metadatum(
        &self,
        subject: &dyn MetadataSubject,
        key_name: &str,
        as_of: DateTime<Utc>,
        inherit: bool,
    ) -> Result<Option<String>> {
        let key = load_metadata_key(&self.pool, key_name).await?;
        let values = self.resolve(subject, &key, as_of, inherit, 1).await?;
        Ok(values.into_iter().next())
    }

    /// All current values of `key_name` on `subject`, newest first
    ///
    /// For keys that allow multiple values every eligible entry of the first
    /// subject in the chain that has any is returned; for single-valued keys
    /// this is [`current_metadatum`](Self::current_metadatum) as a list.
    pub async fn current_metadata(
        &self,
        subject: &dyn MetadataSubject,
        key_name: &str,
        as_of: DateTime<Utc>,
        inherit: bool,
    ) -> Result<Vec<String>> {
        let key = load_metadata_key(&self.pool, key_name).await?;
        // SQLite treats a negative LIMIT as unbounded
        let limit = if key.allow_multiple { -1 } else { 1 };
        self.resolve(subject, &key, as_of, inherit, limit).await
    }

    /// Current title, inherited if necessary
    pub async fn title(
        &self,
        subject: &dyn MetadataSubject,
        as_of: DateTime<Utc>,
    ) -> Result<Option<String>> {
        self.current_metadatum(subject, TITLE_KEY, as_of, true).await
    }

    /// Current description, inherited if necessary
    pub async fn description(
        &self,
        subject: &dyn MetadataSubject,
        as_of: DateTime<Utc>,
    ) -> Result<Option<String>> {
        self.current_metadatum(subject, DESCRIPTION_KEY, as_of, true).await
    }

    async fn resolve(
        &self,
        subject: &dyn MetadataSubject,
        key: &MetadataKey,
        as_of: DateTime<Utc>,
        inherit: bool,
        limit: i64,
    ) -> Result<Vec<String>> {
        let first = subject.metadata_set();
        let values = self.current_values(first, key, as_of, limit).await?;
        if !values.is_empty() || !inherit {
            return Ok(values);
        }

        let mut visited = HashSet::from([first]);
        let mut next = subject.metadata_parent(&self.pool).await?;

        while let Some(parent) = next {
            let set = parent.metadata_set();
            if !visited.insert(set) {
                warn!("Metadata parent chain of {} loops at {}", first, set);
                return Err(Error::InheritanceCycle(format!(
                    "{} inherits from itself via {}",
                    first, set
                )));
            }
            // visited holds the subject itself plus its ancestors so far
            if visited.len() > self.max_depth + 1 {
                return Err(Error::InheritanceCycle(format!(
                    "{} has more than {} ancestors",
                    first, self.max_depth
                )));
            }

            let values = self.current_values(set, key, as_of, limit).await?;
            if !values.is_empty() {
                debug!("{} for {} inherited from {}", key.name, first, set);
                return Ok(values);
            }

            next = parent.metadata_parent(&self.pool).await?;
        }

        Ok(Vec::new())
    }

    /// Eligible values at one level of the chain, newest first
    async fn current_values(
        &self,
        set: MetadataSet,
        key: &MetadataKey,
        as_of: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<String>> {
        let approval = if self.require_approval {
            "AND approvedid IS NOT NULL"
        } else {
            ""
        };
        let sql = format!(
            "SELECT metadata_value FROM {table} \
             WHERE {subject} = ? AND metadata_key_id = ? AND effective_from <= ? {approval} \
             ORDER BY effective_from DESC, {id} DESC \
             LIMIT ?",
            table = set.table.table,
            subject = set.table.subject_column,
            id = set.table.id_column,
            approval = approval,
        );

        let values = sqlx::query_scalar::<_, String>(&sql)
            .bind(set.subject_id)
            .bind(key.id)
            .bind(to_epoch_nanos(as_of)?)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(values)
    }
}
