//! Database initialization
//!
//! Creates the database file on first run and bootstraps every table with
//! `CREATE TABLE IF NOT EXISTS`, so opening an existing database is a no-op
//! apart from seeding any missing standard rows.

use crate::schedule::metadata::{DESCRIPTION_KEY, METADATA_TABLES, TAG_KEY, TITLE_KEY};
use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::{debug, info};

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // WAL gives readers a consistent snapshot while a writer appends
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await?;

    sqlx::query("PRAGMA busy_timeout = 5000")
        .execute(&pool)
        .await?;

    init_schema(&pool).await?;

    Ok(pool)
}

/// Create all tables and seed standard rows (idempotent)
///
/// Also used directly by tests against `sqlite::memory:` pools.
pub async fn init_schema(pool: &SqlitePool) -> Result<()> {
    sqlx::query("PRAGMA foreign_keys = ON").execute(pool).await?;

    create_member_table(pool).await?;
    create_metadata_key_table(pool).await?;
    create_show_table(pool).await?;
    create_season_table(pool).await?;
    create_timeslot_table(pool).await?;

    for table in METADATA_TABLES {
        table.create(pool).await?;
    }

    create_credit_type_table(pool).await?;
    create_credit_table(pool).await?;

    seed_metadata_keys(pool).await?;
    seed_credit_types(pool).await?;

    debug!("Schema ready");
    Ok(())
}

async fn create_member_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS member (
            memberid INTEGER PRIMARY KEY AUTOINCREMENT,
            fname TEXT NOT NULL,
            sname TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_metadata_key_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS metadata_key (
            metadata_key_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            allow_multiple INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_show_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS show (
            show_id INTEGER PRIMARY KEY AUTOINCREMENT,
            memberid INTEGER NOT NULL REFERENCES member(memberid),
            submitted INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_season_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS show_season (
            show_season_id INTEGER PRIMARY KEY AUTOINCREMENT,
            show_id INTEGER NOT NULL REFERENCES show(show_id) ON DELETE CASCADE,
            memberid INTEGER NOT NULL REFERENCES member(memberid),
            submitted INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_timeslot_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS show_season_timeslot (
            show_season_timeslot_id INTEGER PRIMARY KEY AUTOINCREMENT,
            show_season_id INTEGER NOT NULL REFERENCES show_season(show_season_id) ON DELETE CASCADE,
            start_time INTEGER NOT NULL,
            duration INTEGER NOT NULL CHECK (duration >= 0)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_timeslot_start ON show_season_timeslot (start_time)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_credit_type_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS show_credit_type (
            credit_type_id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            plural TEXT NOT NULL,
            is_in_byline INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_credit_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS show_credit (
            show_credit_id INTEGER PRIMARY KEY AUTOINCREMENT,
            show_id INTEGER NOT NULL REFERENCES show(show_id) ON DELETE CASCADE,
            creditid INTEGER NOT NULL REFERENCES member(memberid),
            memberid INTEGER NOT NULL REFERENCES member(memberid),
            approvedid INTEGER REFERENCES member(memberid),
            credit_type_id INTEGER NOT NULL REFERENCES show_credit_type(credit_type_id),
            effective_from INTEGER NOT NULL,
            effective_to INTEGER
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_show_credit_show ON show_credit (show_id)")
        .execute(pool)
        .await?;

    Ok(())
}

/// Standard metadata keys every deployment needs
async fn seed_metadata_keys(pool: &SqlitePool) -> Result<()> {
    for (name, allow_multiple) in [(TITLE_KEY, false), (DESCRIPTION_KEY, false), (TAG_KEY, true)] {
        sqlx::query("INSERT OR IGNORE INTO metadata_key (name, allow_multiple) VALUES (?, ?)")
            .bind(name)
            .bind(allow_multiple as i64)
            .execute(pool)
            .await?;
    }

    Ok(())
}

/// Standard credit types
async fn seed_credit_types(pool: &SqlitePool) -> Result<()> {
    let types = [
        ("Presenter", "Presenters", true),
        ("Producer", "Producers", false),
        ("Reporter", "Reporters", true),
    ];

    for (name, plural, is_in_byline) in types {
        sqlx::query(
            "INSERT OR IGNORE INTO show_credit_type (name, plural, is_in_byline) VALUES (?, ?, ?)",
        )
        .bind(name)
        .bind(plural)
        .bind(is_in_byline as i64)
        .execute(pool)
        .await?;
    }

    Ok(())
}
