//! Shared fixtures for ury-common integration tests

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use ury_common::db::{create_member, init_schema, Member};

/// Fresh in-memory database with the full schema
pub async fn setup_test_db() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    init_schema(&pool).await.expect("Failed to create schema");
    pool
}

/// Member used as creator/approver in fixtures
pub async fn test_member(pool: &SqlitePool) -> Member {
    create_member(pool, "Test", "Member")
        .await
        .expect("Failed to create member")
}

pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// 2013-02-04 at the given time
pub fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2013, 2, 4, hour, minute, 0).unwrap()
}
