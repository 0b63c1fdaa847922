//! Shows, seasons and timeslots
//!
//! A show runs in seasons; each season is broadcast in timeslots. All three
//! carry metadata. Timeslots inherit from their season and seasons from
//! their show.

use crate::schedule::metadata::{
    MetadataSet, MetadataSubject, SEASON_METADATA, SHOW_METADATA, TIMESLOT_METADATA,
};
use crate::time::{from_epoch_nanos, seconds_to_duration, to_epoch_nanos};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

/// A show on the schedule
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Show {
    pub id: i64,
    /// Member who submitted the show
    pub creator: i64,
    pub submitted: DateTime<Utc>,
}

/// One run of a show
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Season {
    pub id: i64,
    pub show_id: i64,
    pub submitted: DateTime<Utc>,
}

/// A scheduled broadcast of a season
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Timeslot {
    pub id: i64,
    pub season_id: i64,
    pub start_time: DateTime<Utc>,
    pub duration_secs: i64,
}

impl Timeslot {
    pub fn duration(&self) -> Duration {
        seconds_to_duration(self.duration_secs)
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.start_time + self.duration()
    }

    pub(crate) fn from_row(row: &SqliteRow) -> Self {
        Self {
            id: row.get("show_season_timeslot_id"),
            season_id: row.get("show_season_id"),
            start_time: from_epoch_nanos(row.get("start_time")),
            duration_secs: row.get("duration"),
        }
    }
}

/// Load a show; missing rows are [`Error::NotFound`]
pub async fn load_show(pool: &SqlitePool, show_id: i64) -> Result<Show> {
    let row = sqlx::query("SELECT show_id, memberid, submitted FROM show WHERE show_id = ?")
        .bind(show_id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| Error::NotFound(format!("Show {}", show_id)))?;

    Ok(Show {
        id: row.get("show_id"),
        creator: row.get("memberid"),
        submitted: from_epoch_nanos(row.get("submitted")),
    })
}

/// Load a season; missing rows are [`Error::NotFound`]
pub async fn load_season(pool: &SqlitePool, season_id: i64) -> Result<Season> {
    let row = sqlx::query(
        "SELECT show_season_id, show_id, submitted FROM show_season WHERE show_season_id = ?",
    )
    .bind(season_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Season {}", season_id)))?;

    Ok(Season {
        id: row.get("show_season_id"),
        show_id: row.get("show_id"),
        submitted: from_epoch_nanos(row.get("submitted")),
    })
}

/// Load a timeslot; missing rows are [`Error::NotFound`]
pub async fn load_timeslot(pool: &SqlitePool, timeslot_id: i64) -> Result<Timeslot> {
    let row = sqlx::query(
        r#"
        SELECT show_season_timeslot_id, show_season_id, start_time, duration
        FROM show_season_timeslot
        WHERE show_season_timeslot_id = ?
        "#,
    )
    .bind(timeslot_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| Error::NotFound(format!("Timeslot {}", timeslot_id)))?;

    Ok(Timeslot::from_row(&row))
}

/// Insert a show
pub async fn create_show(
    pool: &SqlitePool,
    creator: i64,
    submitted: DateTime<Utc>,
) -> Result<Show> {
    let result = sqlx::query("INSERT INTO show (memberid, submitted) VALUES (?, ?)")
        .bind(creator)
        .bind(to_epoch_nanos(submitted)?)
        .execute(pool)
        .await?;

    Ok(Show {
        id: result.last_insert_rowid(),
        creator,
        submitted,
    })
}

/// Insert a season of an existing show
pub async fn create_season(
    pool: &SqlitePool,
    show_id: i64,
    creator: i64,
    submitted: DateTime<Utc>,
) -> Result<Season> {
    let result =
        sqlx::query("INSERT INTO show_season (show_id, memberid, submitted) VALUES (?, ?, ?)")
            .bind(show_id)
            .bind(creator)
            .bind(to_epoch_nanos(submitted)?)
            .execute(pool)
            .await?;

    Ok(Season {
        id: result.last_insert_rowid(),
        show_id,
        submitted,
    })
}

/// Schedule a timeslot for an existing season
///
/// Durations are whole seconds; negative or fractional durations are
/// rejected with [`Error::InvalidArgument`].
pub async fn create_timeslot(
    pool: &SqlitePool,
    season_id: i64,
    start_time: DateTime<Utc>,
    duration: Duration,
) -> Result<Timeslot> {
    if duration < Duration::zero() {
        return Err(Error::InvalidArgument(format!(
            "Timeslot duration must not be negative (got {}s)",
            duration.num_seconds()
        )));
    }
    if duration.subsec_nanos() != 0 {
        return Err(Error::InvalidArgument(format!(
            "Timeslot duration must be whole seconds (got {})",
            duration
        )));
    }
    let duration_secs = duration.num_seconds();

    let result = sqlx::query(
        "INSERT INTO show_season_timeslot (show_season_id, start_time, duration) VALUES (?, ?, ?)",
    )
    .bind(season_id)
    .bind(to_epoch_nanos(start_time)?)
    .bind(duration_secs)
    .execute(pool)
    .await?;

    Ok(Timeslot {
        id: result.last_insert_rowid(),
        season_id,
        start_time,
        duration_secs,
    })
}

#[async_trait]
impl MetadataSubject for Show {
    fn metadata_set(&self) -> MetadataSet {
        MetadataSet::new(&SHOW_METADATA, self.id)
    }

    async fn metadata_parent(&self, _pool: &SqlitePool) -> Result<Option<Box<dyn MetadataSubject>>> {
        Ok(None)
    }
}

#[async_trait]
impl MetadataSubject for Season {
    fn metadata_set(&self) -> MetadataSet {
        MetadataSet::new(&SEASON_METADATA, self.id)
    }

    async fn metadata_parent(&self, pool: &SqlitePool) -> Result<Option<Box<dyn MetadataSubject>>> {
        let show = load_show(pool, self.show_id).await?;
        Ok(Some(Box::new(show)))
    }
}

#[async_trait]
impl MetadataSubject for Timeslot {
    fn metadata_set(&self) -> MetadataSet {
        MetadataSet::new(&TIMESLOT_METADATA, self.id)
    }

    async fn metadata_parent(&self, pool: &SqlitePool) -> Result<Option<Box<dyn MetadataSubject>>> {
        let season = load_season(pool, self.season_id).await?;
        Ok(Some(Box::new(season)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_schema;
    use chrono::TimeZone;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn setup_test_db() -> SqlitePool {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        init_schema(&pool).await.unwrap();
        sqlx::query("INSERT INTO member (memberid, fname, sname) VALUES (1, 'Test', 'Member')")
            .execute(&pool)
            .await
            .unwrap();
        pool
    }

    #[tokio::test]
    async fn test_create_and_load_chain() {
        let pool = setup_test_db().await;
        let submitted = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap();
        let start = Utc.with_ymd_and_hms(2013, 1, 7, 10, 0, 0).unwrap();

        let show = create_show(&pool, 1, submitted).await.unwrap();
        let season = create_season(&pool, show.id, 1, submitted).await.unwrap();
        let slot = create_timeslot(&pool, season.id, start, Duration::minutes(90))
            .await
            .unwrap();

        assert_eq!(load_show(&pool, show.id).await.unwrap(), show);
        assert_eq!(load_season(&pool, season.id).await.unwrap(), season);

        let loaded = load_timeslot(&pool, slot.id).await.unwrap();
        assert_eq!(loaded, slot);
        assert_eq!(loaded.end_time(), Utc.with_ymd_and_hms(2013, 1, 7, 11, 30, 0).unwrap());
    }

    #[tokio::test]
    async fn test_missing_rows_are_not_found() {
        let pool = setup_test_db().await;
        assert!(matches!(load_show(&pool, 404).await, Err(Error::NotFound(_))));
        assert!(matches!(load_season(&pool, 404).await, Err(Error::NotFound(_))));
        assert!(matches!(load_timeslot(&pool, 404).await, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_negative_duration_rejected() {
        let pool = setup_test_db().await;
        let now = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap();
        let show = create_show(&pool, 1, now).await.unwrap();
        let season = create_season(&pool, show.id, 1, now).await.unwrap();

        let result = create_timeslot(&pool, season.id, now, Duration::minutes(-5)).await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_fractional_duration_rejected() {
        let pool = setup_test_db().await;
        let now = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap();
        let show = create_show(&pool, 1, now).await.unwrap();
        let season = create_season(&pool, show.id, 1, now).await.unwrap();

        let result =
            create_timeslot(&pool, season.id, now, Duration::milliseconds(1500)).await;
        assert!(matches!(result, Err(Error::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_subsecond_start_time_round_trips() {
        let pool = setup_test_db().await;
        let submitted = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap()
            + Duration::milliseconds(450);
        let start = Utc.with_ymd_and_hms(2013, 1, 7, 10, 0, 0).unwrap()
            + Duration::milliseconds(900);

        let show = create_show(&pool, 1, submitted).await.unwrap();
        let season = create_season(&pool, show.id, 1, submitted).await.unwrap();
        let slot = create_timeslot(&pool, season.id, start, Duration::hours(1))
            .await
            .unwrap();

        assert_eq!(load_show(&pool, show.id).await.unwrap(), show);
        assert_eq!(load_timeslot(&pool, slot.id).await.unwrap(), slot);
    }

    #[tokio::test]
    async fn test_parent_chain() {
        let pool = setup_test_db().await;
        let now = Utc.with_ymd_and_hms(2013, 1, 1, 0, 0, 0).unwrap();
        let show = create_show(&pool, 1, now).await.unwrap();
        let season = create_season(&pool, show.id, 1, now).await.unwrap();
        let slot = create_timeslot(&pool, season.id, now, Duration::hours(1))
            .await
            .unwrap();

        let parent = slot.metadata_parent(&pool).await.unwrap().unwrap();
        assert_eq!(parent.metadata_set(), MetadataSet::new(&SEASON_METADATA, season.id));

        let grandparent = parent.metadata_parent(&pool).await.unwrap().unwrap();
        assert_eq!(grandparent.metadata_set(), MetadataSet::new(&SHOW_METADATA, show.id));

        assert!(grandparent.metadata_parent(&pool).await.unwrap().is_none());
    }
}
