//! Non-timerange lists of timeslots ("coming up")

use crate::schedule::filler::{Filler, ListedSlot};
use crate::schedule::show::Timeslot;
use crate::time::{to_epoch_nanos, NANOS_PER_SECOND};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::debug;

/// Default listing length
pub const DEFAULT_QUANTITY: i64 = 10;

/// Retrieve the next `quantity` timeslots relative to `at`
///
/// The first listed timeslot is the one active at `at` (if any). When there
/// are not enough timeslots the list is shorter; that is not an error.
///
/// With `filler` set, gaps between `at` and the start of the last real slot
/// are covered by filler slots, which count towards `quantity`.
///
/// A non-positive `quantity` fails with [`Error::InvalidArgument`] before
/// any query runs.
pub async fn coming_up(
    pool: &SqlitePool,
    at: DateTime<Utc>,
    quantity: i64,
    filler: Option<&dyn Filler>,
) -> Result<Vec<ListedSlot>> {
    if quantity <= 0 {
        return Err(Error::InvalidArgument(format!(
            "'quantity' must be positive (got {})",
            quantity
        )));
    }

    let unfilled = upcoming_timeslots(pool, at, quantity).await?;

    let Some(filler) = filler else {
        return Ok(unfilled.into_iter().map(ListedSlot::Booked).collect());
    };

    let end = unfilled.last().map_or(at, |slot| slot.start_time);
    let mut filled = filler.fill(unfilled, at, end);

    // Filling may have added slots, so trim again
    filled.truncate(quantity as usize);

    debug!(
        "Coming up from {}: {} entries ({} filler)",
        at,
        filled.len(),
        filled.iter().filter(|s| s.is_filler()).count()
    );

    Ok(filled)
}

/// Timeslots still running at `at` or starting after it, by start time
///
/// A slot ending exactly at `at` is still included.
pub async fn upcoming_timeslots(
    pool: &SqlitePool,
    at: DateTime<Utc>,
    limit: i64,
) -> Result<Vec<Timeslot>> {
    let rows = sqlx::query(
        r#"
        SELECT show_season_timeslot_id, show_season_id, start_time, duration
        FROM show_season_timeslot
        WHERE start_time + duration * ? >= ?
        ORDER BY start_time ASC, show_season_timeslot_id ASC
        LIMIT ?
        "#,
    )
    .bind(NANOS_PER_SECOND)
    .bind(to_epoch_nanos(at)?)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows.iter().map(Timeslot::from_row).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init::init_schema;
    use crate::schedule::filler::GapFiller;
    use crate::schedule::show::{create_season, create_show, create_timeslot};
    use chrono::{Duration, TimeZone};
    use sqlx::sqlite::SqlitePoolOptions;

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2013, 2, 4, hour, minute, 0).unwrap()
    }

    async fn setup_test_db() -> (SqlitePool, i64) {
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

        let show = create_show(&pool, 1, at(0, 0)).await.unwrap();
        let season = create_season(&pool, show.id, 1, at(0, 0)).await.unwrap();
        (pool, season.id)
    }

    #[tokio::test]
    async fn test_rejects_non_positive_quantity() {
        let (pool, _) = setup_test_db().await;
        for quantity in [0, -5] {
            let result = coming_up(&pool, at(9, 0), quantity, Some(&GapFiller)).await;
            assert!(matches!(result, Err(Error::InvalidArgument(_))));
        }
    }

    #[tokio::test]
    async fn test_finished_slots_excluded_running_slot_included() {
        let (pool, season) = setup_test_db().await;
        create_timeslot(&pool, season, at(7, 0), Duration::hours(1)).await.unwrap();
        let running = create_timeslot(&pool, season, at(8, 30), Duration::hours(1)).await.unwrap();

        let slots = upcoming_timeslots(&pool, at(9, 0), 10).await.unwrap();
        assert_eq!(slots, vec![running]);
    }

    #[tokio::test]
    async fn test_slot_ending_exactly_at_reference_included() {
        let (pool, season) = setup_test_db().await;
        let ending = create_timeslot(&pool, season, at(8, 0), Duration::hours(1)).await.unwrap();

        let slots = upcoming_timeslots(&pool, at(9, 0), 10).await.unwrap();
        assert_eq!(slots, vec![ending]);
    }

    #[tokio::test]
    async fn test_subsecond_boundaries_compare_exactly() {
        let (pool, season) = setup_test_db().await;
        let start = at(8, 0) + Duration::milliseconds(900);
        let slot = create_timeslot(&pool, season, start, Duration::hours(1)).await.unwrap();

        // Ends at 09:00:00.900
        let listed = upcoming_timeslots(&pool, at(9, 0) + Duration::milliseconds(900), 10)
            .await
            .unwrap();
        assert_eq!(listed, vec![slot]);

        let after = upcoming_timeslots(&pool, at(9, 0) + Duration::milliseconds(901), 10)
            .await
            .unwrap();
        assert!(after.is_empty());
    }

    #[tokio::test]
    async fn test_without_filler_lists_bookings_only() {
        let (pool, season) = setup_test_db().await;
        create_timeslot(&pool, season, at(10, 0), Duration::minutes(30)).await.unwrap();
        create_timeslot(&pool, season, at(11, 30), Duration::minutes(30)).await.unwrap();

        let listing = coming_up(&pool, at(9, 0), 5, None).await.unwrap();
        assert_eq!(listing.len(), 2);
        assert!(listing.iter().all(|s| !s.is_filler()));
    }

    #[tokio::test]
    async fn test_refill_trimmed_to_quantity() {
        let (pool, season) = setup_test_db().await;
        create_timeslot(&pool, season, at(10, 0), Duration::minutes(30)).await.unwrap();
        create_timeslot(&pool, season, at(11, 30), Duration::minutes(30)).await.unwrap();

        let listing = coming_up(&pool, at(9, 0), 2, Some(&GapFiller)).await.unwrap();
        assert_eq!(listing.len(), 2);
        assert!(listing[0].is_filler());
        assert_eq!(listing[1].start_time(), at(10, 0));
    }

    #[tokio::test]
    async fn test_empty_schedule_gives_empty_listing() {
        let (pool, _) = setup_test_db().await;
        let listing = coming_up(&pool, at(9, 0), DEFAULT_QUANTITY, Some(&GapFiller))
            .await
            .unwrap();
        assert!(listing.is_empty());
    }
}
