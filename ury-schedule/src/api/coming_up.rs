//! Programme guide ("coming up") endpoint

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ury_common::schedule::{list, ListedSlot};
use ury_common::time;

use super::ApiError;
use crate::AppState;

/// Query parameters for the listing
#[derive(Debug, Deserialize)]
pub struct ComingUpQuery {
    /// Reference time (default: now)
    pub at: Option<DateTime<Utc>>,

    /// Maximum entries (default: `[schedule] coming_up_quantity`)
    pub quantity: Option<i64>,

    /// Fill gaps with filler slots
    #[serde(default = "default_filler")]
    pub filler: bool,
}

fn default_filler() -> bool {
    true
}

/// One listed slot with its resolved title
#[derive(Debug, Serialize)]
pub struct ComingUpEntry {
    /// "booked" or "filler"
    pub kind: &'static str,
    pub timeslot_id: Option<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub title: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ComingUpResponse {
    pub at: DateTime<Utc>,
    pub quantity: i64,
    pub slots: Vec<ComingUpEntry>,
}

/// GET /api/coming-up
pub async fn coming_up(
    State(state): State<AppState>,
    query: Result<Query<ComingUpQuery>, QueryRejection>,
) -> Result<Json<ComingUpResponse>, ApiError> {
    let Query(query) = query?;
    let at = query.at.unwrap_or_else(time::now);
    let quantity = query.quantity.unwrap_or(state.schedule.coming_up_quantity);
    let filler = if query.filler {
        Some(state.filler.as_ref())
    } else {
        None
    };

    let listing = list::coming_up(&state.db, at, quantity, filler).await?;

    let mut slots = Vec::with_capacity(listing.len());
    for slot in listing {
        let entry = match &slot {
            ListedSlot::Booked(timeslot) => ComingUpEntry {
                kind: "booked",
                timeslot_id: Some(timeslot.id),
                start_time: slot.start_time(),
                end_time: slot.end_time(),
                title: state.resolver.title(timeslot, at).await?,
            },
            ListedSlot::Filler(_) => ComingUpEntry {
                kind: "filler",
                timeslot_id: None,
                start_time: slot.start_time(),
                end_time: slot.end_time(),
                title: Some(state.schedule.filler_title.clone()),
            },
        };
        slots.push(entry);
    }

    Ok(Json(ComingUpResponse {
        at,
        quantity,
        slots,
    }))
}
