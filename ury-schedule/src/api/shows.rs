//! Show summaries, credits and metadata lookups

use axum::{
    extract::{
        rejection::{PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ury_common::schedule::metadata::{MetadataSubject, TAG_KEY};
use ury_common::schedule::show::{load_season, load_show, load_timeslot};
use ury_common::schedule::{credit, ShowCredit};
use ury_common::time;

use super::ApiError;
use crate::AppState;

/// Reference time query (default: now)
#[derive(Debug, Deserialize)]
pub struct AsOfQuery {
    pub at: Option<DateTime<Utc>>,
}

/// Metadata lookup query
#[derive(Debug, Deserialize)]
pub struct MetadatumQuery {
    pub at: Option<DateTime<Utc>>,

    /// Fall back to parent subjects (default: true)
    #[serde(default = "default_inherit")]
    pub inherit: bool,
}

fn default_inherit() -> bool {
    true
}

#[derive(Debug, Serialize)]
pub struct ShowSummary {
    pub id: i64,
    pub as_of: DateTime<Utc>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub byline: Option<String>,
    pub credits: Vec<ShowCredit>,
}

#[derive(Debug, Serialize)]
pub struct MetadatumResponse {
    pub subject: &'static str,
    pub id: i64,
    pub key: String,
    pub as_of: DateTime<Utc>,
    pub inherit: bool,
    /// Absent when nothing in the chain has a current value
    pub value: Option<String>,
}

/// GET /api/shows/:id
pub async fn show_summary(
    State(state): State<AppState>,
    show_id: Result<Path<i64>, PathRejection>,
    query: Result<Query<AsOfQuery>, QueryRejection>,
) -> Result<Json<ShowSummary>, ApiError> {
    let (Path(show_id), Query(query)) = (show_id?, query?);
    let as_of = query.at.unwrap_or_else(time::now);
    let show = load_show(&state.db, show_id).await?;

    let title = state.resolver.title(&show, as_of).await?;
    let description = state.resolver.description(&show, as_of).await?;
    let tags = state
        .resolver
        .current_metadata(&show, TAG_KEY, as_of, true)
        .await?;
    let credits = credit::current_credits(&state.db, show.id, as_of).await?;
    let byline = credit::byline(&state.db, show.id, as_of).await?;

    Ok(Json(ShowSummary {
        id: show.id,
        as_of,
        title,
        description,
        tags,
        byline: credit::format_byline(&byline),
        credits,
    }))
}

/// GET /api/shows/:id/credits
pub async fn show_credits(
    State(state): State<AppState>,
    show_id: Result<Path<i64>, PathRejection>,
    query: Result<Query<AsOfQuery>, QueryRejection>,
) -> Result<Json<Vec<ShowCredit>>, ApiError> {
    let (Path(show_id), Query(query)) = (show_id?, query?);
    let as_of = query.at.unwrap_or_else(time::now);
    let show = load_show(&state.db, show_id).await?;
    let credits = credit::current_credits(&state.db, show.id, as_of).await?;
    Ok(Json(credits))
}

/// GET /api/shows/:id/metadata/:key
pub async fn show_metadatum(
    State(state): State<AppState>,
    path: Result<Path<(i64, String)>, PathRejection>,
    query: Result<Query<MetadatumQuery>, QueryRejection>,
) -> Result<Json<MetadatumResponse>, ApiError> {
    let (Path((id, key)), Query(query)) = (path?, query?);
    let show = load_show(&state.db, id).await?;
    metadatum_response(&state, "show", &show, id, key, query).await
}

/// GET /api/seasons/:id/metadata/:key
pub async fn season_metadatum(
    State(state): State<AppState>,
    path: Result<Path<(i64, String)>, PathRejection>,
    query: Result<Query<MetadatumQuery>, QueryRejection>,
) -> Result<Json<MetadatumResponse>, ApiError> {
    let (Path((id, key)), Query(query)) = (path?, query?);
    let season = load_season(&state.db, id).await?;
    metadatum_response(&state, "season", &season, id, key, query).await
}

/// GET /api/timeslots/:id/metadata/:key
pub async fn timeslot_metadatum(
    State(state): State<AppState>,
    path: Result<Path<(i64, String)>, PathRejection>,
    query: Result<Query<MetadatumQuery>, QueryRejection>,
) -> Result<Json<MetadatumResponse>, ApiError> {
    let (Path((id, key)), Query(query)) = (path?, query?);
    let timeslot = load_timeslot(&state.db, id).await?;
    metadatum_response(&state, "timeslot", &timeslot, id, key, query).await
}

async fn metadatum_response(
    state: &AppState,
    subject_name: &'static str,
    subject: &dyn MetadataSubject,
    id: i64,
    key: String,
    query: MetadatumQuery,
) -> Result<Json<MetadatumResponse>, ApiError> {
    let as_of = query.at.unwrap_or_else(time::now);
    let value = state
        .resolver
        .current_metadatum(subject, &key, as_of, query.inherit)
        .await?;

    Ok(Json(MetadatumResponse {
        subject: subject_name,
        id,
        key,
        as_of,
        inherit: query.inherit,
        value,
    }))
}
