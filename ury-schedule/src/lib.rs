//! ury-schedule library - read-only schedule service
//!
//! Serves the programme guide ("coming up"), show summaries, credits and
//! metadata lookups as JSON for the station website.

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use ury_common::config::ScheduleConfig;
use ury_common::schedule::{Filler, GapFiller, MetadataResolver};

pub mod api;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Metadata resolver configured from `[schedule]`
    pub resolver: MetadataResolver,
    /// Gap filling policy for listings
    pub filler: Arc<dyn Filler>,
    pub schedule: Arc<ScheduleConfig>,
}

impl AppState {
    /// Create application state with the default gap filler
    pub fn new(db: SqlitePool, schedule: ScheduleConfig) -> Self {
        let resolver = MetadataResolver::new(db.clone())
            .require_approval(schedule.require_approval)
            .max_depth(schedule.max_inheritance_depth);

        Self {
            db,
            resolver,
            filler: Arc::new(GapFiller),
            schedule: Arc::new(schedule),
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    use axum::routing::get;

    let api = Router::new()
        .route("/api/coming-up", get(api::coming_up))
        .route("/api/shows/:id", get(api::show_summary))
        .route("/api/shows/:id/credits", get(api::show_credits))
        .route("/api/shows/:id/metadata/:key", get(api::show_metadatum))
        .route("/api/seasons/:id/metadata/:key", get(api::season_metadatum))
        .route("/api/timeslots/:id/metadata/:key", get(api::timeslot_metadatum));

    Router::new()
        .merge(api)
        .merge(api::health_routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
