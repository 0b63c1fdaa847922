//! HTTP API handlers for ury-schedule

pub mod coming_up;
pub mod error;
pub mod health;
pub mod shows;

pub use coming_up::coming_up;
pub use error::ApiError;
pub use health::health_routes;
pub use shows::{season_metadatum, show_credits, show_metadatum, show_summary, timeslot_metadatum};
