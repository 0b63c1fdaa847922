//! # URY Common Library
//!
//! Shared code for the URY schedule website backend including:
//! - Database bootstrap and row models (members, shows, seasons, timeslots)
//! - Text metadata with effective-from versioning and inheritance
//! - Show credits and bylines
//! - "Coming up" listings with filler timeslots
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod schedule;
pub mod time;

pub use error::{Error, Result};
