//! Filler timeslots
//!
//! A programme guide should not show holes. When nothing is booked between
//! two timeslots, a filler slot stands in for whatever plays out of hours
//! (the jukebox). Fillers are never stored; they are synthesized per listing.

use crate::schedule::show::Timeslot;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// A synthesized placeholder covering a gap in the schedule
///
/// Gaps begin at arbitrary reference times, so both ends are kept exactly.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FillerSlot {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl FillerSlot {
    /// Filler covering `[start, end)`
    pub fn spanning(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start_time: start,
            end_time: end,
        }
    }
}

/// One entry of a listing: a real booking or a filler
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListedSlot {
    Booked(Timeslot),
    Filler(FillerSlot),
}

impl ListedSlot {
    pub fn start_time(&self) -> DateTime<Utc> {
        match self {
            ListedSlot::Booked(slot) => slot.start_time,
            ListedSlot::Filler(slot) => slot.start_time,
        }
    }

    pub fn duration(&self) -> Duration {
        match self {
            ListedSlot::Booked(slot) => slot.duration(),
            ListedSlot::Filler(slot) => slot.end_time - slot.start_time,
        }
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        match self {
            ListedSlot::Booked(slot) => slot.end_time(),
            ListedSlot::Filler(slot) => slot.end_time,
        }
    }

    pub fn is_filler(&self) -> bool {
        matches!(self, ListedSlot::Filler(_))
    }
}

/// Policy for covering gaps in a run of timeslots
pub trait Filler: Send + Sync {
    /// Interleave filler slots with `slots` so that `[start, end)` and the
    /// stretches between slots have no gaps.
    ///
    /// `slots` arrive ordered by start time; implementations must keep them
    /// in that order and must not drop any.
    fn fill(&self, slots: Vec<Timeslot>, start: DateTime<Utc>, end: DateTime<Utc>)
        -> Vec<ListedSlot>;
}

/// Covers each gap with exactly one filler slot spanning it
#[derive(Debug, Clone, Copy, Default)]
pub struct GapFiller;

impl Filler for GapFiller {
    fn fill(
        &self,
        slots: Vec<Timeslot>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Vec<ListedSlot> {
        let mut filled = Vec::with_capacity(slots.len() * 2 + 1);
        let mut cursor = start;

        for slot in slots {
            if slot.start_time > cursor {
                filled.push(ListedSlot::Filler(FillerSlot::spanning(cursor, slot.start_time)));
            }
            // Overlapping bookings must not pull the cursor backwards
            cursor = cursor.max(slot.end_time());
            filled.push(ListedSlot::Booked(slot));
        }

        if end > cursor {
            filled.push(ListedSlot::Filler(FillerSlot::spanning(cursor, end)));
        }

        filled
    }
}
