//! Schedule domain: shows, seasons, timeslots, metadata, credits and listings

pub mod credit;
pub mod filler;
pub mod list;
pub mod metadata;
pub mod show;

pub use credit::{byline, current_credits, format_byline, ShowCredit, ShowCreditType};
pub use filler::{FillerSlot, Filler, GapFiller, ListedSlot};
pub use list::coming_up;
pub use metadata::{MetadataResolver, MetadataSet, MetadataSubject};
pub use show::{Season, Show, Timeslot};
