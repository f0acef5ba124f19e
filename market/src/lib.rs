//! Market clock: trading-session awareness for mainland
//! China equities, against an injectable [`TimeSource`].

pub mod clock;
pub mod time_source;

pub use clock::{MarketClock, session_tag_for_hour};
pub use time_source::{FixedTimeSource, SystemTimeSource, TimeSource};
