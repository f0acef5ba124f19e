use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveTime, TimeZone, Timelike, Weekday};
use chrono_tz::Asia::Shanghai;
use chrono_tz::Tz;
use core_types::SessionTag;

use crate::time_source::TimeSource;

const MORNING_OPEN: (u32, u32, u32) = (9, 13, 30);
const MORNING_CLOSE: (u32, u32, u32) = (11, 30, 10);
const AFTERNOON_OPEN: (u32, u32, u32) = (12, 57, 30);
const AFTERNOON_CLOSE: (u32, u32, u32) = (15, 0, 10);
const AFTER_CLOSE_START: (u32, u32, u32) = (15, 0, 11);
const CLOSE_TO_END_START: (u32, u32, u32) = (14, 55, 0);

fn hms(t: (u32, u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(t.0, t.1, t.2).expect("constant time is valid")
}

/// Market clock: answers trading-session questions in the
/// exchange's local timezone (UTC+8), against an injectable
/// [`TimeSource`] so tests never touch the real clock.
///
/// All boundary comparisons here are on `NaiveTime`, which orders
/// identically to "HH:MM:SS" string ordering;
/// both bounds are inclusive as stated.
pub struct MarketClock {
    time_source: Arc<dyn TimeSource>,
}

impl MarketClock {
    pub fn new(time_source: Arc<dyn TimeSource>) -> Self {
        Self { time_source }
    }

    /// Wall clock, converted into the exchange's local timezone.
    pub fn now(&self) -> DateTime<Tz> {
        self.time_source.now().with_timezone(&Shanghai)
    }

    pub fn is_trading_day(&self, t: DateTime<Tz>) -> bool {
        !matches!(t.weekday(), Weekday::Sat | Weekday::Sun)
    }

    pub fn is_trading_time(&self) -> bool {
        let now = self.now();
        if !self.is_trading_day(now) {
            return false;
        }
        let time = now.time();
        (time >= hms(MORNING_OPEN) && time <= hms(MORNING_CLOSE))
            || (time >= hms(AFTERNOON_OPEN) && time <= hms(AFTERNOON_CLOSE))
    }

    pub fn is_after_close(&self) -> bool {
        let now = self.now();
        self.is_trading_day(now) && now.time() >= hms(AFTER_CLOSE_START)
    }

    pub fn is_close_to_end(&self) -> bool {
        let time = self.now().time();
        time >= hms(CLOSE_TO_END_START) && time <= hms(AFTERNOON_CLOSE)
    }

    /// Next weekday at 09:13:30, skipping Saturday/Sunday.
    pub fn next_trading_day_start(&self) -> DateTime<Tz> {
        let mut day = self.now().date_naive().succ_opt().expect("date overflow");
        while matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            day = day.succ_opt().expect("date overflow");
        }
        Shanghai
            .from_local_datetime(&day.and_time(hms(MORNING_OPEN)))
            .single()
            .expect("local time is unambiguous")
    }

    /// Today at 15:00:10, in the exchange's local timezone.
    pub fn trading_end_time(&self) -> DateTime<Tz> {
        let today = self.now().date_naive();
        Shanghai
            .from_local_datetime(&today.and_time(hms(AFTERNOON_CLOSE)))
            .single()
            .expect("local time is unambiguous")
    }

    /// The `trading_end - 30s` ceiling the retry schedule
    /// checks a retry candidate against.
    pub fn retry_deadline(&self) -> DateTime<Tz> {
        self.trading_end_time() - Duration::seconds(30)
    }

    /// Coarse session label from local hour: `[9,12)` ->
    /// morning, `[13,15)` -> afternoon, otherwise closed.
    pub fn session_tag(&self) -> SessionTag {
        session_tag_for_hour(self.now().hour())
    }
}

pub fn session_tag_for_hour(hour: u32) -> SessionTag {
    if (9..12).contains(&hour) {
        SessionTag::Morning
    } else if (13..15).contains(&hour) {
        SessionTag::Afternoon
    } else {
        SessionTag::Closed
    }
}
