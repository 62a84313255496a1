use chrono::{Duration, NaiveDate, NaiveDateTime};
use strum_macros::Display;

/// Canonical result of one time-sync request, as parsed from the ground
/// client's local-time string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSyncResult {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub zone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum TimeSyncError {
    #[strum(to_string = "time string malformed: {0}")]
    Malformed(&'static str),
}

impl std::error::Error for TimeSyncError {}

/// Fixed positional layout of the client string, e.g.
/// `01/05/2024 22:00:38 GMT-0500 (Eastern Standard Time)`.
/// Month and day must carry leading zeros; this is substring extraction at
/// fixed offsets, not general date parsing.
const MONTH: (usize, usize) = (0, 2);
const DAY: (usize, usize) = (3, 5);
const YEAR: (usize, usize) = (6, 10);
const HOUR: (usize, usize) = (11, 13);
const MINUTE: (usize, usize) = (14, 16);
const SECOND: (usize, usize) = (17, 19);
const ZONE_START: usize = 20;
const ZONE_LEN: usize = 8;

fn field(raw: &str, range: (usize, usize)) -> Result<u32, TimeSyncError> {
    raw.get(range.0..range.1)
        .ok_or(TimeSyncError::Malformed("too short"))?
        .parse()
        .map_err(|_| TimeSyncError::Malformed("non-numeric field"))
}

/// Parses the client time string. Unlike the first firmware revision,
/// which set the RTC from whatever garbage the substrings produced and
/// reported success anyway, an unparseable or impossible date is rejected
/// here and the clock stays untouched.
pub fn parse_client_time(raw: &str) -> Result<TimeSyncResult, TimeSyncError> {
    let result = TimeSyncResult {
        year: field(raw, YEAR)? as i32,
        month: field(raw, MONTH)?,
        day: field(raw, DAY)?,
        hour: field(raw, HOUR)?,
        minute: field(raw, MINUTE)?,
        second: field(raw, SECOND)?,
        zone: raw
            .get(ZONE_START..)
            .map(|z| z.chars().take(ZONE_LEN).collect::<String>())
            .unwrap_or_default(),
    };
    // Range validation through the calendar, catches 13/32 style input.
    to_naive(&result)?;
    Ok(result)
}

fn to_naive(result: &TimeSyncResult) -> Result<NaiveDateTime, TimeSyncError> {
    NaiveDate::from_ymd_opt(result.year, result.month, result.day)
        .and_then(|d| d.and_hms_opt(result.hour, result.minute, result.second))
        .ok_or(TimeSyncError::Malformed("impossible date or time"))
}

/// Settable wall clock anchored to the tick timeline. Set exactly once per
/// sync request; between syncs the reading advances with tick time.
#[derive(Debug, Default)]
pub struct DeviceClock {
    anchor: Option<(u64, NaiveDateTime)>,
}

impl DeviceClock {
    pub fn is_set(&self) -> bool { self.anchor.is_some() }

    pub fn set(&mut self, now_ms: u64, result: &TimeSyncResult) -> Result<(), TimeSyncError> {
        let wall = to_naive(result)?;
        self.anchor = Some((now_ms, wall));
        Ok(())
    }

    pub fn now(&self, now_ms: u64) -> Option<NaiveDateTime> {
        let (anchor_ms, wall) = self.anchor?;
        Some(wall + Duration::milliseconds(now_ms.saturating_sub(anchor_ms) as i64))
    }

    /// `HH:MM:SS.mmm`, or a placeholder before the first sync.
    pub fn time_string(&self, now_ms: u64) -> String {
        match self.now(now_ms) {
            Some(wall) => wall.format("%H:%M:%S%.3f").to_string(),
            None => String::from("--:--:--.---"),
        }
    }

    /// `MM/DD/YYYY`, or a placeholder before the first sync.
    pub fn date_string(&self, now_ms: u64) -> String {
        match self.now(now_ms) {
            Some(wall) => wall.format("%m/%d/%Y").to_string(),
            None => String::from("--/--/----"),
        }
    }
}
