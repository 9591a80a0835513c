use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeDelta, TimeZone};

use crate::error::{ExportError, ExportResult};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

// How far past midnight to look for the first instant after a DST gap.
const MAX_GAP_MINUTES: i64 = 24 * 60;

/// A closed interval of local time covering one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRange {
    pub day: NaiveDate,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}

impl DayRange {
    pub fn for_day(day: NaiveDate) -> Self {
        let (start, end) = day_bounds_in(&Local, day);
        Self { day, start, end }
    }

    /// Inclusive on both ends.
    pub fn contains(&self, instant: DateTime<Local>) -> bool {
        instant >= self.start && instant <= self.end
    }

    pub fn day_string(&self) -> String {
        self.day.format(DATE_FORMAT).to_string()
    }
}

/// Resolves the target day, defaulting to the current local date.
pub fn resolve_day(input: Option<&str>) -> ExportResult<DayRange> {
    resolve_day_on(input, Local::now().date_naive())
}

/// Same as [`resolve_day`] with "today" supplied by the caller.
pub fn resolve_day_on(input: Option<&str>, today: NaiveDate) -> ExportResult<DayRange> {
    let day = match input {
        None | Some("") => today,
        Some(raw) => parse_day(raw)?,
    };
    Ok(DayRange::for_day(day))
}

fn parse_day(raw: &str) -> ExportResult<NaiveDate> {
    if !has_date_shape(raw) {
        return Err(ExportError::InvalidDateFormat(raw.to_string()));
    }
    let day = NaiveDate::parse_from_str(raw, DATE_FORMAT)
        .map_err(|_| ExportError::InvalidDateFormat(raw.to_string()))?;
    Ok(day)
}

/// Exactly `DDDD-DD-DD` in ASCII digits. chrono alone accepts unpadded
/// fields and signed years.
fn has_date_shape(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    bytes.len() == 10
        && bytes.iter().enumerate().all(|(idx, b)| match idx {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Midnight of `day` and the last nanosecond before the next midnight.
fn day_bounds_in<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> (DateTime<Tz>, DateTime<Tz>) {
    let start = midnight_in(tz, day);
    let end = match day.succ_opt() {
        Some(next) => midnight_in(tz, next) - TimeDelta::nanoseconds(1),
        // NaiveDate::MAX has no successor; its range ends where it starts.
        None => start
            .clone()
            .checked_add_signed(TimeDelta::days(1) - TimeDelta::nanoseconds(1))
            .unwrap_or_else(|| start.clone()),
    };
    (start, end)
}

/// First instant of `day` in `tz`. A midnight skipped by a DST gap resolves to
/// the first valid instant after it; an ambiguous midnight to the earlier one.
fn midnight_in<Tz: TimeZone>(tz: &Tz, day: NaiveDate) -> DateTime<Tz> {
    let naive = day.and_time(NaiveTime::MIN);
    (0..=MAX_GAP_MINUTES)
        .find_map(|minutes| {
            naive
                .checked_add_signed(TimeDelta::minutes(minutes))
                .and_then(|candidate| tz.from_local_datetime(&candidate).earliest())
        })
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}
