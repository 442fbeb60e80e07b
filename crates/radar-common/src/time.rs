//! Time conversions for WSR-88D date fields.
//!
//! Both Level II and Level III carry dates as "modified Julian" day numbers
//! where day 1 is 1 January 1970.

use chrono::{DateTime, Duration, TimeZone, Utc};

/// Convert a WSR-88D day number and milliseconds past midnight to UTC.
///
/// Returns `None` for day 0 (unset) or out-of-range values.
pub fn from_julian_millis(julian_date: u32, millis_of_day: u32) -> Option<DateTime<Utc>> {
    if julian_date == 0 {
        return None;
    }
    let epoch = Utc.timestamp_opt(0, 0).single()?;
    epoch
        .checked_add_signed(Duration::days(julian_date as i64 - 1))?
        .checked_add_signed(Duration::milliseconds(millis_of_day as i64))
}

/// Convert a WSR-88D day number and seconds past midnight to UTC.
pub fn from_julian_seconds(julian_date: u32, seconds_of_day: u32) -> Option<DateTime<Utc>> {
    from_julian_millis(julian_date, seconds_of_day.checked_mul(1000)?)
}

/// Inverse of [`from_julian_millis`].
pub fn to_julian_millis(time: DateTime<Utc>) -> (u32, u32) {
    let millis = time.timestamp_millis();
    let day_ms = 86_400_000_i64;
    let days = millis.div_euclid(day_ms);
    let ms_of_day = millis.rem_euclid(day_ms);
    ((days + 1) as u32, ms_of_day as u32)
}
