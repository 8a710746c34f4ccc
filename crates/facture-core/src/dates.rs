//! Excel serial date conversion
//!
//! Dates are stored in cells as serial numbers: whole days since a base
//! date, with the time of day in the fraction. The 1900 system counts
//! 1900-01-01 as serial 1 and includes the historical leap-year bug,
//! where the non-existent 1900-02-29 occupies serial 60. The 1904 system
//! counts days from 1904-01-01 with no bug.

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Convert a date to its Excel serial number.
pub fn date_to_serial(date: NaiveDate, date_1904: bool) -> f64 {
    if date_1904 {
        let base = NaiveDate::from_ymd_opt(1904, 1, 1).unwrap();
        (date - base).num_days() as f64
    } else {
        let base = NaiveDate::from_ymd_opt(1899, 12, 31).unwrap();
        let days = (date - base).num_days();
        // The phantom 1900-02-29 sits at serial 60, shifting later dates by one
        if days >= 60 {
            (days + 1) as f64
        } else {
            days as f64
        }
    }
}

/// Convert a date and time to a serial number with a day fraction.
pub fn datetime_to_serial(dt: NaiveDateTime, date_1904: bool) -> f64 {
    let day = date_to_serial(dt.date(), date_1904);
    let seconds = dt.time().num_seconds_from_midnight() as f64;
    day + seconds / SECONDS_PER_DAY
}

/// Convert a serial number back to a date.
///
/// Returns `None` for negative serials, out-of-range values, and the
/// phantom 1900-02-29 (serial 60 in the 1900 system).
pub fn serial_to_date(serial: f64, date_1904: bool) -> Option<NaiveDate> {
    if serial < 0.0 {
        return None;
    }
    let days = serial.trunc() as i64;

    if date_1904 {
        let base = NaiveDate::from_ymd_opt(1904, 1, 1)?;
        base.checked_add_signed(Duration::days(days))
    } else {
        if days == 60 {
            return None;
        }
        let base = NaiveDate::from_ymd_opt(1899, 12, 31)?;
        let adjusted = if days > 60 { days - 1 } else { days };
        base.checked_add_signed(Duration::days(adjusted))
    }
}

/// Convert a serial number back to a date and time.
pub fn serial_to_datetime(serial: f64, date_1904: bool) -> Option<NaiveDateTime> {
    let date = serial_to_date(serial, date_1904)?;
    let frac = serial.fract();
    let total_seconds = (frac * SECONDS_PER_DAY).round() as u32;
    let time = NaiveTime::from_num_seconds_from_midnight_opt(
        total_seconds.min(SECONDS_PER_DAY as u32 - 1),
        0,
    )?;
    Some(date.and_time(time))
}
