//! Month-start calendar arithmetic.
//!
//! All strategies assume monthly data. Future timestamps are the first days
//! of the months that follow the last observed timestamp.

use crate::error::{ForecastError, Result};
use chrono::{DateTime, Datelike, Months, NaiveDate, TimeZone, Utc};

/// First instant of the month containing `ts`.
pub fn month_start(ts: DateTime<Utc>) -> DateTime<Utc> {
    let date = NaiveDate::from_ymd_opt(ts.year(), ts.month(), 1).unwrap_or(ts.date_naive());
    Utc.from_utc_datetime(&date.and_time(chrono::NaiveTime::MIN))
}

/// Add `months` whole months to the month start of `ts`.
pub fn add_months(ts: DateTime<Utc>, months: u32) -> Result<DateTime<Utc>> {
    month_start(ts)
        .checked_add_months(Months::new(months))
        .ok_or_else(|| {
            ForecastError::TimestampError(format!("{ts} + {months} months is out of range"))
        })
}

/// `count` consecutive month starts, beginning with the month after `last`.
pub fn month_starts_after(last: DateTime<Utc>, count: usize) -> Result<Vec<DateTime<Utc>>> {
    (1..=count)
        .map(|k| {
            let k = u32::try_from(k).map_err(|_| {
                ForecastError::InvalidParameter(format!("horizon {count} is too large"))
            })?;
            add_months(last, k)
        })
        .collect()
}

/// Whether `b` is exactly one month start after `a`'s month.
pub fn is_next_month(a: DateTime<Utc>, b: DateTime<Utc>) -> bool {
    add_months(a, 1).map(|next| next == b).unwrap_or(false)
}

/// Position of `ts` in years since the Unix epoch.
///
/// Used as the phase variable for yearly Fourier terms.
pub fn years_since_epoch(ts: DateTime<Utc>) -> f64 {
    ts.timestamp() as f64 / (365.25 * 86_400.0)
}
