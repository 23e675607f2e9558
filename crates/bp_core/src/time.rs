//! Posting-day arithmetic in a fixed local offset.

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveTime, Offset, Utc, Weekday};

/// Offset used when none is configured (UTC+9).
pub fn default_offset() -> FixedOffset {
    FixedOffset::east_opt(9 * 3600).unwrap_or_else(|| Utc.fix())
}

/// Start and end (exclusive) of the local calendar day containing `now`, in UTC.
pub fn local_day_bounds(now: DateTime<Utc>, offset: FixedOffset) -> (DateTime<Utc>, DateTime<Utc>) {
    let local = now.with_timezone(&offset);
    let start = local
        .date_naive()
        .and_time(NaiveTime::MIN)
        .and_local_timezone(offset)
        .single()
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or(now);
    (start, start + Duration::days(1))
}

/// Today's posting cutoff (`hour`:00 local) expressed in UTC.
pub fn posting_cutoff(now: DateTime<Utc>, offset: FixedOffset, hour: u32) -> DateTime<Utc> {
    let (start, _) = local_day_bounds(now, offset);
    start + Duration::hours(hour as i64)
}

pub fn is_weekend(now: DateTime<Utc>, offset: FixedOffset) -> bool {
    matches!(now.with_timezone(&offset).weekday(), Weekday::Sat | Weekday::Sun)
}
