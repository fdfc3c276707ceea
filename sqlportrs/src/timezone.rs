//! Localizing caller wall-clock boundaries into UTC instants.
//!
//! Stored timestamps are UTC. Query boundaries arrive as minute-precision
//! strings in the caller's zone and are converted here, before they reach
//! the query builder.

use chrono::offset::LocalResult;
use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::error::{Result, SqlportError};
use crate::query_builder::TimeRange;

/// Wall-clock format accepted for `start`/`end` boundaries.
pub const BOUNDARY_FORMAT: &str = "%Y-%m-%d %H:%M";

pub fn parse_timezone(name: &str) -> Result<Tz> {
    name.parse::<Tz>()
        .map_err(|_| SqlportError::InvalidTimezone(name.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeZoneContext {
    target: Tz,
}

impl TimeZoneContext {
    pub fn new(target: &str) -> Result<Self> {
        Ok(Self {
            target: parse_timezone(target)?,
        })
    }

    pub fn target(&self) -> Tz {
        self.target
    }

    pub fn target_name(&self) -> &'static str {
        self.target.name()
    }

    /// Parse a caller-local boundary and convert it to UTC.
    pub fn to_utc(&self, local: &str) -> Result<DateTime<Utc>> {
        let naive = NaiveDateTime::parse_from_str(local.trim(), BOUNDARY_FORMAT)
            .map_err(|e| SqlportError::InvalidTimestamp(format!("{local:?}: {e}")))?;
        Ok(localize(self.target, naive))
    }

    /// Localize optional `start`/`end` strings into a UTC range.
    pub fn range(&self, start: Option<&str>, end: Option<&str>) -> Result<TimeRange> {
        let start = start.map(|s| self.to_utc(s)).transpose()?;
        let end = end.map(|s| self.to_utc(s)).transpose()?;
        TimeRange::new(start, end)
    }
}

/// Ambiguous wall-clock times (clocks falling back) resolve to the later,
/// standard-time instant. Times skipped by a forward jump use the offset in
/// effect just before the jump.
fn localize(tz: Tz, naive: NaiveDateTime) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(_, latest) => latest.with_timezone(&Utc),
        LocalResult::None => {
            let offset = offset_before_gap(tz, naive);
            let shifted = naive - TimeDelta::seconds(i64::from(offset.local_minus_utc()));
            Utc.from_utc_datetime(&shifted)
        }
    }
}

/// Gaps are multiples of 15 minutes and never longer than a day.
const GAP_STEP_MINUTES: i64 = 15;
const GAP_MAX_STEPS: i64 = 24 * 60 / GAP_STEP_MINUTES;

fn offset_before_gap(tz: Tz, naive: NaiveDateTime) -> FixedOffset {
    (1..=GAP_MAX_STEPS)
        .find_map(|step| {
            tz.from_local_datetime(&(naive - TimeDelta::minutes(GAP_STEP_MINUTES * step)))
                .earliest()
        })
        .map(|dt| dt.offset().fix())
        .unwrap_or_else(|| tz.offset_from_utc_datetime(&naive).fix())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn converts_local_wall_clock_to_utc() {
        let ctx = TimeZoneContext::new("Asia/Shanghai").unwrap();
        assert_eq!(
            ctx.to_utc("2024-01-02 08:00").unwrap(),
            utc("2024-01-02T00:00:00Z")
        );
    }

    #[test]
    fn ambiguous_time_takes_standard_offset() {
        let ctx = TimeZoneContext::new("America/New_York").unwrap();
        // 01:30 happens twice on 2024-11-03; EST is UTC-5.
        assert_eq!(
            ctx.to_utc("2024-11-03 01:30").unwrap(),
            utc("2024-11-03T06:30:00Z")
        );
    }

    #[test]
    fn skipped_time_uses_offset_before_jump() {
        let ctx = TimeZoneContext::new("America/New_York").unwrap();
        // 02:30 does not exist on 2024-03-10; EST still applies.
        assert_eq!(
            ctx.to_utc("2024-03-10 02:30").unwrap(),
            utc("2024-03-10T07:30:00Z")
        );
    }

    #[test]
    fn skipped_time_east_of_utc() {
        let ctx = TimeZoneContext::new("Europe/Berlin").unwrap();
        // 02:30 does not exist on 2024-03-31; CET (UTC+1) still applies.
        assert_eq!(
            ctx.to_utc("2024-03-31 02:30").unwrap(),
            utc("2024-03-31T01:30:00Z")
        );
    }

    #[test]
    fn rejects_malformed_boundaries() {
        let ctx = TimeZoneContext::new("UTC").unwrap();
        assert!(matches!(
            ctx.to_utc("2024-01-01T00:00:00Z"),
            Err(SqlportError::InvalidTimestamp(_))
        ));
        assert!(matches!(
            TimeZoneContext::new("Mars/Olympus"),
            Err(SqlportError::InvalidTimezone(_))
        ));
    }

    #[test]
    fn range_rejects_inverted_bounds() {
        let ctx = TimeZoneContext::new("UTC").unwrap();
        assert!(matches!(
            ctx.range(Some("2024-01-02 00:00"), Some("2024-01-01 00:00")),
            Err(SqlportError::InvalidRange { .. })
        ));
        let open = ctx.range(None, Some("2024-01-01 00:00")).unwrap();
        assert!(open.start.is_none());
        assert_eq!(open.end, Some(utc("2024-01-01T00:00:00Z")));
    }
}
