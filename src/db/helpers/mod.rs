use std::convert::TryFrom;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use uuid::Uuid;

pub fn to_i64(value: usize) -> Result<i64> {
    i64::try_from(value).map_err(|_| anyhow!("value {value} exceeds SQLite INTEGER range"))
}

/// Fixed-width UTC form so text ordering in SQLite matches time ordering.
pub fn format_timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn parse_datetime(value: &str, field: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("failed to parse {field}"))
}

pub fn parse_uuid(value: &str, field: &str) -> Result<Uuid> {
    Uuid::parse_str(value).with_context(|| format!("failed to parse {field}"))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn timestamps_sort_as_text() {
        let a = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let b = a + chrono::Duration::milliseconds(450);
        let c = a + chrono::Duration::milliseconds(500);
        let (fa, fb, fc) = (format_timestamp(&a), format_timestamp(&b), format_timestamp(&c));
        assert!(fa < fb && fb < fc);
        assert_eq!(fa, "2024-05-01T12:00:00.000000Z");
        assert_eq!(parse_datetime(&fb, "timestamp").unwrap(), b);
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse_datetime("yesterday", "timestamp").is_err());
        assert!(parse_uuid("not-a-uuid", "id").is_err());
    }
}
