use time::format_description::FormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");
const OFFSET: &[FormatItem<'static>] =
    format_description!("[offset_hour sign:mandatory]:[offset_minute]");

pub fn parse_timestamp(raw: &str) -> Option<OffsetDateTime> {
    OffsetDateTime::parse(raw.trim(), &Rfc3339).ok()
}

pub fn format_timestamp(timestamp: OffsetDateTime) -> Option<String> {
    timestamp.format(&Rfc3339).ok()
}

/// Calendar date of `timestamp` as seen from `offset`, e.g. `2021-01-01`.
pub fn render_date(timestamp: OffsetDateTime, offset: UtcOffset) -> Option<String> {
    timestamp.to_offset(offset).date().format(ISO_DATE).ok()
}

/// Accepts `Z`, `UTC` or a signed `+HH:MM` offset.
pub fn parse_utc_offset(raw: &str) -> Option<UtcOffset> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("z") || raw.eq_ignore_ascii_case("utc") {
        return Some(UtcOffset::UTC);
    }
    UtcOffset::parse(raw, OFFSET).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{datetime, offset};

    #[test]
    fn parses_zulu_timestamps() {
        let ts = parse_timestamp("2021-01-01T00:00:00Z").unwrap();
        assert_eq!(ts, datetime!(2021-01-01 00:00:00 UTC));
    }

    #[test]
    fn rejects_non_rfc3339_timestamps() {
        assert!(parse_timestamp("2021-01-01").is_none());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn date_follows_the_requested_offset() {
        let ts = datetime!(2021-01-01 23:30:00 UTC);
        assert_eq!(render_date(ts, UtcOffset::UTC).as_deref(), Some("2021-01-01"));
        assert_eq!(render_date(ts, offset!(+01:00)).as_deref(), Some("2021-01-02"));
        assert_eq!(render_date(ts, offset!(-05:00)).as_deref(), Some("2021-01-01"));
    }

    #[test]
    fn parses_offsets() {
        assert_eq!(parse_utc_offset("Z"), Some(UtcOffset::UTC));
        assert_eq!(parse_utc_offset("+02:00"), Some(offset!(+02:00)));
        assert_eq!(parse_utc_offset("-03:30"), Some(offset!(-03:30)));
        assert_eq!(parse_utc_offset("Berlin"), None);
    }

    #[test]
    fn formats_rfc3339() {
        let ts = datetime!(2021-01-01 00:00:00 UTC);
        assert_eq!(format_timestamp(ts).as_deref(), Some("2021-01-01T00:00:00Z"));
    }
}
