//! Email `Date:` header normalisation.

use chrono::{DateTime, NaiveDateTime};

/// Header layouts without a usable zone, tried after RFC 2822.
const NAIVE_FORMATS: &[&str] = &[
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
    "%a, %d %b %Y %H:%M",
    "%d %b %Y %H:%M",
];

/// Parse an RFC 5322 date header into wall-clock fields.
///
/// The offset is dropped, not applied: `Tue, 03 Jun 2025 14:05:00 +0200`
/// becomes `2025-06-03 14:05:00`. Returns `None` when nothing parses.
pub fn parse_email_date(raw_header: &str) -> Option<NaiveDateTime> {
    let cleaned = strip_trailing_comment(raw_header.trim());
    if cleaned.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc2822(cleaned) {
        return Some(dt.naive_local());
    }

    let without_zone = strip_zone_token(cleaned);
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(without_zone, fmt).ok())
}

/// Drop a trailing `(UTC)`-style comment.
fn strip_trailing_comment(s: &str) -> &str {
    if s.ends_with(')') {
        if let Some(open) = s.rfind('(') {
            return s[..open].trim_end();
        }
    }
    s
}

/// Drop a trailing alphabetic zone name that chrono does not know, e.g. `SAST`.
fn strip_zone_token(s: &str) -> &str {
    match s.rsplit_once(' ') {
        Some((head, tail)) if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_alphabetic()) => {
            head.trim_end()
        }
        _ => s,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, s)
            .unwrap()
    }

    #[test]
    fn offset_is_discarded_not_converted() {
        assert_eq!(
            parse_email_date("Tue, 03 Jun 2025 14:05:00 +0200"),
            Some(at(2025, 6, 3, 14, 5, 0))
        );
        assert_eq!(
            parse_email_date("Tue, 03 Jun 2025 14:05:00 -0700"),
            Some(at(2025, 6, 3, 14, 5, 0))
        );
    }

    #[test]
    fn weekday_is_optional() {
        assert_eq!(
            parse_email_date("3 Jun 2025 08:00:00 +0000"),
            Some(at(2025, 6, 3, 8, 0, 0))
        );
    }

    #[test]
    fn trailing_comment_is_ignored() {
        assert_eq!(
            parse_email_date("Tue, 03 Jun 2025 14:05:00 +0000 (UTC)"),
            Some(at(2025, 6, 3, 14, 5, 0))
        );
    }

    #[test]
    fn obsolete_zone_names_parse() {
        assert_eq!(
            parse_email_date("Tue, 03 Jun 2025 14:05:00 GMT"),
            Some(at(2025, 6, 3, 14, 5, 0))
        );
    }

    #[test]
    fn unknown_zone_name_falls_back_to_wall_clock() {
        assert_eq!(
            parse_email_date("Tue, 03 Jun 2025 14:05:00 SAST"),
            Some(at(2025, 6, 3, 14, 5, 0))
        );
    }

    #[test]
    fn garbage_is_absent() {
        assert_eq!(parse_email_date(""), None);
        assert_eq!(parse_email_date("yesterday"), None);
        assert_eq!(parse_email_date("Tue, 45 Foo 2025 99:00:00 +0000"), None);
    }
}
