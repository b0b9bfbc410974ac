//! ICS feed parsing.
//!
//! Subscription feeds arrive as calendar-interchange text. Only the
//! properties the canonical model carries are read: SUMMARY, DTSTART, DTEND,
//! LOCATION, DESCRIPTION and UID. Everything else is ignored.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use tracing::debug;

use crate::source::RawEvent;

/// Result of parsing one feed: the usable records plus a count of VEVENTs
/// that had to be skipped as malformed.
#[derive(Debug, Default)]
pub struct FeedParse {
    pub events: Vec<RawEvent>,
    pub skipped: usize,
}

/// Parse a whole ICS feed into raw records.
///
/// A malformed VEVENT is skipped and counted; it never aborts the feed.
pub fn parse_feed(content: &str) -> FeedParse {
    let mut parse = FeedParse::default();

    let mut in_vevent = false;
    let mut current_line = String::new();
    let mut current = RawEvent::default();

    for line in content.lines() {
        // Line folding (RFC 5545): continuation lines start with a single
        // space or tab; only the indicator character is removed.
        if line.starts_with(' ') || line.starts_with('\t') {
            current_line.push_str(&line[1..]);
            continue;
        }

        if !current_line.is_empty() && in_vevent {
            if let Some((key, params, value)) = parse_property_line(&current_line) {
                match key.as_str() {
                    "UID" => current.provider_uid = Some(value),
                    "SUMMARY" => current.summary = Some(value),
                    "DESCRIPTION" => current.description = Some(value),
                    "LOCATION" => current.location = Some(value),
                    "DTSTART" => current.start = parse_datetime(&value, &params),
                    "DTEND" => current.end = parse_datetime_end(&value, &params),
                    _ => {}
                }
            }
        }

        current_line = line.to_string();

        if line == "BEGIN:VEVENT" {
            in_vevent = true;
            current = RawEvent::default();
        } else if line == "END:VEVENT" {
            in_vevent = false;
            // A record we can neither time nor identify is unusable.
            if current.start.is_none() && current.provider_uid.is_none() {
                debug!(summary = ?current.summary, "skipping unidentifiable VEVENT");
                parse.skipped += 1;
            } else {
                parse.events.push(std::mem::take(&mut current));
            }
        }
    }

    parse
}

/// Split a property line into key, parameters and unescaped value.
fn parse_property_line(line: &str) -> Option<(String, String, String)> {
    let colon_pos = line.find(':')?;
    let key_part = &line[..colon_pos];
    let value = &line[colon_pos + 1..];

    let mut parts = key_part.splitn(2, ';');
    let key = parts.next()?.to_string();
    let params = parts.next().unwrap_or("").to_string();

    Some((key, params, unescape_value(value)))
}

/// Unescape ICS text values per RFC 5545.
/// Reverses: \, → , and \; → ; and \\ → \ and \n → newline
fn unescape_value(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.peek() {
                Some(',') => {
                    result.push(',');
                    chars.next();
                }
                Some(';') => {
                    result.push(';');
                    chars.next();
                }
                Some('\\') => {
                    result.push('\\');
                    chars.next();
                }
                Some('n') | Some('N') => {
                    result.push('\n');
                    chars.next();
                }
                _ => result.push(c),
            }
        } else {
            result.push(c);
        }
    }

    result
}

/// Parse a DTSTART-style value into an instant.
fn parse_datetime(value: &str, params: &str) -> Option<DateTime<Utc>> {
    if let Some(date) = parse_date_value(value, params) {
        return date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc());
    }
    parse_datetime_value(value)
}

/// Parse a DTEND value. Date-only DTEND is exclusive per RFC 5545, so the
/// instant lands at the end of the previous day.
fn parse_datetime_end(value: &str, params: &str) -> Option<DateTime<Utc>> {
    if let Some(date) = parse_date_value(value, params) {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc() - chrono::Duration::seconds(1));
    }
    parse_datetime_value(value)
}

/// Date form: YYYYMMDD, either flagged VALUE=DATE or bare 8 digits.
fn parse_date_value(value: &str, params: &str) -> Option<NaiveDate> {
    let is_date =
        params.contains("VALUE=DATE") || (value.len() == 8 && value.chars().all(|c| c.is_ascii_digit()));
    if !is_date {
        return None;
    }

    let y = value.get(0..4)?.parse().ok()?;
    let m = value.get(4..6)?.parse().ok()?;
    let d = value.get(6..8)?.parse().ok()?;
    NaiveDate::from_ymd_opt(y, m, d)
}

/// DateTime form: YYYYMMDDTHHMMSS with optional trailing Z.
fn parse_datetime_value(value: &str) -> Option<DateTime<Utc>> {
    if value.len() < 15 || !value.contains('T') {
        return None;
    }

    let y: i32 = value.get(0..4)?.parse().ok()?;
    let mo: u32 = value.get(4..6)?.parse().ok()?;
    let d: u32 = value.get(6..8)?.parse().ok()?;
    let h: u32 = value.get(9..11)?.parse().ok()?;
    let mi: u32 = value.get(11..13)?.parse().ok()?;
    let s: u32 = value.get(13..15)?.parse().ok()?;

    Utc.with_ymd_and_hms(y, mo, d, h, mi, s).single()
}
