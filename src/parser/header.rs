//! RFC 5322 header scanning for the mbox envelope: sender and date.
//!
//! Header bytes are decoded permissively and only used to *read* fields.
//! The message bytes written to the mbox are never taken from this text.

use chrono::{DateTime, NaiveDateTime};
use tracing::debug;

/// Sender used when no `From:` header yields an address.
pub const UNKNOWN_SENDER: &str = "MAILER-DAEMON";

/// Layout of the timestamp on an mbox `From ` line (`asctime` style).
pub const ENVELOPE_DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// Accepted `Date:` layouts, tried in order. The first one that parses wins.
const DATE_FORMATS: [&str; 4] = [
    "%a, %d %b %Y %H:%M:%S %z",
    "%d %b %Y %H:%M:%S %z",
    "%a, %d %b %Y %H:%M:%S",
    "%d %b %Y %H:%M:%S",
];

const WEEKDAYS: [(&str, &str); 7] = [
    ("Mon", "Monday"),
    ("Tue", "Tuesday"),
    ("Wed", "Wednesday"),
    ("Thu", "Thursday"),
    ("Fri", "Friday"),
    ("Sat", "Saturday"),
    ("Sun", "Sunday"),
];

/// Where an envelope timestamp came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateSource {
    /// Parsed from the message's `Date:` header.
    Header,
    /// No usable `Date:` header; the conversion time was used.
    Now,
}

/// Sender and timestamp for an mbox `From ` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub sender: String,
    /// Wall-clock time as written in the `Date:` header (its zone is not applied).
    pub timestamp: NaiveDateTime,
    pub date_source: DateSource,
}

impl Envelope {
    /// Derive the envelope from a raw header block.
    ///
    /// Never fails: a missing or unusable field is replaced by its fallback
    /// (`MAILER-DAEMON`, or `now`). Only the first `date_prefix_len`
    /// characters of the `Date:` value are considered.
    pub fn from_headers(raw_headers: &[u8], now: NaiveDateTime, date_prefix_len: usize) -> Self {
        let text = decode_header_bytes(raw_headers);
        let headers = unfold_headers(&text);

        let sender = get_header(&headers, "from")
            .and_then(sender_token)
            .unwrap_or_else(|| UNKNOWN_SENDER.to_string());

        let parsed = get_header(&headers, "date").and_then(|value| {
            let prefix: String = value.chars().take(date_prefix_len).collect();
            parse_date(&prefix)
        });

        let (timestamp, date_source) = match parsed {
            Some(dt) => (dt, DateSource::Header),
            None => (now, DateSource::Now),
        };

        Self {
            sender,
            timestamp,
            date_source,
        }
    }

    /// Timestamp in the fixed envelope layout, e.g. `Mon Jan 01 12:00:00 2024`.
    pub fn rendered_date(&self) -> String {
        self.timestamp.format(ENVELOPE_DATE_FORMAT).to_string()
    }
}

/// Decode raw header bytes to a string, replacing invalid UTF-8 sequences.
fn decode_header_bytes(bytes: &[u8]) -> String {
    // Strip BOM if present
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Unfold headers: join continuation lines (starting with space or tab) with the previous header.
///
/// Returns a list of `(lowercase_name, trimmed_value)` pairs.
fn unfold_headers(text: &str) -> Vec<(String, String)> {
    let mut result: Vec<(String, String)> = Vec::new();

    for line in text.lines() {
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some(last) = result.last_mut() {
                if !last.1.is_empty() {
                    last.1.push(' ');
                }
                last.1.push_str(line.trim());
            }
        } else if let Some(colon_pos) = line.find(':') {
            let name = line[..colon_pos].trim().to_lowercase();
            let value = line[colon_pos + 1..].trim().to_string();
            result.push((name, value));
        }
        // Lines without a colon and not a continuation are skipped
    }

    result
}

/// Get the first non-empty value for a header name (case-insensitive).
fn get_header<'a>(headers: &'a [(String, String)], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|(k, v)| k == name && !v.is_empty())
        .map(|(_, v)| v.as_str())
}

/// Pick the envelope sender out of a `From:` value.
///
/// `Jane Doe <jane@example.com>` → `jane@example.com`;
/// `jane@example.com (Jane)` → `jane@example.com`.
/// Returns `None` when the value has neither an `<address>` nor an `@`.
pub fn sender_token(from_value: &str) -> Option<String> {
    let value = from_value.trim();

    if let Some(addr) = first_angle_bracket(value) {
        return Some(addr.to_string());
    }

    if value.contains('@') {
        return value.split_whitespace().next().map(str::to_string);
    }

    None
}

/// Content of the first non-empty `<…>` pair.
fn first_angle_bracket(s: &str) -> Option<&str> {
    let mut remaining = s;
    while let Some(start) = remaining.find('<') {
        let after = &remaining[start + 1..];
        let end = after.find('>')?;
        if end > 0 {
            return Some(&after[..end]);
        }
        remaining = &after[end + 1..];
    }
    None
}

/// Parse a `Date:` value against the accepted layouts.
///
/// The weekday name, when present, is checked for spelling but not against
/// the calendar date. A numeric zone offset is accepted but not applied.
pub fn parse_date(date_str: &str) -> Option<NaiveDateTime> {
    let trimmed = date_str.trim();
    if trimmed.is_empty() {
        return None;
    }

    let parsed = DATE_FORMATS
        .iter()
        .find_map(|fmt| parse_with_format(trimmed, fmt));

    if parsed.is_none() {
        debug!(date = trimmed, "Could not parse date");
    }
    parsed
}

fn parse_with_format(input: &str, fmt: &str) -> Option<NaiveDateTime> {
    let (input, fmt) = match fmt.strip_prefix("%a, ") {
        Some(rest_fmt) => (strip_weekday(input)?, rest_fmt),
        None => (input, fmt),
    };

    // chrono's %Y also takes two- or three-digit years.
    if !has_four_digit_year(input) {
        return None;
    }

    if fmt.ends_with("%z") {
        DateTime::parse_from_str(input, fmt)
            .ok()
            .map(|dt| dt.naive_local())
    } else {
        NaiveDateTime::parse_from_str(input, fmt).ok()
    }
}

/// The third token of `dd Mon yyyy ...` must be exactly four digits.
fn has_four_digit_year(s: &str) -> bool {
    s.split_whitespace()
        .nth(2)
        .is_some_and(|year| year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()))
}

/// Strip a leading `"Mon, "` (or `"Monday, "`).
fn strip_weekday(s: &str) -> Option<&str> {
    let (day, rest) = s.split_once(',')?;
    let known = WEEKDAYS
        .iter()
        .any(|(short, long)| day.eq_ignore_ascii_case(short) || day.eq_ignore_ascii_case(long));
    known.then(|| rest.trim_start())
}
