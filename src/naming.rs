//! Filename analysis: capture dates and tags from entry names.
//!
//! Photo names carry two kinds of information that prepo understands:
//!
//! - **Capture date**: a leading ISO date, as written by most phone cameras
//!   and import tools (`2021-05-04 12.30.00.jpg`). An optional `HH.MM.SS`
//!   time token after the date is recognised and discarded.
//! - **Tags**: free text between a pair of underscores (`_vacation_`,
//!   `_baby nipples_`). Tags are lowercased.
//!
//! ## Serial-number prefixes
//!
//! Camera and scanner names like `100_1213.JPG`, `20190101_120000.jpg` or
//! `IMAG0042.jpg` hold no semantic information. A leading run of digits
//! (optionally joined by single underscores) and a leading `IMAG<digits>`
//! token are stripped before looking for a date or tags:
//!
//! ```text
//! 100_1213 _baby nipples_.JPG   → tags ["baby nipples"], no date
//! IMAG0042_beach_.jpg           → tags ["beach"], no date
//! 2021-05-04 12.30.00_trip_.jpg → tags ["trip"], date 2021-05-04
//! ```
//!
//! A name that already begins with an ISO date is left alone, otherwise the
//! year would be mistaken for a serial number.
//!
//! ## Directories
//!
//! Directory names only contribute tags ([`parse_dir_name`]); everything
//! beneath a directory inherits them during the scan.

use chrono::NaiveDate;
use std::collections::BTreeSet;

/// Result of analysing a file name.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    /// Capture date from a leading `YYYY-MM-DD`, if present and valid.
    pub date: Option<NaiveDate>,
    /// Lowercased tags in order of appearance.
    pub tags: Vec<String>,
}

/// Analyse a file name (no directory part).
///
/// - `"2021-05-04 12.30.00_vacation_.jpg"` → date=2021-05-04, tags=["vacation"]
/// - `"100_1213 _baby nipples_.JPG"` → date=None, tags=["baby nipples"]
/// - `"IMAG0042.jpg"` → date=None, tags=[]
/// - `"2021-13-45_x_.jpg"` → date=None (not a calendar date), tags=["x"]
pub fn parse_file_name(name: &str) -> ParsedName {
    let rest = strip_serial_prefix(name);

    if let Some((date, after)) = split_leading_date(rest) {
        return ParsedName {
            date: Some(date),
            tags: parse_tags(strip_time(after)),
        };
    }

    ParsedName {
        date: None,
        tags: parse_tags(rest),
    }
}

/// Tags contributed by a directory name. Dates are not read from directories.
pub fn parse_dir_name(name: &str) -> BTreeSet<String> {
    parse_tags(name).into_iter().collect()
}

/// Extract every `_tag_` from `text`, lowercased.
///
/// A tag is the interior of an underscore pair: it contains no underscore
/// and neither starts nor ends with whitespace. Matches never overlap and are
/// found left to right, so `_a__b_` yields `a` and `b` while `_a_b_` yields
/// only `a`.
pub fn parse_tags(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    let mut tags = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('_') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('_') else {
            break;
        };
        let interior = &after[..close];
        if is_tag(interior) {
            tags.push(interior.to_lowercase());
            rest = &after[close + 1..];
        } else {
            // The closing underscore may still open the next tag
            rest = &after[close..];
        }
    }
    tags
}

fn is_tag(interior: &str) -> bool {
    match (interior.chars().next(), interior.chars().next_back()) {
        (Some(first), Some(last)) => !first.is_whitespace() && !last.is_whitespace(),
        _ => false,
    }
}

/// Drop a leading serial number (`100_1213`, `20190101`) and `IMAG<digits>`.
fn strip_serial_prefix(name: &str) -> &str {
    if split_leading_date(name).is_some() {
        return name;
    }

    let bytes = name.as_bytes();
    let mut end = 0;
    let mut i = 0;
    loop {
        let start = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        if i == start {
            break;
        }
        end = i;
        if i + 1 < bytes.len() && bytes[i] == b'_' && bytes[i + 1].is_ascii_digit() {
            i += 1;
        } else {
            break;
        }
    }
    let rest = &name[end..];

    if let Some(after) = rest.strip_prefix("IMAG") {
        let digits = after.bytes().take_while(u8::is_ascii_digit).count();
        if digits > 0 {
            return &after[digits..];
        }
    }
    rest
}

/// Split `YYYY-MM-DD` off the front of `text` if it is a valid date.
fn split_leading_date(text: &str) -> Option<(NaiveDate, &str)> {
    let head = text.get(..10)?;
    let shape_ok = head.bytes().enumerate().all(|(i, b)| match i {
        4 | 7 => b == b'-',
        _ => b.is_ascii_digit(),
    });
    if !shape_ok {
        return None;
    }
    let date = NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()?;
    Some((date, &text[10..]))
}

/// Drop an optional `HH.MM.SS` token (after optional whitespace).
fn strip_time(text: &str) -> &str {
    let trimmed = text.trim_start();
    let Some(head) = trimmed.get(..8) else {
        return text;
    };
    let is_time = head.bytes().enumerate().all(|(i, b)| match i {
        2 | 5 => b == b'.',
        _ => b.is_ascii_digit(),
    });
    if is_time { &trimmed[8..] } else { text }
}
