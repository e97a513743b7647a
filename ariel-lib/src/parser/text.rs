//! Parsers for the free text embedded in pages: counters, timestamps, edit entries and
//! permission labels. None of these touch the DOM.

use std::sync::OnceLock;

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::model::Permissions;

const EDITED_MARKER: &str = "modificato";

const DATETIME_FORMATS: [&str; 6] = [
    "%d/%m/%Y %H:%M:%S",
    "%d/%m/%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];
const DATE_FORMATS: [&str; 2] = ["%d/%m/%Y", "%Y-%m-%d"];
// Date followed, possibly after some words, by a time.
const EMBEDDED_DATETIME_FORMAT: &str =
    r"(\d{1,2}/\d{1,2}/\d{4})(?:\D*?(\d{1,2}:\d{2}(?::\d{2})?))?";

const NO_ACCESS_LABEL: &str = "non puoi accedere";
const PUBLIC_LABEL: &str = "area pubblica";
const FAVORITE_LABEL: &str = "preferito";

/// Keeps only the digits of `segment`; no digits (or an overflowing number) count as zero.
pub fn digits(segment: &str) -> u32 {
    segment
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>()
        .parse()
        .unwrap_or(0)
}

/// Splits a blob like `12 letti, 3 non letti` into `(total, unread)`.
///
/// A missing second segment means nothing is unread.
pub fn item_counts(blob: &str) -> (u32, u32) {
    let mut segments = blob.split(',').filter(|segment| !segment.is_empty());
    let total = segments.next().map_or(0, digits);
    let unread = segments.next().map_or(0, digits);
    (total, unread)
}

/// Replaces the dots of a `10.35`-style time with colons and collapses whitespace.
pub fn normalize_time(text: &str) -> String {
    text.replace('.', ":")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parses the creation stamp of a thread, e.g. `12/03/2019 10.35 modificato il 13/03/2019`.
///
/// Everything from the edit marker onwards is ignored.
pub fn thread_date(text: &str) -> Option<NaiveDateTime> {
    let created = text
        .split(EDITED_MARKER)
        .find(|segment| !segment.is_empty())?;
    let created = normalize_time(created.trim());
    parse_datetime(&created).or_else(|| parse_embedded_datetime(&created))
}

fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

fn parse_embedded_datetime(text: &str) -> Option<NaiveDateTime> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let captures = PATTERN
        .get_or_init(|| Regex::new(EMBEDDED_DATETIME_FORMAT).ok())
        .as_ref()?
        .captures(text)?;
    match captures.get(2) {
        Some(time) => parse_datetime(&format!("{} {}", &captures[1], time.as_str())),
        None => parse_datetime(&captures[1]),
    }
}

/// Splits an edit-history entry `date | author` into its trimmed parts.
///
/// The date keeps its textual form (dots turned into colons); `None` if either part is missing.
pub fn edit_entry(text: &str) -> Option<(String, String)> {
    let mut segments = text.split('|').filter(|segment| !segment.is_empty());
    let date = normalize_time(segments.next()?.trim());
    let author = segments.next()?.trim().to_owned();
    Some((date, author))
}

/// Infers access permissions from the labels listed under a course.
///
/// Each flag is looked up independently; a label that never shows up leaves its flag at the
/// permissive default.
pub fn permissions<'a>(labels: impl IntoIterator<Item = &'a str>) -> Permissions {
    labels
        .into_iter()
        .fold(Permissions::default(), |mut permissions, label| {
            if label.contains(NO_ACCESS_LABEL) {
                permissions.can_access = false;
            }
            if label.contains(PUBLIC_LABEL) {
                permissions.is_public = true;
            }
            if label.contains(FAVORITE_LABEL) {
                permissions.is_favorite = true;
            }
            permissions
        })
}
