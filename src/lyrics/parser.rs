//! LRC format parser
//!
//! Parses synchronized lyrics in LRC format:
//! [mm:ss.xx] Lyrics line here
//!
//! Example:
//! [00:12.34] Hello world
//! [00:15.00][01:15.00] Repeated hook
//!
//! Parsing never fails. Anything that is not a timestamped line is dropped.

use once_cell::sync::Lazy;
use regex::Regex;

/// Metadata tags like `[ar:Artist]`, `[ti:Title]`, `[offset:+200]`.
static METADATA_LINE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*\[[A-Za-z][A-Za-z_]*:[^\]]*\]\s*$").unwrap());

/// Timestamp tags: `[m:ss]`, `[m:ss.f]`, `[m:ss:f]` with a 1-3 digit fraction.
static TIME_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d+):(\d{1,2})(?:[.:](\d{1,3}))?\]").unwrap());

/// A single line of lyrics with timestamp
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LyricLine {
    /// Timestamp in milliseconds from start
    pub time_ms: u64,
    /// The lyrics text (may be empty for instrumental gaps)
    pub text: String,
}

impl LyricLine {
    pub fn new(time_ms: u64, text: impl Into<String>) -> Self {
        Self {
            time_ms,
            text: text.into(),
        }
    }
}

/// Parse LRC formatted lyrics into a sorted sequence with unique timestamps.
///
/// Every tag on a line produces its own entry sharing the line's text. When two
/// entries land on the same millisecond the first one (in input order) wins.
pub fn parse(content: &str) -> Vec<LyricLine> {
    let mut lines = Vec::new();

    for line in content.lines() {
        if METADATA_LINE.is_match(line) {
            continue;
        }

        let times: Vec<u64> = TIME_TAG
            .captures_iter(line)
            .filter_map(|caps| {
                parse_timestamp(
                    caps.get(1)?.as_str(),
                    caps.get(2)?.as_str(),
                    caps.get(3).map(|m| m.as_str()),
                )
            })
            .collect();

        if times.is_empty() {
            continue;
        }

        let text = TIME_TAG.replace_all(line, "");
        let text = text.trim();
        lines.extend(times.into_iter().map(|ms| LyricLine::new(ms, text)));
    }

    // Stable sort keeps input order among equal timestamps, so dedup keeps the first.
    lines.sort_by_key(|l| l.time_ms);
    lines.dedup_by_key(|l| l.time_ms);
    lines
}

/// Serialize lines back into LRC text, one `[mm:ss.xxx]` tag per line.
pub fn to_lrc(lines: &[LyricLine]) -> String {
    lines
        .iter()
        .map(|l| {
            let min = l.time_ms / 60_000;
            let sec = (l.time_ms % 60_000) / 1000;
            let ms = l.time_ms % 1000;
            if l.text.is_empty() {
                format!("[{min:02}:{sec:02}.{ms:03}]")
            } else {
                format!("[{min:02}:{sec:02}.{ms:03}] {}", l.text)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Convert tag components to milliseconds. The fraction is right-padded to
/// three digits, so "5" means 500ms and "34" means 340ms.
fn parse_timestamp(min: &str, sec: &str, frac: Option<&str>) -> Option<u64> {
    let min: u64 = min.parse().ok()?;
    let sec: u64 = sec.parse().ok()?;
    let ms: u64 = match frac {
        None => 0,
        Some(f) => {
            let value: u64 = f.parse().ok()?;
            match f.len() {
                1 => value * 100,
                2 => value * 10,
                _ => value,
            }
        }
    };
    min.checked_mul(60_000)?
        .checked_add(sec * 1000)?
        .checked_add(ms)
}
