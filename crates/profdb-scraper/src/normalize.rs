//! Field normalization: raw text scraped from the page into typed values.
//!
//! Every function here is total. Malformed input degrades to `None`,
//! `false` or an empty string; nothing panics or returns an error.

use std::sync::LazyLock;

use regex::Regex;

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("valid regex"));
static NUMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-?(?:\d+(?:\.\d*)?|\.\d+)").expect("valid regex"));
static PERCENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*%?").expect("valid regex"));
static COUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*").expect("valid regex"));
// Pictographs plus the modifiers and joiners that build emoji sequences.
static EMOJI_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\p{Extended_Pictographic}\p{Emoji_Modifier}\x{FE0F}\x{20E3}\x{200D}]")
        .expect("valid regex")
});

const MISSING_MARKERS: [&str; 6] = ["N/A", "NA", "NONE", "--", "-", ""];
const TRUTHY: [&str; 6] = ["true", "yes", "y", "1", "on", "enabled"];

/// Strip HTML markup, emoji and non-printable characters, then collapse all
/// whitespace runs to a single space and trim.
///
/// Letters outside ASCII (accented names) are kept.
#[must_use]
pub fn clean_text(raw: &str) -> String {
    let without_tags = TAG_RE.replace_all(raw, " ");
    let without_emoji = EMOJI_RE.replace_all(&without_tags, "");
    let printable: String = without_emoji
        .chars()
        .map(|c| if c.is_whitespace() { ' ' } else { c })
        .filter(|&c| c != '<' && c != '>' && !is_unprintable(c))
        .collect();
    printable.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_unprintable(c: char) -> bool {
    if c.is_control() {
        return true;
    }
    matches!(
        u32::from(c),
        0x200B..=0x200F      // zero-width space / joiners / direction marks
        | 0x2060..=0x206F    // word joiner, invisible operators
        | 0xFEFF             // byte order mark
        | 0xFE00..=0xFE0F    // variation selectors
        | 0xE0000..=0xE007F  // tag characters
        | 0xE000..=0xF8FF    // private use
    )
}

fn is_missing(trimmed: &str) -> bool {
    MISSING_MARKERS
        .iter()
        .any(|marker| trimmed.eq_ignore_ascii_case(marker))
}

/// Parse a decimal number out of decorated text such as `"4.8/5"` or
/// `"3.2 level of difficulty"`.
///
/// Anything after a `/` is ignored, so `"4.8/5"` yields `4.8`. Returns `None`
/// for `"N/A"`, empty input, or text without a number.
#[must_use]
pub fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if is_missing(trimmed) {
        return None;
    }
    let head = trimmed.split('/').next().unwrap_or(trimmed);
    let matched = NUMBER_RE.find(head)?;
    matched
        .as_str()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Parse a percentage such as `"87%"` or `"87 % would take again"`.
///
/// Fractions are rounded. Values outside `0..=100` and `"N/A"` yield `None`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn parse_percentage(raw: &str) -> Option<u8> {
    let trimmed = raw.trim();
    if is_missing(trimmed) {
        return None;
    }
    let captures = PERCENT_RE.captures(trimmed)?;
    let value = captures.get(1)?.as_str().parse::<f64>().ok()?;
    if (0.0..=100.0).contains(&value) {
        // in range, so the cast cannot truncate
        Some(value.round() as u8)
    } else {
        None
    }
}

/// Case-insensitive match against a fixed truthy vocabulary. Anything else,
/// including empty input, is `false`.
#[must_use]
pub fn parse_boolean(raw: &str) -> bool {
    let lowered = raw.trim().to_ascii_lowercase();
    TRUTHY.contains(&lowered.as_str())
}

/// First whole number in the text, thousands separators allowed:
/// `"1,204 ratings"` yields `1204`.
#[must_use]
pub fn parse_count(raw: &str) -> Option<u32> {
    let matched = COUNT_RE.find(raw)?;
    matched.as_str().replace(',', "").parse::<u32>().ok()
}

/// Clean each entry, drop empties and keep only the first occurrence of
/// each value, preserving order.
#[must_use]
pub fn dedup_cleaned<I, S>(raw: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut out: Vec<String> = Vec::new();
    for item in raw {
        let cleaned = clean_text(item.as_ref());
        if !cleaned.is_empty() && !out.contains(&cleaned) {
            out.push(cleaned);
        }
    }
    out
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
