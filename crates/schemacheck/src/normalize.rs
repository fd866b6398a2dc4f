//! Canonical forms for column types, defaults and extras.
//!
//! The production export and the live database describe the same column in
//! slightly different text: `int(11)` vs `int`, `'0'` vs `0`,
//! `current_timestamp()` vs `CURRENT_TIMESTAMP`. Both loaders run every value
//! through these functions so the diff engine only ever sees one spelling.

use regex::Regex;
use std::sync::LazyLock;

/// Canonical spelling of every "timestamp-now" default.
pub const CURRENT_TIMESTAMP: &str = "CURRENT_TIMESTAMP";

/// Canonical spelling of an empty-string default.
pub const EMPTY_STRING_DEFAULT: &str = "''";

static CHARSET_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:character\s+set|charset|collate)\s+\S+").expect("charset pattern is valid")
});

static UNSIGNED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\bunsigned\b").expect("unsigned pattern is valid"));

static DISPLAY_WIDTH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(tinyint|smallint|mediumint|int|bigint)(?:\s*\(\s*\d+\s*\))+")
        .expect("display width pattern is valid")
});

/// Normalize a raw column type such as `INT(11) UNSIGNED` into `int unsigned`.
///
/// - lowercased and trimmed
/// - display widths on integer types removed (`varchar(255)` keeps its length)
/// - `unsigned` moved to a single trailing token
/// - `character set`, `charset` and `collate` clauses removed
/// - whitespace collapsed
///
/// The result is a projection: normalizing it again returns it unchanged.
pub fn normalize_type(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();

    // `unsigned` comes out first so it can never be taken for a charset value
    let unsigned = UNSIGNED.is_match(&lowered);
    let without_unsigned = UNSIGNED.replace_all(&lowered, " ");

    let without_charset = CHARSET_CLAUSE.replace_all(&without_unsigned, " ");
    let without_width = DISPLAY_WIDTH.replace_all(&without_charset, "$1 ");

    let mut normalized = without_width.split_whitespace().collect::<Vec<_>>().join(" ");
    if unsigned {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str("unsigned");
    }
    normalized
}

/// Normalize a raw default value.
///
/// `None` (or the literal `NULL`) means "no default". Any spelling of the
/// timestamp-now default becomes [`CURRENT_TIMESTAMP`]. One layer of quotes
/// is stripped, and an empty string default is spelled [`EMPTY_STRING_DEFAULT`]
/// so it stays distinct from "no default".
pub fn normalize_default(raw: Option<&str>) -> Option<String> {
    let raw = raw?;

    if raw.eq_ignore_ascii_case("NULL") {
        return None;
    }

    // also covers `current_timestamp()` and `CURRENT_TIMESTAMP(6)`
    if raw.to_ascii_uppercase().contains(CURRENT_TIMESTAMP) {
        return Some(CURRENT_TIMESTAMP.to_string());
    }

    let stripped = strip_quotes(raw);
    if stripped.is_empty() {
        Some(EMPTY_STRING_DEFAULT.to_string())
    } else {
        Some(stripped.to_string())
    }
}

/// Normalize an auto-generation marker such as `AUTO_INCREMENT`.
pub fn normalize_extra(raw: &str) -> String {
    raw.trim().to_lowercase()
}

fn strip_quotes(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}
