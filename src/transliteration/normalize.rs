/*!
 * Output normalization policies.
 *
 * Two independent pure functions sanitize transliteration output: one for
 * URL slugs, one for file names. Both are idempotent.
 */

use once_cell::sync::Lazy;
use regex::Regex;

/// Characters legal in a slug; everything else collapses to a hyphen
static SLUG_INVALID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^A-Za-z0-9'_.\-]+").expect("valid slug pattern")
});

/// Characters legal in a file name; apostrophes are not allowed here
static FILENAME_INVALID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[^A-Za-z0-9_.\-]+").expect("valid filename pattern")
});

/// Runs of two or more hyphens
static HYPHEN_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"-{2,}").expect("valid hyphen pattern"));

/// A dot followed by one or more hyphens ("name.-ext" artifacts)
static DOT_HYPHENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.-+").expect("valid dot pattern"));

/// Normalize a string for use as a URL slug.
///
/// Every maximal run of illegal characters becomes a single hyphen,
/// consecutive hyphens collapse, and leading/trailing hyphens are trimmed.
pub fn normalize_slug(value: &str) -> String {
    let value = SLUG_INVALID.replace_all(value, "-");
    let value = HYPHEN_RUNS.replace_all(&value, "-");
    value.trim_matches('-').to_string()
}

/// Normalize a string for use as a file name.
///
/// Same policy as [`normalize_slug`] minus apostrophes, plus collapsing
/// `.` followed by hyphens into a single `.` so extensions survive, and
/// trimming leading/trailing dots as well as hyphens.
pub fn normalize_filename(value: &str) -> String {
    let value = FILENAME_INVALID.replace_all(value, "-");
    let value = HYPHEN_RUNS.replace_all(&value, "-");
    let value = DOT_HYPHENS.replace_all(&value, ".");
    value.trim_matches(['-', '.']).to_string()
}
