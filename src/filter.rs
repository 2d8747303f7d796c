//! Catalog and schema name filters.
//!
//! Filters are comma-separated SQL `LIKE` patterns: `%` matches any run of
//! characters, `_` matches one character, and matching ignores case.

use regex::{Regex, RegexBuilder};

/// Split a comma-separated filter string into patterns.
pub fn split_filter(filter: &str) -> Vec<String> {
    filter
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// Compile a LIKE pattern into an anchored, case-insensitive regex.
fn like_to_regex(pattern: &str) -> Option<Regex> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    for ch in pattern.chars() {
        match ch {
            '%' => re.push_str(".*"),
            '_' => re.push('.'),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    RegexBuilder::new(&re).case_insensitive(true).build().ok()
}

/// Check a name against one LIKE pattern.
pub fn matches_like(name: &str, pattern: &str) -> bool {
    like_to_regex(pattern).is_some_and(|re| re.is_match(name))
}

/// Check a name against any of the patterns.
pub fn matches_any_like(name: &str, patterns: &[String]) -> bool {
    patterns.iter().any(|p| matches_like(name, p))
}
