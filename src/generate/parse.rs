//! Tolerant parsing of model-produced drug lists.
//!
//! The model is asked for a JSON array of strings, but the response is
//! untrusted input: it may wrap the array in prose, answer with a
//! markdown list, or fall back to comma-separated prose. Three strategies
//! run in order of preference; the first to yield a non-empty list wins
//! and later strategies are not attempted:
//!
//! 1. JSON array found anywhere in the text (greedy bracket match),
//!    accepting only string elements.
//! 2. Bulleted/numbered lines, one name per line, with parenthetical
//!    brand-name asides stripped.
//! 3. A comma-separated flat list as last resort.
//!
//! [`validate_drug_list`] then normalizes and filters whatever came out.

use std::collections::HashSet;

/// Maximum accepted name length; longer strings are parsing artifacts.
const MAX_NAME_LEN: usize = 100;

/// Minimum accepted name length.
const MIN_NAME_LEN: usize = 3;

/// Extract raw drug names from a model response.
pub fn parse_drug_list(text: &str) -> Vec<String> {
    for strategy in [parse_json_array, parse_line_list, parse_comma_list] {
        let names = strategy(text);
        if !names.is_empty() {
            return names;
        }
    }
    Vec::new()
}

/// Normalize and filter a parsed list: lowercase, trim, dedupe, and drop
/// names outside [3, 100] characters or containing bracket/brace/backslash
/// characters left over from malformed JSON.
pub fn validate_drug_list(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(|name| name.trim().to_lowercase())
        .filter(|name| {
            let len = name.chars().count();
            len >= MIN_NAME_LEN
                && len <= MAX_NAME_LEN
                && !name.contains(['[', ']', '{', '}', '\\'])
        })
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Strategy 1: greedy bracket match for a JSON array of strings.
fn parse_json_array(text: &str) -> Vec<String> {
    let (Some(start), Some(end)) = (text.find('['), text.rfind(']')) else {
        return Vec::new();
    };
    if end <= start {
        return Vec::new();
    }

    match serde_json::from_str::<Vec<serde_json::Value>>(&text[start..=end]) {
        Ok(values) => values
            .into_iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// Strategy 2: one name per bulleted or numbered line.
fn parse_line_list(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(strip_list_marker)
        .map(strip_parenthetical)
        .filter(|name| !name.is_empty())
        .collect()
}

/// Strategy 3: comma-separated flat list.
///
/// Requires at least two elements — a single comma-less blob is prose,
/// not a list.
fn parse_comma_list(text: &str) -> Vec<String> {
    let names: Vec<String> = text
        .split(',')
        .map(strip_parenthetical)
        .filter(|name| !name.is_empty())
        .collect();
    if names.len() >= 2 { names } else { Vec::new() }
}

/// Return the line's content if it carries a list marker (`-`, `*`, `•`,
/// `1.`, `1)`); `None` for prose lines, which keeps preambles like
/// "Here are the drugs:" out of the result.
fn strip_list_marker(line: &str) -> Option<&str> {
    let line = line.trim();

    for marker in ["- ", "* ", "• "] {
        if let Some(rest) = line.strip_prefix(marker) {
            return Some(rest);
        }
    }

    let digits = line.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &line[digits..];
        if let Some(rest) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
            return Some(rest.trim_start());
        }
    }

    None
}

/// Drop a trailing parenthetical aside ("semaglutide (Ozempic)" →
/// "semaglutide") and any markdown emphasis characters.
fn strip_parenthetical(name: &str) -> String {
    let name = match name.find('(') {
        Some(idx) => &name[..idx],
        None => name,
    };
    name.trim().trim_matches('*').trim().to_string()
}
