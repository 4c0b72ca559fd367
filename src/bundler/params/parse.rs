//! Text parsers shared by the standard descriptors.

use crate::bundler::error::{Error, Result};
use std::collections::BTreeMap;

/// Parses `true`/`false` (case-insensitive, also `yes`/`no`, `1`/`0`).
pub fn parse_bool(id: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "1" => Ok(true),
        "false" | "no" | "0" => Ok(false),
        _ => Err(Error::ParamParse {
            id: id.to_string(),
            value: raw.to_string(),
            reason: "expected true or false".to_string(),
        }),
    }
}

/// Splits on runs of whitespace, dropping empty tokens.
pub fn split_whitespace(raw: &str) -> Vec<String> {
    raw.split_whitespace().map(str::to_string).collect()
}

/// Splits a command line on whitespace, keeping quoted runs together.
///
/// Single and double quotes group; a backslash escapes the next character.
/// Quotes are removed from the resulting tokens.
pub fn split_arguments(raw: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut quote: Option<char> = None;
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        match (c, quote) {
            ('\\', _) => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_token = true;
            }
            (q, None) if q == '"' || q == '\'' => {
                quote = Some(q);
                in_token = true;
            }
            (q, Some(open)) if q == open => quote = None,
            (c, None) if c.is_whitespace() => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (c, _) => {
                current.push(c);
                in_token = true;
            }
        }
    }
    if in_token {
        args.push(current);
    }
    args
}

/// Reads `key=value` (or `key: value`) lines into a map.
///
/// Blank lines and lines starting with `#` or `!` are skipped. A key may contain
/// an escaped separator (`\=`).
pub fn parse_properties(raw: &str) -> BTreeMap<String, String> {
    let mut map = BTreeMap::new();
    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let (key, value) = split_property(line);
        map.insert(key, value);
    }
    map
}

fn split_property(line: &str) -> (String, String) {
    let mut key = String::new();
    let mut chars = line.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => {
                if let Some((_, next)) = chars.next() {
                    key.push(next);
                }
            }
            '=' | ':' => return (key.trim().to_string(), line[i + 1..].trim().to_string()),
            _ => key.push(c),
        }
    }
    (key.trim().to_string(), String::new())
}

/// Splits on commas, trimming each entry and dropping empty ones.
pub fn split_commas(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
