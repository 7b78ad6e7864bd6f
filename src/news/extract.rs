// src/news/extract.rs
//! Best-effort recovery of a JSON array of objects from free-form model output.
//!
//! Generative models asked for "a JSON array" answer with anything from a bare
//! array to prose wrapped around a fenced code block. The strategies below are
//! tried in order and the first one that yields at least one object wins.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::Value;

const WRAPPER_KEYS: [&str; 4] = ["articles", "results", "data", "items"];

/// Extract the objects of a JSON array embedded in `text`.
///
/// Returns `None` when no strategy produced a non-empty list of objects.
/// Non-object array elements are dropped.
pub fn try_extract_json_array(text: &str) -> Option<Vec<Value>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(v) = parse_document(trimmed) {
        return Some(v);
    }

    for block in fenced_blocks(trimmed) {
        if let Some(v) = parse_document(block.trim()) {
            return Some(v);
        }
    }

    if let Some(v) = first_balanced_array(trimmed) {
        return Some(v);
    }

    let objects = loose_objects(trimmed);
    if objects.is_empty() {
        None
    } else {
        Some(objects)
    }
}

/// Whole text as an array, or as an object wrapping one.
fn parse_document(s: &str) -> Option<Vec<Value>> {
    match parse_lenient(s)? {
        Value::Array(items) => non_empty(objects_only(items)),
        Value::Object(mut map) => WRAPPER_KEYS.iter().find_map(|k| match map.remove(*k) {
            Some(Value::Array(items)) => non_empty(objects_only(items)),
            _ => None,
        }),
        _ => None,
    }
}

/// Parse as-is, then retry with trailing commas removed.
fn parse_lenient(s: &str) -> Option<Value> {
    if let Ok(v) = serde_json::from_str::<Value>(s) {
        return Some(v);
    }
    static RE_TRAILING: OnceCell<Regex> = OnceCell::new();
    let re = RE_TRAILING.get_or_init(|| Regex::new(r",\s*([\]}])").unwrap());
    let repaired = re.replace_all(s, "$1");
    serde_json::from_str::<Value>(&repaired).ok()
}

fn fenced_blocks(s: &str) -> Vec<&str> {
    static RE_FENCE: OnceCell<Regex> = OnceCell::new();
    let re = RE_FENCE.get_or_init(|| Regex::new(r"(?s)```[A-Za-z0-9_-]*\s*\n?(.*?)```").unwrap());
    re.captures_iter(s)
        .filter_map(|c| c.get(1).map(|m| m.as_str()))
        .collect()
}

fn first_balanced_array(s: &str) -> Option<Vec<Value>> {
    s.char_indices()
        .filter(|(_, c)| *c == '[')
        .filter_map(|(start, _)| balanced_end(s, start).map(|end| &s[start..end]))
        .find_map(|span| match parse_lenient(span)? {
            Value::Array(items) => non_empty(objects_only(items)),
            _ => None,
        })
}

/// Every independently parseable top-level `{...}` span.
fn loose_objects(s: &str) -> Vec<Value> {
    let mut out = Vec::new();
    let mut pos = 0;
    while let Some(offset) = s[pos..].find('{') {
        let start = pos + offset;
        match balanced_end(s, start) {
            Some(end) => match parse_lenient(&s[start..end]) {
                Some(v @ Value::Object(_)) => {
                    out.push(v);
                    pos = end;
                }
                _ => pos = start + 1,
            },
            None => pos = start + 1,
        }
    }
    out
}

/// Byte index one past the bracket closing the one at `start`.
/// String literals and escapes are skipped.
fn balanced_end(s: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in s[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(start + i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

fn objects_only(items: Vec<Value>) -> Vec<Value> {
    items.into_iter().filter(Value::is_object).collect()
}

fn non_empty(v: Vec<Value>) -> Option<Vec<Value>> {
    if v.is_empty() {
        None
    } else {
        Some(v)
    }
}
