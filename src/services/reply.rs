//! Decoding of free-text capability replies.
//!
//! Models wrap JSON in prose or Markdown fences, so the reply is scanned for balanced
//! JSON arrays/objects and the first one that decodes into the requested type wins.

use serde::de::DeserializeOwned;

use crate::services::providers::ParseOutcome;

/// Decodes the first JSON value embedded in `text` that fits `T`
pub fn parse_embedded_json<T: DeserializeOwned>(text: &str) -> ParseOutcome<T> {
    for (start, c) in text.char_indices() {
        if c != '[' && c != '{' {
            continue;
        }
        let Some(end) = balanced_end(&text[start..]) else {
            continue;
        };
        if let Ok(value) = serde_json::from_str::<T>(&text[start..start + end]) {
            return ParseOutcome::Parsed(value);
        }
    }
    ParseOutcome::Unparseable
}

/// Byte length of the bracketed value opening `text`, if it closes
fn balanced_end(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            ']' | '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(i + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}
