//! Quasi-JSON recovery.
//!
//! LLM output that is *supposed* to be one JSON object arrives fenced in
//! markdown, wrapped in prose, or with unescaped quotes and trailing commas
//! inside. Recovery runs an ordered chain of candidate extractions, each
//! tried strictly and then with a repair pass, and the first decode that
//! yields an object wins:
//!
//! 1. the text with any markdown code fence stripped, decoded strictly;
//! 2. the same text after the repair pass;
//! 3. the first brace-matched `{...}` substring, decoded strictly;
//! 4. that substring after the repair pass.
//!
//! The repair pass removes trailing commas before `}`/`]`, escapes literal
//! newlines inside strings, and escapes interior quotes using a lookahead
//! heuristic: a quote is treated as the string's closing delimiter only when
//! the next non-whitespace character is `,` `:` `}` `]` or end of text. A
//! quote directly followed by a comma that is itself part of the intended
//! content is misclassified — a known limit of the heuristic, kept as-is.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::error::GenError;

static TRAILING_COMMA_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("valid regex"));

/// Recovers one JSON object from free-form model output.
///
/// # Errors
///
/// Returns [`GenError::RecoveryFailed`] carrying the input length when every
/// fallback is exhausted.
pub fn recover_object(text: &str) -> Result<Value, GenError> {
    let stripped = strip_code_fence(text.trim());

    let candidates: [Option<&str>; 2] = [Some(stripped), braced_candidate(stripped)];

    for candidate in candidates.into_iter().flatten() {
        if let Some(value) = decode_or_repair(candidate) {
            return Ok(value);
        }
    }

    Err(GenError::RecoveryFailed {
        text_len: text.chars().count(),
    })
}

/// Strict decode first, repaired decode second. Only objects count — a bare
/// array or scalar in a fence is not the record we were promised.
fn decode_or_repair(candidate: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(candidate) {
        if value.is_object() {
            return Some(value);
        }
    }
    let repaired = repair(candidate);
    if let Ok(value) = serde_json::from_str::<Value>(&repaired) {
        if value.is_object() {
            return Some(value);
        }
    }
    None
}

/// Strips a leading markdown code fence and its closing fence.
///
/// The closing fence is located by scanning line-by-line from the end, so a
/// backtick-looking sequence inside string content does not end the block
/// early. An unterminated fence keeps everything after the opening line.
fn strip_code_fence(text: &str) -> &str {
    if !text.starts_with("```") {
        return text;
    }
    let Some(first_nl) = text.find('\n') else {
        // A fence with no body.
        return "";
    };
    let body_start = first_nl + 1;

    let lines: Vec<&str> = text.split('\n').collect();
    let mut close_line = None;
    for i in (1..lines.len()).rev() {
        if lines[i].trim() == "```" {
            close_line = Some(i);
            break;
        }
    }

    let body_end = match close_line {
        Some(i) => {
            // Byte offset of the start of line `i`; the newline before it
            // ends the body.
            let offset: usize = lines[..i].iter().map(|l| l.len() + 1).sum();
            offset.saturating_sub(1).max(body_start)
        }
        None => text.len(),
    };
    text[body_start..body_end].trim()
}

/// Finds the first `{` and its matching `}` by depth counting. Depth is
/// tracked independent of string state at this stage; the repair pass deals
/// with quoting afterwards.
fn braced_candidate(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    for (offset, ch) in text[start..].char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Repair pass for the common LLM JSON failure modes.
fn repair(text: &str) -> String {
    let text = TRAILING_COMMA_RE.replace_all(text, "$1");
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if !in_string {
            out.push(ch);
            if ch == '"' {
                in_string = true;
            }
            i += 1;
            continue;
        }

        match ch {
            // Copy escape sequences verbatim without reinterpreting them.
            '\\' => {
                out.push(ch);
                if i + 1 < chars.len() {
                    i += 1;
                    out.push(chars[i]);
                }
                i += 1;
            }
            '\n' => {
                out.push_str("\\n");
                i += 1;
            }
            '"' => {
                // Closing delimiter only when the next non-whitespace
                // character is structural (or the text ends here).
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                if j >= chars.len() || matches!(chars[j], ',' | ':' | '}' | ']') {
                    out.push('"');
                    in_string = false;
                } else {
                    out.push_str("\\\"");
                }
                i += 1;
            }
            _ => {
                out.push(ch);
                i += 1;
            }
        }
    }

    out
}

#[cfg(test)]
#[path = "recovery_test.rs"]
mod tests;
