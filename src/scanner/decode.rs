//! Input normalization for script sources.
//!
//! The service delivers web resource content inconsistently: sometimes
//! raw JavaScript, sometimes the same text base64-encoded. The heuristic
//! here only decodes when the text cannot plausibly be script already.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use tracing::debug;

/// Substrings that mark the input as already-plain JavaScript. None of
/// them can occur in base64 output.
const SCRIPT_MARKERS: [&str; 5] = ["function", ";", "var ", "let ", "const "];

/// Return the source as plain text, decoding base64 when the input
/// looks encoded. Never fails: any decode problem falls back to the
/// input as-is.
pub fn normalize_source(raw: &str) -> String {
    if !looks_like_base64(raw) {
        return raw.to_string();
    }
    let stripped: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    match BASE64.decode(stripped.as_bytes()) {
        Ok(bytes) => match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(_) => {
                debug!("base64 payload is not UTF-8, treating source as plain text");
                raw.to_string()
            }
        },
        Err(err) => {
            debug!("base64 decode failed ({}), treating source as plain text", err);
            raw.to_string()
        }
    }
}

fn looks_like_base64(raw: &str) -> bool {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return false;
    }
    if SCRIPT_MARKERS.iter().any(|m| trimmed.contains(m)) {
        return false;
    }
    let stripped: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    if stripped.is_empty() || stripped.len() % 4 != 0 {
        return false;
    }
    stripped
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '+' || c == '/' || c == '=')
}
