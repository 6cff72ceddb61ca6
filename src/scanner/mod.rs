//! Textual scanner extracting field-modification events from scripts.
//!
//! Deliberately a best-effort pattern matcher over lines of source, not
//! a JavaScript parser. Line numbers in the output are 1-based and part
//! of the contract: correlation and reporting key off them.

pub mod decode;
pub mod patterns;

use crate::model::{FieldModification, ADVANCED_PATTERN_NOTE};
use chrono::Utc;
use patterns::{ScriptPattern, ADVANCED_PATTERNS, PRIMARY_PATTERNS};
use tracing::trace;
use uuid::Uuid;

pub use decode::normalize_source;

/// Stateless scanner; one instance serves the whole run.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScriptScanner;

impl ScriptScanner {
    pub fn new() -> Self {
        Self
    }

    /// Extract every field modification the pattern sets can see in
    /// `source`. Total: malformed or undecodable input yields an empty
    /// list, never an error.
    pub fn scan(
        &self,
        source: &str,
        web_resource_id: Uuid,
        web_resource_name: &str,
    ) -> Vec<FieldModification> {
        if source.trim().is_empty() {
            return Vec::new();
        }
        let text = normalize_source(source);
        let mut found = Vec::new();

        for (index, raw_line) in text.split('\n').enumerate() {
            let line = raw_line.trim_end_matches('\r');
            if line.trim().is_empty() {
                continue;
            }
            let line_number = index + 1;

            let mut primary_matched = false;
            for pattern in PRIMARY_PATTERNS.iter() {
                primary_matched |= self.apply_pattern(
                    pattern,
                    line,
                    line_number,
                    web_resource_id,
                    web_resource_name,
                    None,
                    &mut found,
                );
            }

            // Advanced set only runs on lines no primary pattern claimed.
            if !primary_matched {
                for pattern in ADVANCED_PATTERNS.iter() {
                    self.apply_pattern(
                        pattern,
                        line,
                        line_number,
                        web_resource_id,
                        web_resource_name,
                        Some(ADVANCED_PATTERN_NOTE),
                        &mut found,
                    );
                }
            }
        }
        found
    }

    fn apply_pattern(
        &self,
        pattern: &ScriptPattern,
        line: &str,
        line_number: usize,
        web_resource_id: Uuid,
        web_resource_name: &str,
        notes: Option<&str>,
        found: &mut Vec<FieldModification>,
    ) -> bool {
        let mut matched = false;
        for caps in pattern.regex.captures_iter(line) {
            // Fewer groups than expected: skip the capture silently.
            let (Some(field), Some(value)) = (caps.get(1), caps.get(2)) else {
                continue;
            };
            trace!(
                field = field.as_str(),
                kind = %pattern.modification_type,
                line_number,
                "script modification detected"
            );
            found.push(FieldModification {
                field_name: field.as_str().to_string(),
                modification_type: pattern.modification_type,
                modification_value: value.as_str().to_string(),
                source_web_resource_id: web_resource_id,
                source_web_resource_name: web_resource_name.to_string(),
                javascript_code: line.to_string(),
                line_number,
                parsed_on: Utc::now(),
                notes: notes.map(|n| n.to_string()),
            });
            matched = true;
        }
        matched
    }
}
