//! Compiled pattern sets for field-modification detection.
//!
//! Primary patterns require an explicit `formContext`/`Xrm.Page` call
//! chain with a quoted field name. Advanced patterns relax both and are
//! only consulted for lines no primary pattern claimed.

use crate::core::ModificationType;
use regex::{Regex, RegexBuilder};

pub struct ScriptPattern {
    pub regex: Regex,
    pub modification_type: ModificationType,
}

fn pattern(source: &str, modification_type: ModificationType) -> ScriptPattern {
    // Patterns are fixed strings; a failure to compile is a programming
    // error caught by the unit tests below.
    let regex = RegexBuilder::new(source)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|e| panic!("invalid built-in script pattern: {}", e));
    ScriptPattern {
        regex,
        modification_type,
    }
}

const FORM: &str = r#"(?:formContext|Xrm\.Page)"#;

lazy_static::lazy_static! {
    /// High-confidence call shapes. Group 1 is the field name, group 2
    /// the modification value.
    pub static ref PRIMARY_PATTERNS: Vec<ScriptPattern> = vec![
        pattern(
            &format!(r#"{FORM}\.getControl\(\s*["']([^"']+)["']\s*\)\.setVisible\(\s*(true|false)\s*\)"#),
            ModificationType::Visibility,
        ),
        pattern(
            &format!(r#"{FORM}\.getAttribute\(\s*["']([^"']+)["']\s*\)\.setRequiredLevel\(\s*["']([^"']*)["']\s*\)"#),
            ModificationType::RequiredLevel,
        ),
        pattern(
            &format!(r#"{FORM}\.getAttribute\(\s*["']([^"']+)["']\s*\)\.setValue\(\s*([^)]*?)\s*\)"#),
            ModificationType::DefaultValue,
        ),
        pattern(
            &format!(r#"{FORM}\.getControl\(\s*["']([^"']+)["']\s*\)\.setDisabled\(\s*(true|false)\s*\)"#),
            ModificationType::DisabledState,
        ),
        pattern(
            &format!(r#"{FORM}\.getControl\(\s*["']([^"']+)["']\s*\)\.setLabel\(\s*["']([^"']*)["']\s*\)"#),
            ModificationType::DisplayName,
        ),
    ];

    /// Lower-confidence shapes: any receiver, unquoted field names,
    /// arbitrary visibility expressions, bare-identifier values.
    pub static ref ADVANCED_PATTERNS: Vec<ScriptPattern> = vec![
        pattern(
            r#"getControl\(\s*["']?([\w.]+)["']?\s*\)\.setVisible\(\s*([^)]+?)\s*\)"#,
            ModificationType::Visibility,
        ),
        pattern(
            r#"getAttribute\(\s*["']?([\w.]+)["']?\s*\)\.setValue\(\s*([A-Za-z_$][\w$.]*)\s*\)"#,
            ModificationType::DefaultValue,
        ),
    ];
}
