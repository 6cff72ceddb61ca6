use crate::core::ModificationType;
use crate::model::AttributeMetadata;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Note attached to events matched by the lower-confidence pattern set.
pub const ADVANCED_PATTERN_NOTE: &str = "Advanced pattern detected - may need manual verification";

/// One observed field-behavior change in a script, tied to the exact
/// source line it came from.
///
/// Several modifications may name the same field; each is a distinct
/// observation and none are merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldModification {
    pub field_name: String,
    pub modification_type: ModificationType,
    pub modification_value: String,
    pub source_web_resource_id: Uuid,
    pub source_web_resource_name: String,
    /// The originating line, verbatim.
    pub javascript_code: String,
    /// 1-based line number within the (decoded) source.
    pub line_number: usize,
    pub parsed_on: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl FieldModification {
    pub fn is_advanced(&self) -> bool {
        self.notes.as_deref() == Some(ADVANCED_PATTERN_NOTE)
    }
}

/// An attribute together with every script modification whose field
/// name matched its logical column name. The unit the persister writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelatedAttribute {
    pub attribute: AttributeMetadata,
    pub modifications: Vec<FieldModification>,
}

impl CorrelatedAttribute {
    pub fn new(attribute: AttributeMetadata) -> Self {
        Self {
            attribute,
            modifications: Vec::new(),
        }
    }

    /// A `setVisible(false)` was observed for this field.
    pub fn is_hidden_by_script(&self) -> bool {
        self.modifications.iter().any(|m| {
            m.modification_type == ModificationType::Visibility
                && m.modification_value.eq_ignore_ascii_case("false")
        })
    }

    /// A `setRequiredLevel("required")` was observed for this field.
    pub fn is_required_by_script(&self) -> bool {
        self.modifications.iter().any(|m| {
            m.modification_type == ModificationType::RequiredLevel
                && m.modification_value.eq_ignore_ascii_case("required")
        })
    }

    pub fn has_default_value_by_script(&self) -> bool {
        self.modifications
            .iter()
            .any(|m| m.modification_type == ModificationType::DefaultValue)
    }

    /// First default-value expression observed, verbatim.
    pub fn script_default_value(&self) -> Option<&str> {
        self.modifications
            .iter()
            .find(|m| m.modification_type == ModificationType::DefaultValue)
            .map(|m| m.modification_value.as_str())
    }

    /// Distinct contributing web resource names, in discovery order.
    pub fn modifying_web_resources(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for m in &self.modifications {
            let name = m.source_web_resource_name.as_str();
            if !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }
}
