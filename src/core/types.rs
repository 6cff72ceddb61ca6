use serde::{Deserialize, Serialize};
use std::fmt;

/// Typed view over the integer component codes delivered by the service.
///
/// Only three codes are acted on; everything else is retained under
/// `Other` so a component list round-trips without loss.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentType {
    Entity,
    Attribute,
    WebResource,
    Other(i32),
}

impl ComponentType {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => ComponentType::Entity,
            2 => ComponentType::Attribute,
            61 => ComponentType::WebResource,
            other => ComponentType::Other(other),
        }
    }

    pub fn code(&self) -> i32 {
        match self {
            ComponentType::Entity => 1,
            ComponentType::Attribute => 2,
            ComponentType::WebResource => 61,
            ComponentType::Other(code) => *code,
        }
    }
}

impl fmt::Display for ComponentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ComponentType::Entity => write!(f, "Entity"),
            ComponentType::Attribute => write!(f, "Attribute"),
            ComponentType::WebResource => write!(f, "WebResource"),
            ComponentType::Other(code) => write!(f, "Other({})", code),
        }
    }
}

/// Kind of field behavior a script line was observed to change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModificationType {
    Visibility,
    RequiredLevel,
    DefaultValue,
    DisabledState,
    DisplayName,
    Other,
}

impl ModificationType {
    /// Stable name used in persisted records and natural keys.
    pub fn as_str(&self) -> &'static str {
        match self {
            ModificationType::Visibility => "Visibility",
            ModificationType::RequiredLevel => "RequiredLevel",
            ModificationType::DefaultValue => "DefaultValue",
            ModificationType::DisabledState => "DisabledState",
            ModificationType::DisplayName => "DisplayName",
            ModificationType::Other => "Other",
        }
    }
}

impl fmt::Display for ModificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
