use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A logical table definition.
///
/// Attributes are nested here because the service's expanded entity
/// query delivers them that way; the collector never fetches attributes
/// on their own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub metadata_id: Uuid,
    pub logical_name: String,
    pub object_type_code: i32,
    pub entity_set_name: String,
    pub base_table_name: String,
    pub collection_name: String,
    pub is_activity: bool,
    pub component_state: i32,
    #[serde(default)]
    pub attributes: Vec<AttributeMetadata>,
}

/// Type-specific facts on an attribute, matched exhaustively where they
/// feed persisted fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum AttributeKind {
    Plain,
    Integer {
        min_value: Option<i64>,
        max_value: Option<i64>,
    },
    Decimal {
        min_value: Option<f64>,
        max_value: Option<f64>,
        precision: Option<i32>,
    },
    Text {
        max_length: Option<i32>,
    },
    Formula {
        formula: String,
    },
}

impl Default for AttributeKind {
    fn default() -> Self {
        AttributeKind::Plain
    }
}

/// The atomic schema fact: one logical field on one logical table.
///
/// Uniquely identified for persistence by `(table, column_schema)`; a
/// record missing either half of that pair is not persistable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeMetadata {
    pub table: String,
    pub column_logical: String,
    pub column_schema: String,
    pub data_type: String,
    #[serde(default)]
    pub kind: AttributeKind,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub audit_enabled: bool,
    #[serde(default)]
    pub is_custom: bool,
    #[serde(default)]
    pub created_on: Option<DateTime<Utc>>,
    #[serde(default)]
    pub modified_on: Option<DateTime<Utc>>,
}

impl AttributeMetadata {
    /// Whether the `(table, column_schema)` alternate key can be formed.
    pub fn has_alternate_key(&self) -> bool {
        !self.table.trim().is_empty() && !self.column_schema.trim().is_empty()
    }

    /// Alternate key as stored: case-sensitive concatenation.
    pub fn alternate_key(&self) -> String {
        format!("{}.{}", self.table, self.column_schema)
    }
}
