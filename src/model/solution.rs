use crate::core::ComponentType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A named deployment unit in the remote platform.
///
/// Immutable after collection; a run builds its own set and drops it at
/// process end.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    pub id: Uuid,
    pub unique_name: String,
    pub friendly_name: String,
}

/// A typed member reference belonging to a solution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionComponent {
    pub object_id: Uuid,
    pub component_type: ComponentType,
    pub is_metadata: bool,
}

/// A stored client-side script asset, content as delivered by the
/// service (sometimes raw JavaScript, sometimes base64).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebResource {
    pub id: Uuid,
    pub display_name: String,
    pub content: String,
    #[serde(default)]
    pub dependency_xml: String,
}
