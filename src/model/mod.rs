pub mod entity;
pub mod modification;
pub mod solution;

pub use entity::{AttributeKind, AttributeMetadata, EntityMetadata};
pub use modification::{CorrelatedAttribute, FieldModification, ADVANCED_PATTERN_NOTE};
pub use solution::{Solution, SolutionComponent, WebResource};
