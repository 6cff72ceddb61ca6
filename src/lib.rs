// ============================================================================
// datadict Library
// ============================================================================
//
// Builds a data dictionary for a tenant's schema service: enumerates
// entities and fields in named solutions, scans form scripts for
// field-behavior modifications, correlates them with schema attributes,
// and upserts the enriched records back into the store without
// duplicating previous runs.

pub mod cli;
pub mod collector;
pub mod config;
pub mod core;
pub mod correlator;
pub mod model;
pub mod persister;
pub mod pipeline;
pub mod scanner;
pub mod service;

// Re-export main types for convenience
pub use config::DictConfig;
pub use self::core::{ComponentType, DictError, ModificationType, RecordFields, Result, Value};
pub use model::{
    AttributeKind, AttributeMetadata, CorrelatedAttribute, EntityMetadata, FieldModification,
    Solution, SolutionComponent, WebResource, ADVANCED_PATTERN_NOTE,
};
pub use persister::{Persister, PersistSummary};
pub use pipeline::{Pipeline, RunSummary};
pub use scanner::ScriptScanner;
pub use service::{
    EntityFilter, InMemoryService, MetadataService, WriteOp, WriteOutcome, WriteRequest,
};
