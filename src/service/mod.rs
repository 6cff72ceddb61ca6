//! Seam to the remote metadata & store service.
//!
//! The pipeline only ever talks to this trait. Every call is a blocking
//! network round-trip and may fail transiently; the caller decides which
//! failures abort the run (collection) and which are per-item faults
//! (persistence).

pub mod memory;

use crate::core::{RecordFields, Result};
use crate::model::{EntityMetadata, Solution, SolutionComponent, WebResource};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use memory::InMemoryService;

/// Read filter for the full-schema entity enumeration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityFilter {
    /// Expand each entity's attribute list in the same query.
    pub include_attributes: bool,
    /// Restrict to these logical names; `None` means all entities.
    pub logical_names: Option<Vec<String>>,
}

impl EntityFilter {
    /// Everything, attributes expanded. What the collector uses for the
    /// full schema pass.
    pub fn all_with_attributes() -> Self {
        Self {
            include_attributes: true,
            logical_names: None,
        }
    }
}

/// One pending write in a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteRequest {
    pub table: String,
    pub op: WriteOp,
    pub fields: RecordFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WriteOp {
    Create,
    Update(Uuid),
}

/// Per-request result of a batch submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WriteOutcome {
    Created(Uuid),
    Updated(Uuid),
    Failed { message: String },
}

/// Blocking client surface of the remote metadata & store service.
pub trait MetadataService {
    /// Solutions are matched by unique name; names with no match are
    /// silently absent from the result.
    fn find_solutions_by_unique_name(&self, names: &[String]) -> Result<Vec<Solution>>;

    fn list_components(&self, solution_id: Uuid) -> Result<Vec<SolutionComponent>>;

    fn list_entities(&self, filter: &EntityFilter) -> Result<Vec<EntityMetadata>>;

    /// Content is delivered as stored; it may be base64-encoded.
    fn get_web_resource(&self, object_id: Uuid) -> Result<Option<WebResource>>;

    /// Case-insensitive lookup of a record by a single key field.
    fn find_record_by_alternate_key(
        &self,
        table: &str,
        key_field: &str,
        key_value: &str,
    ) -> Result<Option<Uuid>>;

    fn create_record(&self, table: &str, fields: RecordFields) -> Result<Uuid>;

    fn update_record(&self, table: &str, record_id: Uuid, fields: RecordFields) -> Result<()>;

    /// Submit a batch of writes. With `continue_on_error` the store
    /// attempts every request and reports one outcome per request, in
    /// request order.
    fn execute_batch(
        &self,
        requests: Vec<WriteRequest>,
        continue_on_error: bool,
    ) -> Result<Vec<WriteOutcome>>;
}
