//! In-memory implementation of [`MetadataService`].
//!
//! Backs the test suites and the CLI's offline mode, where a JSON
//! snapshot of the tenant metadata stands in for the live service.

use super::{EntityFilter, MetadataService, WriteOp, WriteOutcome, WriteRequest};
use crate::core::{DictError, RecordFields, Result, Value};
use crate::model::{EntityMetadata, Solution, SolutionComponent, WebResource};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;
use uuid::Uuid;

/// Serializable snapshot of the read side of the service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(default)]
    pub solutions: Vec<FixtureSolution>,
    #[serde(default)]
    pub entities: Vec<EntityMetadata>,
    #[serde(default)]
    pub web_resources: Vec<WebResource>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FixtureSolution {
    #[serde(flatten)]
    pub solution: Solution,
    #[serde(default)]
    pub components: Vec<SolutionComponent>,
}

impl Fixture {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }
}

/// HashMap-backed service double with a mutable record store.
pub struct InMemoryService {
    solutions: Vec<FixtureSolution>,
    entities: Vec<EntityMetadata>,
    web_resources: HashMap<Uuid, WebResource>,
    /// table name -> record id -> fields
    records: RwLock<HashMap<String, HashMap<Uuid, RecordFields>>>,
    /// Any write carrying one of these text values fails; lets tests
    /// exercise partial-batch faults.
    reject_values: RwLock<HashSet<String>>,
    /// Failure toggles standing in for a disconnected or flaky service.
    fail_reads: AtomicBool,
    fail_lookups: AtomicBool,
    fail_batches: AtomicBool,
}

impl InMemoryService {
    pub fn new(fixture: Fixture) -> Self {
        let web_resources = fixture
            .web_resources
            .into_iter()
            .map(|wr| (wr.id, wr))
            .collect();
        Self {
            solutions: fixture.solutions,
            entities: fixture.entities,
            web_resources,
            records: RwLock::new(HashMap::new()),
            reject_values: RwLock::new(HashSet::new()),
            fail_reads: AtomicBool::new(false),
            fail_lookups: AtomicBool::new(false),
            fail_batches: AtomicBool::new(false),
        }
    }

    pub fn empty() -> Self {
        Self::new(Fixture::default())
    }

    /// Make every write that carries this exact text value fail.
    pub fn reject_writes_containing(&self, value: &str) {
        if let Ok(mut set) = self.reject_values.write() {
            set.insert(value.to_string());
        }
    }

    /// Make every read query fail from here on.
    pub fn fail_reads(&self) {
        self.fail_reads.store(true, Ordering::SeqCst);
    }

    /// Make every alternate-key lookup fail from here on.
    pub fn fail_lookups(&self) {
        self.fail_lookups.store(true, Ordering::SeqCst);
    }

    /// Make every batch submission fail at the transport level.
    pub fn fail_batches(&self) {
        self.fail_batches.store(true, Ordering::SeqCst);
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(DictError::Service(
                "metadata service unavailable".to_string(),
            ));
        }
        Ok(())
    }

    pub fn record_count(&self, table: &str) -> usize {
        self.records
            .read()
            .map(|tables| tables.get(table).map_or(0, |t| t.len()))
            .unwrap_or(0)
    }

    /// Snapshot of a table's records, for assertions.
    pub fn records(&self, table: &str) -> Vec<(Uuid, RecordFields)> {
        self.records
            .read()
            .map(|tables| {
                tables
                    .get(table)
                    .map(|t| t.iter().map(|(id, f)| (*id, f.clone())).collect())
                    .unwrap_or_default()
            })
            .unwrap_or_default()
    }

    fn is_rejected(&self, fields: &RecordFields) -> bool {
        match self.reject_values.read() {
            Ok(set) => fields
                .values()
                .any(|v| matches!(v, Value::Text(s) if set.contains(s))),
            Err(_) => false,
        }
    }

    fn apply(&self, request: &WriteRequest) -> Result<WriteOutcome> {
        if self.is_rejected(&request.fields) {
            return Ok(WriteOutcome::Failed {
                message: format!("record rejected by store fixture in '{}'", request.table),
            });
        }
        match request.op {
            WriteOp::Create => {
                let id = self.create_record(&request.table, request.fields.clone())?;
                Ok(WriteOutcome::Created(id))
            }
            WriteOp::Update(id) => {
                self.update_record(&request.table, id, request.fields.clone())?;
                Ok(WriteOutcome::Updated(id))
            }
        }
    }
}

impl MetadataService for InMemoryService {
    fn find_solutions_by_unique_name(&self, names: &[String]) -> Result<Vec<Solution>> {
        self.check_reads()?;
        Ok(self
            .solutions
            .iter()
            .filter(|s| names.iter().any(|n| n == &s.solution.unique_name))
            .map(|s| s.solution.clone())
            .collect())
    }

    fn list_components(&self, solution_id: Uuid) -> Result<Vec<SolutionComponent>> {
        self.check_reads()?;
        Ok(self
            .solutions
            .iter()
            .find(|s| s.solution.id == solution_id)
            .map(|s| s.components.clone())
            .unwrap_or_default())
    }

    fn list_entities(&self, filter: &EntityFilter) -> Result<Vec<EntityMetadata>> {
        self.check_reads()?;
        let mut entities: Vec<EntityMetadata> = self
            .entities
            .iter()
            .filter(|e| match &filter.logical_names {
                Some(names) => names.iter().any(|n| n.eq_ignore_ascii_case(&e.logical_name)),
                None => true,
            })
            .cloned()
            .collect();
        if !filter.include_attributes {
            for entity in &mut entities {
                entity.attributes.clear();
            }
        }
        Ok(entities)
    }

    fn get_web_resource(&self, object_id: Uuid) -> Result<Option<WebResource>> {
        self.check_reads()?;
        Ok(self.web_resources.get(&object_id).cloned())
    }

    fn find_record_by_alternate_key(
        &self,
        table: &str,
        key_field: &str,
        key_value: &str,
    ) -> Result<Option<Uuid>> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(DictError::Store(
                "alternate-key lookup unavailable".to_string(),
            ));
        }
        let tables = self.records.read()?;
        let Some(records) = tables.get(table) else {
            return Ok(None);
        };
        for (id, fields) in records {
            if let Some(Value::Text(stored)) = fields.get(key_field) {
                if stored.eq_ignore_ascii_case(key_value) {
                    return Ok(Some(*id));
                }
            }
        }
        Ok(None)
    }

    fn create_record(&self, table: &str, fields: RecordFields) -> Result<Uuid> {
        let id = Uuid::new_v4();
        let mut tables = self.records.write()?;
        tables.entry(table.to_string()).or_default().insert(id, fields);
        Ok(id)
    }

    fn update_record(&self, table: &str, record_id: Uuid, fields: RecordFields) -> Result<()> {
        let mut tables = self.records.write()?;
        let records = tables
            .get_mut(table)
            .ok_or_else(|| DictError::Store(format!("table '{}' not found", table)))?;
        let record = records
            .get_mut(&record_id)
            .ok_or_else(|| DictError::Store(format!("record {} not found in '{}'", record_id, table)))?;
        for (name, value) in fields {
            record.insert(name, value);
        }
        Ok(())
    }

    fn execute_batch(
        &self,
        requests: Vec<WriteRequest>,
        continue_on_error: bool,
    ) -> Result<Vec<WriteOutcome>> {
        if self.fail_batches.load(Ordering::SeqCst) {
            return Err(DictError::Store(
                "batch endpoint unavailable".to_string(),
            ));
        }
        let mut outcomes = Vec::with_capacity(requests.len());
        for request in &requests {
            let outcome = match self.apply(request) {
                Ok(outcome) => outcome,
                Err(err) => WriteOutcome::Failed {
                    message: err.to_string(),
                },
            };
            let failed = matches!(outcome, WriteOutcome::Failed { .. });
            outcomes.push(outcome);
            if failed && !continue_on_error {
                break;
            }
        }
        Ok(outcomes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_fields(key: &str) -> RecordFields {
        let mut fields = RecordFields::new();
        fields.insert("dd_alternatekey".to_string(), Value::from(key));
        fields
    }

    #[test]
    fn test_alternate_key_lookup_is_case_insensitive() {
        let service = InMemoryService::empty();
        let id = service
            .create_record("datadict_field", make_fields("account.Name"))
            .unwrap();

        let found = service
            .find_record_by_alternate_key("datadict_field", "dd_alternatekey", "ACCOUNT.name")
            .unwrap();
        assert_eq!(found, Some(id));

        let missing = service
            .find_record_by_alternate_key("datadict_field", "dd_alternatekey", "contact.Name")
            .unwrap();
        assert_eq!(missing, None);
    }

    #[test]
    fn test_update_merges_fields() {
        let service = InMemoryService::empty();
        let id = service
            .create_record("datadict_field", make_fields("account.Name"))
            .unwrap();

        let mut patch = RecordFields::new();
        patch.insert("dd_ishiddenbyscript".to_string(), Value::from(true));
        service.update_record("datadict_field", id, patch).unwrap();

        let records = service.records("datadict_field");
        assert_eq!(records.len(), 1);
        let (_, fields) = &records[0];
        assert_eq!(fields.get("dd_ishiddenbyscript"), Some(&Value::Boolean(true)));
        assert_eq!(
            fields.get("dd_alternatekey"),
            Some(&Value::Text("account.Name".to_string()))
        );
    }

    #[test]
    fn test_batch_continues_past_rejected_record() {
        let service = InMemoryService::empty();
        service.reject_writes_containing("poison");

        let requests = vec![
            WriteRequest {
                table: "datadict_field".to_string(),
                op: WriteOp::Create,
                fields: make_fields("ok.One"),
            },
            WriteRequest {
                table: "datadict_field".to_string(),
                op: WriteOp::Create,
                fields: make_fields("poison"),
            },
            WriteRequest {
                table: "datadict_field".to_string(),
                op: WriteOp::Create,
                fields: make_fields("ok.Two"),
            },
        ];

        let outcomes = service.execute_batch(requests, true).unwrap();
        assert_eq!(outcomes.len(), 3);
        assert!(matches!(outcomes[0], WriteOutcome::Created(_)));
        assert!(matches!(outcomes[1], WriteOutcome::Failed { .. }));
        assert!(matches!(outcomes[2], WriteOutcome::Created(_)));
        assert_eq!(service.record_count("datadict_field"), 2);
    }
}
