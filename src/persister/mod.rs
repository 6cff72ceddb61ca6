//! Idempotent, batched persistence of the correlated graph.
//!
//! Create-vs-update is decided per record by an alternate-key lookup
//! against the store; an in-run seen-key set guards against duplicate
//! facts arriving from collection. No ordering guarantee exists across
//! records — the store's key resolution is the only consistency
//! mechanism.

pub mod batch;
pub mod dependency;

use crate::config::DictConfig;
use crate::core::{RecordFields, Result, Value};
use crate::model::{AttributeKind, CorrelatedAttribute, FieldModification, WebResource};
use crate::scanner::normalize_source;
use crate::service::{MetadataService, WriteOp, WriteRequest};
use batch::BatchWriter;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Outcome counters for one persist stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistSummary {
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub faulted: usize,
}

pub struct Persister<'a, S: MetadataService> {
    service: &'a S,
    config: &'a DictConfig,
}

impl<'a, S: MetadataService> Persister<'a, S> {
    pub fn new(service: &'a S, config: &'a DictConfig) -> Self {
        Self { service, config }
    }

    /// Upsert one field row per correlated attribute, one modification
    /// row per observed modification, and one script row (plus
    /// dependency links) per web resource. All failures are counted in
    /// the summary; none abort the stage.
    pub fn persist(
        &self,
        correlated: &[CorrelatedAttribute],
        web_resources: &[WebResource],
    ) -> PersistSummary {
        let mut summary = PersistSummary::default();
        let mut writer = BatchWriter::new(self.service, self.config.batch_size);
        let mut seen_fields: HashSet<String> = HashSet::new();
        let mut seen_modifications: HashSet<String> = HashSet::new();

        for item in correlated {
            let attribute = &item.attribute;
            if !attribute.has_alternate_key() {
                debug!(
                    column = %attribute.column_logical,
                    "attribute lacks table or schema name, skipping"
                );
                summary.skipped += 1;
                continue;
            }
            let alt_key = attribute.alternate_key();
            if !seen_fields.insert(alt_key.to_lowercase()) {
                debug!(key = %alt_key, "duplicate alternate key within run, skipping");
                summary.skipped += 1;
                continue;
            }

            let op = match self.resolve_op(&self.config.field_table, &alt_key) {
                Ok(op) => op,
                Err(err) => {
                    warn!(key = %alt_key, error = %err, "alternate-key lookup failed");
                    summary.faulted += 1;
                    // Modification rows link back to the field row;
                    // without it they are not attempted this run.
                    summary.skipped += item.modifications.len();
                    continue;
                }
            };
            writer.push(WriteRequest {
                table: self.config.field_table.clone(),
                op,
                fields: self.field_record(item, &alt_key),
            });

            for modification in &item.modifications {
                self.queue_modification(
                    modification,
                    &attribute.table,
                    &alt_key,
                    &mut seen_modifications,
                    &mut writer,
                    &mut summary,
                );
            }
        }

        self.persist_scripts(web_resources, &mut writer, &mut summary);

        writer.flush();
        summary.created = writer.created;
        summary.updated = writer.updated;
        summary.faulted += writer.faulted;
        summary
    }

    fn queue_modification(
        &self,
        modification: &FieldModification,
        table: &str,
        parent_key: &str,
        seen: &mut HashSet<String>,
        writer: &mut BatchWriter<'a, S>,
        summary: &mut PersistSummary,
    ) {
        let mod_key = format!(
            "{}.{}.{}",
            modification.field_name, table, modification.modification_type
        );
        if !seen.insert(mod_key.to_lowercase()) {
            summary.skipped += 1;
            return;
        }
        match self.resolve_op(&self.config.modification_table, &mod_key) {
            Ok(op) => writer.push(WriteRequest {
                table: self.config.modification_table.clone(),
                op,
                fields: self.modification_record(modification, table, parent_key, &mod_key),
            }),
            Err(err) => {
                warn!(key = %mod_key, error = %err, "modification lookup failed");
                summary.faulted += 1;
            }
        }
    }

    fn persist_scripts(
        &self,
        web_resources: &[WebResource],
        writer: &mut BatchWriter<'a, S>,
        summary: &mut PersistSummary,
    ) {
        let mut seen_scripts: HashSet<String> = HashSet::new();
        let mut seen_links: HashSet<String> = HashSet::new();

        for resource in web_resources {
            let name = resource.display_name.trim();
            if name.is_empty() {
                summary.skipped += 1;
                continue;
            }
            if !seen_scripts.insert(name.to_lowercase()) {
                summary.skipped += 1;
                continue;
            }
            match self.resolve_op(&self.config.script_table, name) {
                Ok(op) => {
                    let mut fields = RecordFields::new();
                    fields.insert(self.config.key_field.clone(), Value::from(name));
                    fields.insert("dd_displayname".to_string(), Value::from(name));
                    fields.insert(
                        "dd_content".to_string(),
                        Value::from(normalize_source(&resource.content)),
                    );
                    writer.push(WriteRequest {
                        table: self.config.script_table.clone(),
                        op,
                        fields,
                    });
                }
                Err(err) => {
                    warn!(script = %name, error = %err, "script lookup failed");
                    summary.faulted += 1;
                    continue;
                }
            }

            match dependency::extract_references(&resource.dependency_xml) {
                Ok(references) => {
                    for reference in references {
                        let link_key = format!("{}.{}", name, reference);
                        if !seen_links.insert(link_key.to_lowercase()) {
                            summary.skipped += 1;
                            continue;
                        }
                        match self.resolve_op(&self.config.dependency_table, &link_key) {
                            Ok(op) => {
                                let mut fields = RecordFields::new();
                                fields
                                    .insert(self.config.key_field.clone(), Value::from(link_key.as_str()));
                                fields.insert("dd_webresourcename".to_string(), Value::from(name));
                                fields.insert(
                                    "dd_referencename".to_string(),
                                    Value::from(reference.as_str()),
                                );
                                writer.push(WriteRequest {
                                    table: self.config.dependency_table.clone(),
                                    op,
                                    fields,
                                });
                            }
                            Err(err) => {
                                warn!(key = %link_key, error = %err, "dependency lookup failed");
                                summary.faulted += 1;
                            }
                        }
                    }
                }
                Err(err) => {
                    warn!(script = %name, error = %err, "dependency XML unreadable");
                    summary.faulted += 1;
                }
            }
        }
    }

    fn resolve_op(&self, table: &str, key: &str) -> Result<WriteOp> {
        match self
            .service
            .find_record_by_alternate_key(table, &self.config.key_field, key)?
        {
            Some(id) => Ok(WriteOp::Update(id)),
            None => Ok(WriteOp::Create),
        }
    }

    fn field_record(&self, item: &CorrelatedAttribute, alt_key: &str) -> RecordFields {
        let attribute = &item.attribute;
        let mut fields = RecordFields::new();
        fields.insert(self.config.key_field.clone(), Value::from(alt_key));
        fields.insert("dd_table".to_string(), Value::from(attribute.table.as_str()));
        fields.insert(
            "dd_columnlogical".to_string(),
            Value::from(attribute.column_logical.as_str()),
        );
        fields.insert(
            "dd_columnschema".to_string(),
            Value::from(attribute.column_schema.as_str()),
        );
        fields.insert(
            "dd_datatype".to_string(),
            Value::from(attribute.data_type.as_str()),
        );
        fields.insert(
            "dd_description".to_string(),
            Value::from(attribute.description.as_str()),
        );
        fields.insert(
            "dd_auditenabled".to_string(),
            Value::from(attribute.audit_enabled),
        );
        fields.insert("dd_iscustom".to_string(), Value::from(attribute.is_custom));
        fields.insert(
            "dd_createdon".to_string(),
            Value::from(attribute.created_on.map(|d| d.to_rfc3339())),
        );
        fields.insert(
            "dd_modifiedon".to_string(),
            Value::from(attribute.modified_on.map(|d| d.to_rfc3339())),
        );

        match &attribute.kind {
            AttributeKind::Plain => {}
            AttributeKind::Integer {
                min_value,
                max_value,
            } => {
                fields.insert("dd_minvalue".to_string(), Value::from(*min_value));
                fields.insert("dd_maxvalue".to_string(), Value::from(*max_value));
            }
            AttributeKind::Decimal {
                min_value,
                max_value,
                precision,
            } => {
                fields.insert("dd_minvalue".to_string(), Value::from(*min_value));
                fields.insert("dd_maxvalue".to_string(), Value::from(*max_value));
                fields.insert("dd_precision".to_string(), Value::from(*precision));
            }
            AttributeKind::Text { max_length } => {
                fields.insert("dd_maxlength".to_string(), Value::from(*max_length));
            }
            AttributeKind::Formula { formula } => {
                fields.insert("dd_formula".to_string(), Value::from(formula.as_str()));
            }
        }

        fields.insert(
            "dd_ishiddenbyscript".to_string(),
            Value::from(item.is_hidden_by_script()),
        );
        fields.insert(
            "dd_isrequiredbyscript".to_string(),
            Value::from(item.is_required_by_script()),
        );
        fields.insert(
            "dd_hasdefaultvaluebyscript".to_string(),
            Value::from(item.has_default_value_by_script()),
        );
        fields.insert(
            "dd_scriptdefaultvalue".to_string(),
            Value::from(item.script_default_value()),
        );
        fields.insert(
            "dd_modifyingwebresources".to_string(),
            Value::from(item.modifying_web_resources().join("; ")),
        );
        fields
    }

    fn modification_record(
        &self,
        modification: &FieldModification,
        table: &str,
        parent_key: &str,
        mod_key: &str,
    ) -> RecordFields {
        let mut fields = RecordFields::new();
        fields.insert(self.config.key_field.clone(), Value::from(mod_key));
        fields.insert(
            "dd_fieldname".to_string(),
            Value::from(modification.field_name.as_str()),
        );
        fields.insert("dd_table".to_string(), Value::from(table));
        fields.insert(
            "dd_modificationtype".to_string(),
            Value::from(modification.modification_type.as_str()),
        );
        fields.insert(
            "dd_modificationvalue".to_string(),
            Value::from(modification.modification_value.as_str()),
        );
        fields.insert(
            "dd_webresourcename".to_string(),
            Value::from(modification.source_web_resource_name.as_str()),
        );
        fields.insert(
            "dd_javascriptcode".to_string(),
            Value::from(modification.javascript_code.as_str()),
        );
        fields.insert(
            "dd_linenumber".to_string(),
            Value::from(modification.line_number as i64),
        );
        fields.insert(
            "dd_parsedon".to_string(),
            Value::from(modification.parsed_on.to_rfc3339()),
        );
        fields.insert(
            "dd_notes".to_string(),
            Value::from(modification.notes.as_deref()),
        );
        fields.insert("dd_parentkey".to_string(), Value::from(parent_key));
        fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ModificationType;
    use crate::model::AttributeMetadata;
    use crate::service::memory::InMemoryService;
    use chrono::Utc;
    use uuid::Uuid;

    fn attribute(table: &str, logical: &str, schema: &str) -> AttributeMetadata {
        AttributeMetadata {
            table: table.to_string(),
            column_logical: logical.to_string(),
            column_schema: schema.to_string(),
            data_type: "String".to_string(),
            kind: AttributeKind::Plain,
            description: String::new(),
            audit_enabled: false,
            is_custom: false,
            created_on: None,
            modified_on: None,
        }
    }

    fn correlated(table: &str, logical: &str, schema: &str) -> CorrelatedAttribute {
        CorrelatedAttribute::new(attribute(table, logical, schema))
    }

    fn modification(field: &str, kind: ModificationType, value: &str) -> FieldModification {
        FieldModification {
            field_name: field.to_string(),
            modification_type: kind,
            modification_value: value.to_string(),
            source_web_resource_id: Uuid::new_v4(),
            source_web_resource_name: "form.js".to_string(),
            javascript_code: format!("stub for {}", field),
            line_number: 1,
            parsed_on: Utc::now(),
            notes: None,
        }
    }

    #[test]
    fn test_missing_key_is_skipped_not_faulted() {
        let service = InMemoryService::empty();
        let config = DictConfig::default();
        let persister = Persister::new(&service, &config);

        let summary = persister.persist(&[correlated("", "name", "Name")], &[]);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.faulted, 0);
        assert_eq!(summary.created, 0);
        assert_eq!(service.record_count(&config.field_table), 0);
    }

    #[test]
    fn test_duplicate_alternate_key_written_once() {
        let service = InMemoryService::empty();
        let config = DictConfig::default();
        let persister = Persister::new(&service, &config);

        let input = vec![
            correlated("account", "name", "Name"),
            correlated("account", "name", "Name"),
        ];
        let summary = persister.persist(&input, &[]);
        assert_eq!(summary.created, 1);
        assert_eq!(summary.skipped, 1);
        assert_eq!(service.record_count(&config.field_table), 1);
    }

    #[test]
    fn test_persist_twice_updates_instead_of_duplicating() {
        let service = InMemoryService::empty();
        let config = DictConfig::default();
        let persister = Persister::new(&service, &config);

        let mut item = correlated("account", "telephone1", "Telephone1");
        item.modifications.push(modification(
            "telephone1",
            ModificationType::DisabledState,
            "true",
        ));
        let input = vec![item];

        let first = persister.persist(&input, &[]);
        assert_eq!(first.created, 2);
        assert_eq!(first.updated, 0);

        let second = persister.persist(&input, &[]);
        assert_eq!(second.created, 0);
        assert_eq!(second.updated, 2);
        assert_eq!(service.record_count(&config.field_table), 1);
        assert_eq!(service.record_count(&config.modification_table), 1);
    }

    #[test]
    fn test_lookup_failure_is_a_per_record_fault() {
        let service = InMemoryService::empty();
        service.fail_lookups();
        let config = DictConfig::default();
        let persister = Persister::new(&service, &config);

        let mut item = correlated("account", "name", "Name");
        item.modifications
            .push(modification("name", ModificationType::Visibility, "false"));
        item.modifications
            .push(modification("name", ModificationType::DefaultValue, "1"));

        let summary = persister.persist(&[item], &[]);
        assert_eq!(summary.faulted, 1);
        // The field row carries its modification rows; both are
        // accounted for when the lookup fails.
        assert_eq!(summary.skipped, 2);
        assert_eq!(summary.created, 0);
        assert_eq!(service.record_count(&config.field_table), 0);
        assert_eq!(service.record_count(&config.modification_table), 0);
    }

    #[test]
    fn test_flattened_flags_on_field_row() {
        let service = InMemoryService::empty();
        let config = DictConfig::default();
        let persister = Persister::new(&service, &config);

        let mut item = correlated("account", "name", "Name");
        item.modifications.push(modification(
            "name",
            ModificationType::Visibility,
            "false",
        ));
        item.modifications.push(modification(
            "name",
            ModificationType::DefaultValue,
            "\"ACME\"",
        ));
        persister.persist(&[item], &[]);

        let records = service.records(&config.field_table);
        assert_eq!(records.len(), 1);
        let (_, fields) = &records[0];
        assert_eq!(fields.get("dd_ishiddenbyscript"), Some(&Value::Boolean(true)));
        assert_eq!(
            fields.get("dd_hasdefaultvaluebyscript"),
            Some(&Value::Boolean(true))
        );
        assert_eq!(
            fields.get("dd_scriptdefaultvalue"),
            Some(&Value::Text("\"ACME\"".to_string()))
        );
        assert_eq!(
            fields.get("dd_modifyingwebresources"),
            Some(&Value::Text("form.js".to_string()))
        );
    }

    #[test]
    fn test_script_and_dependency_rows() {
        let service = InMemoryService::empty();
        let config = DictConfig::default();
        let persister = Persister::new(&service, &config);

        let resource = WebResource {
            id: Uuid::new_v4(),
            display_name: "form.js".to_string(),
            content: "formContext.getControl('name').setVisible(false);".to_string(),
            dependency_xml: r#"<Dependencies><Dep entityName="account" attributeName="name"/></Dependencies>"#
                .to_string(),
        };
        let summary = persister.persist(&[], &[resource]);

        assert_eq!(service.record_count(&config.script_table), 1);
        assert_eq!(service.record_count(&config.dependency_table), 2);
        assert_eq!(summary.faulted, 0);
    }

    #[test]
    fn test_malformed_dependency_xml_counts_a_fault() {
        let service = InMemoryService::empty();
        let config = DictConfig::default();
        let persister = Persister::new(&service, &config);

        let resource = WebResource {
            id: Uuid::new_v4(),
            display_name: "broken.js".to_string(),
            content: String::new(),
            dependency_xml: "not xml at all".to_string(),
        };
        let summary = persister.persist(&[], &[resource]);

        // Script row still lands; only the dependency extraction faults.
        assert_eq!(service.record_count(&config.script_table), 1);
        assert_eq!(summary.faulted, 1);
    }
}
