//! Builds the in-memory solution graph from the remote service.
//!
//! This stage is not resilient: a partial schema is worse than no
//! schema, so any query failure is logged and re-raised, aborting the
//! run before correlation can see an incomplete attribute set.

use crate::core::{ComponentType, DictError, Result};
use crate::model::{EntityMetadata, Solution, SolutionComponent, WebResource};
use crate::service::{EntityFilter, MetadataService};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, error, info};
use uuid::Uuid;

/// Everything collected for one solution.
#[derive(Debug, Clone)]
pub struct SolutionGraph {
    pub solution: Solution,
    pub components: Vec<SolutionComponent>,
    /// Entities in scope, ascending by logical name, attributes nested.
    pub entities: Vec<EntityMetadata>,
    pub web_resources: Vec<WebResource>,
}

/// Result of the collect stage, keyed by solution unique name and owned
/// by the single pipeline run.
#[derive(Debug, Clone, Default)]
pub struct CollectionGraph {
    pub solutions: BTreeMap<String, SolutionGraph>,
}

impl CollectionGraph {
    pub fn entity_count(&self) -> usize {
        self.solutions.values().map(|s| s.entities.len()).sum()
    }

    pub fn attribute_count(&self) -> usize {
        self.solutions
            .values()
            .flat_map(|s| s.entities.iter())
            .map(|e| e.attributes.len())
            .sum()
    }

    pub fn web_resource_count(&self) -> usize {
        self.solutions.values().map(|s| s.web_resources.len()).sum()
    }
}

pub struct MetadataCollector<'a, S: MetadataService> {
    service: &'a S,
}

impl<'a, S: MetadataService> MetadataCollector<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self { service }
    }

    /// Collect the full graph for the named solutions. Names with no
    /// matching solution are omitted; the caller sees a smaller result
    /// set, not an error.
    pub fn collect(&self, solution_names: &[String]) -> Result<CollectionGraph> {
        let solutions = self
            .service
            .find_solutions_by_unique_name(solution_names)
            .map_err(|e| self.fatal("(all)", "solution lookup", e))?;

        for requested in solution_names {
            if !solutions.iter().any(|s| &s.unique_name == requested) {
                debug!(solution = %requested, "solution not found, omitting");
            }
        }

        // One full-schema pass shared by every solution; entity
        // components then select the subset each solution sees.
        let all_entities = self
            .service
            .list_entities(&EntityFilter::all_with_attributes())
            .map_err(|e| self.fatal("(all)", "full schema enumeration", e))?;

        let mut graph = CollectionGraph::default();
        for solution in solutions {
            let collected = self.collect_solution(&solution, &all_entities)?;
            info!(
                solution = %solution.unique_name,
                entities = collected.entities.len(),
                web_resources = collected.web_resources.len(),
                "solution collected"
            );
            graph
                .solutions
                .insert(solution.unique_name.clone(), collected);
        }
        Ok(graph)
    }

    fn collect_solution(
        &self,
        solution: &Solution,
        all_entities: &[EntityMetadata],
    ) -> Result<SolutionGraph> {
        let components = self
            .service
            .list_components(solution.id)
            .map_err(|e| self.fatal(&solution.unique_name, "component listing", e))?;

        let entity_ids: HashSet<Uuid> = components
            .iter()
            .filter(|c| c.component_type == ComponentType::Entity)
            .map(|c| c.object_id)
            .collect();

        // Attribute components are superseded by the full enumeration
        // below; their presence is only worth a trace.
        let attribute_components = components
            .iter()
            .filter(|c| c.component_type == ComponentType::Attribute)
            .count();
        debug!(
            solution = %solution.unique_name,
            entity_components = entity_ids.len(),
            attribute_components,
            "components partitioned"
        );

        // Allowed set: logical names of entities referenced as
        // components. Filtering the full enumeration against it keeps
        // attributes that ride in with an entity but were never listed
        // as attribute components themselves.
        let allowed: HashSet<String> = all_entities
            .iter()
            .filter(|e| entity_ids.contains(&e.metadata_id))
            .map(|e| e.logical_name.to_lowercase())
            .collect();

        let mut entities: Vec<EntityMetadata> = all_entities
            .iter()
            .filter(|e| allowed.contains(&e.logical_name.to_lowercase()))
            .cloned()
            .collect();
        entities.sort_by(|a, b| a.logical_name.cmp(&b.logical_name));

        let mut web_resources = Vec::new();
        for component in &components {
            if component.component_type != ComponentType::WebResource {
                continue;
            }
            let resource = self
                .service
                .get_web_resource(component.object_id)
                .map_err(|e| self.fatal(&solution.unique_name, "web resource retrieval", e))?;
            match resource {
                Some(wr) => web_resources.push(wr),
                None => debug!(
                    solution = %solution.unique_name,
                    object_id = %component.object_id,
                    "web resource component has no content, skipping"
                ),
            }
        }

        Ok(SolutionGraph {
            solution: solution.clone(),
            components,
            entities,
            web_resources,
        })
    }

    fn fatal(&self, solution: &str, stage: &str, err: DictError) -> DictError {
        error!(solution, stage, error = %err, "collection query failed, aborting run");
        DictError::in_collection(solution, stage, err)
    }
}
