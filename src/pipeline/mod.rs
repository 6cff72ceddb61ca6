//! Sequences the four stages: Collect, Scan, Correlate, Persist.
//!
//! Each stage fully completes before the next begins; the run owns the
//! whole in-memory graph and drops it on exit. A collector failure
//! aborts the run; everything after collection degrades per item into
//! the summary counters instead.

use crate::collector::MetadataCollector;
use crate::config::DictConfig;
use crate::core::Result;
use crate::correlator::correlate;
use crate::model::{AttributeMetadata, FieldModification, WebResource};
use crate::persister::Persister;
use crate::scanner::ScriptScanner;
use crate::service::MetadataService;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::info;

/// What a completed run looked like. A run with skipped or faulted
/// items is still a successful run; these counters are how partial
/// degradation surfaces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub entity_count: usize,
    pub attribute_count: usize,
    pub modification_count: usize,
    pub created: usize,
    pub updated: usize,
    pub skipped: usize,
    pub faulted: usize,
    pub elapsed: Duration,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} entities, {} attributes, {} modifications | created {}, updated {}, skipped {}, faulted {} | {:.2?}",
            self.entity_count,
            self.attribute_count,
            self.modification_count,
            self.created,
            self.updated,
            self.skipped,
            self.faulted,
            self.elapsed
        )
    }
}

pub struct Pipeline<S: MetadataService> {
    service: S,
    config: DictConfig,
}

impl<S: MetadataService> Pipeline<S> {
    pub fn new(service: S, config: DictConfig) -> Self {
        Self { service, config }
    }

    /// Run all four stages for the configured solutions.
    pub fn run(&self) -> Result<RunSummary> {
        self.config.validate()?;
        let started = Instant::now();

        info!(solutions = ?self.config.solutions, "collecting metadata");
        let graph = MetadataCollector::new(&self.service).collect(&self.config.solutions)?;

        info!(web_resources = graph.web_resource_count(), "scanning scripts");
        let scanner = ScriptScanner::new();
        let mut modifications: Vec<FieldModification> = Vec::new();
        let mut web_resources: Vec<WebResource> = Vec::new();
        for solution in graph.solutions.values() {
            for resource in &solution.web_resources {
                let events = scanner.scan(&resource.content, resource.id, &resource.display_name);
                modifications.extend(events);
                web_resources.push(resource.clone());
            }
        }

        info!(modifications = modifications.len(), "correlating");
        let attributes: Vec<AttributeMetadata> = graph
            .solutions
            .values()
            .flat_map(|s| s.entities.iter())
            .flat_map(|e| e.attributes.iter())
            .cloned()
            .collect();
        let correlated = correlate(&attributes, &modifications);

        info!(records = correlated.len(), "persisting");
        let persisted = Persister::new(&self.service, &self.config).persist(&correlated, &web_resources);

        let summary = RunSummary {
            entity_count: graph.entity_count(),
            attribute_count: graph.attribute_count(),
            modification_count: modifications.len(),
            created: persisted.created,
            updated: persisted.updated,
            skipped: persisted.skipped,
            faulted: persisted.faulted,
            elapsed: started.elapsed(),
        };
        info!(%summary, "run complete");
        Ok(summary)
    }

    /// The service, for post-run inspection in tests and the CLI.
    pub fn service(&self) -> &S {
        &self.service
    }

    pub fn config(&self) -> &DictConfig {
        &self.config
    }
}
