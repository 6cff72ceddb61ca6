use crate::config::DictConfig;
use crate::pipeline::Pipeline;
use crate::service::memory::{Fixture, InMemoryService};
use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;

/// Build a data dictionary from a metadata snapshot.
///
/// Runs the full Collect -> Scan -> Correlate -> Persist pipeline
/// against a JSON fixture of the tenant metadata and prints the run
/// summary. Exit status is non-zero only on fatal errors; skipped and
/// faulted items are reported in the summary.
#[derive(Debug, Parser)]
#[command(name = "datadict", version, about)]
pub struct Cli {
    /// Solution unique name to collect; repeat for several.
    #[arg(short, long = "solution", required = true)]
    pub solutions: Vec<String>,

    /// Path to the metadata snapshot JSON.
    #[arg(short, long)]
    pub fixture: PathBuf,

    /// Maximum records per write batch.
    #[arg(long, default_value_t = 1000)]
    pub batch_size: usize,
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let fixture = Fixture::from_path(&cli.fixture)
        .with_context(|| format!("loading fixture {}", cli.fixture.display()))?;
    let service = InMemoryService::new(fixture);

    let config = DictConfig::new()
        .solutions(cli.solutions)
        .batch_size(cli.batch_size);

    let pipeline = Pipeline::new(service, config);
    let summary = pipeline.run().context("pipeline run failed")?;
    println!("{}", summary);
    Ok(())
}
