use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{debug, info, warn};

use crate::annotate::annotate;
use crate::config::{DatasetConfig, PipelineConfig};
use crate::data::loader::load_and_clean;
use crate::data::model::{AnnotatedTable, GeneTable};
use crate::export::export_all;
use crate::overlap::{intersect3, OverlapCounts};
use crate::plot::render_venn;

// ---------------------------------------------------------------------------
// Results of one run
// ---------------------------------------------------------------------------

/// Set arithmetic and the merged table for three cleaned datasets.
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Genes present in all three datasets, sorted.
    pub common_genes: Vec<String>,
    pub counts: OverlapCounts,
    /// Common genes with every source's values joined in.
    pub annotated: AnnotatedTable,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct RunReport {
    pub analysis: Analysis,
    pub venn_path: PathBuf,
    pub exported: Vec<PathBuf>,
}

// ---------------------------------------------------------------------------
// Pipeline stages
// ---------------------------------------------------------------------------

/// Load and clean every sheet of a dataset, concatenated in source order.
pub fn load_dataset(dataset: &DatasetConfig) -> Result<GeneTable> {
    let mut parts = Vec::with_capacity(dataset.sources.len());
    for source in &dataset.sources {
        let part = load_and_clean(&source.path, &dataset.name, &source.options).with_context(
            || {
                format!(
                    "loading {} sheet {} from {}",
                    dataset.name,
                    source.options.sheet,
                    source.path.display()
                )
            },
        )?;
        if part.is_empty() {
            warn!(
                "{}: no gene rows in sheet {} of {}",
                dataset.name,
                source.options.sheet,
                source.path.display()
            );
        } else {
            debug!("{}: {} rows from {}", dataset.name, part.len(), source.path.display());
        }
        parts.push(part);
    }
    Ok(GeneTable::concat(dataset.name.clone(), parts))
}

/// Load the three configured datasets.
pub fn load_datasets(config: &PipelineConfig) -> Result<[GeneTable; 3]> {
    config.validate()?;
    let [a, b, c] = [0, 1, 2].map(|i| &config.datasets[i]);
    Ok([load_dataset(a)?, load_dataset(b)?, load_dataset(c)?])
}

/// Intersect the three gene sets and join the common genes back to each source.
pub fn analyze(datasets: &[GeneTable; 3]) -> Analysis {
    let [a, b, c] = datasets;
    let sets = [a.gene_set(), b.gene_set(), c.gene_set()];

    let common = intersect3(&sets[0], &sets[1], &sets[2]);
    let counts = OverlapCounts::from_sets(&sets[0], &sets[1], &sets[2]);
    let common_genes: Vec<String> = common.iter().map(|g| g.to_string()).collect();
    let annotated = annotate(&common_genes, &[a, b, c]);
    if annotated.is_empty() {
        warn!("No gene is shared by {}, {} and {}", a.name, b.name, c.name);
    }

    Analysis {
        common_genes,
        counts,
        annotated,
    }
}

/// Run every stage: load, intersect, draw, and export when configured.
/// Row counts are printed as soon as each stage has them.
pub fn run(config: &PipelineConfig) -> Result<RunReport> {
    info!("Loading {} datasets", config.datasets.len());
    let datasets = load_datasets(config)?;
    for dataset in &datasets {
        println!("{dataset}");
    }

    let analysis = analyze(&datasets);
    println!("Common genes: {}", analysis.common_genes.len());
    info!(
        "{} common genes, {} distinct overall",
        analysis.common_genes.len(),
        analysis.counts.union()
    );

    let labels = [0, 1, 2].map(|i| datasets[i].name.as_str());
    render_venn(&config.venn.output, labels, &analysis.counts, &config.venn)?;

    let exported = match &config.export {
        Some(options) => export_all(options, &datasets, &analysis.annotated)?,
        None => Vec::new(),
    };

    Ok(RunReport {
        venn_path: config.venn.output.clone(),
        analysis,
        exported,
    })
}
