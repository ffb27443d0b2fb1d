use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::data::loader::{ColumnLayout, SheetOptions, SheetSelector};
use crate::export::ExportFormat;

// ---------------------------------------------------------------------------
// Pipeline configuration
// ---------------------------------------------------------------------------

/// One sheet of a dataset: where it lives and how to read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetSource {
    pub path: PathBuf,
    #[serde(flatten)]
    pub options: SheetOptions,
}

/// A named experimental condition, built from one or more sheets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub name: String,
    pub sources: Vec<SheetSource>,
}

/// Overlap diagram output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VennOptions {
    pub output: PathBuf,
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl Default for VennOptions {
    fn default() -> Self {
        VennOptions {
            output: PathBuf::from("drug_gene_overlap_venn.png"),
            title: "Gene Overlap between the three drug-treated conditions".to_string(),
            width: 600,
            height: 600,
        }
    }
}

/// Where and how to persist cleaned and merged tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportOptions {
    pub dir: PathBuf,
    #[serde(default)]
    pub format: ExportFormat,
}

/// Everything a run needs. `Default` is the three drug-treated conditions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub datasets: Vec<DatasetConfig>,
    pub venn: VennOptions,
    pub export: Option<ExportOptions>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let dbt = SheetSource {
            path: PathBuf::from("DBT.xlsx"),
            options: SheetOptions {
                sheet: SheetSelector::Index(0),
                skip_rows: 1,
                columns: ColumnLayout::default(),
            },
        };
        let drug5a = SheetSource {
            path: PathBuf::from("5A.xlsx"),
            options: SheetOptions::default(),
        };
        // R234 keeps its results on sheets 3 and 4, with a wider layout.
        let r234 = |sheet| SheetSource {
            path: PathBuf::from("R234.xlsx"),
            options: SheetOptions {
                sheet: SheetSelector::Index(sheet),
                skip_rows: 1,
                columns: ColumnLayout::new(2, 5, 6),
            },
        };

        PipelineConfig {
            datasets: vec![
                DatasetConfig {
                    name: "DBT".to_string(),
                    sources: vec![dbt],
                },
                DatasetConfig {
                    name: "5A".to_string(),
                    sources: vec![drug5a],
                },
                DatasetConfig {
                    name: "R234".to_string(),
                    sources: vec![r234(2), r234(3)],
                },
            ],
            venn: VennOptions::default(),
            export: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("exactly three datasets are required, found {0}")]
    DatasetCount(usize),

    #[error("dataset '{0}' has no sources")]
    NoSources(String),

    #[error("dataset name '{0}' is used more than once")]
    DuplicateName(String),
}

impl PipelineConfig {
    /// Read a JSON config; absent fields take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: PipelineConfig =
            serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.datasets.len() != 3 {
            return Err(ConfigError::DatasetCount(self.datasets.len()));
        }
        if let Some(ds) = self.datasets.iter().find(|ds| ds.sources.is_empty()) {
            return Err(ConfigError::NoSources(ds.name.clone()));
        }
        // Names become column suffixes in the merged table.
        let mut seen = BTreeSet::new();
        if let Some(ds) = self.datasets.iter().find(|ds| !seen.insert(ds.name.as_str())) {
            return Err(ConfigError::DuplicateName(ds.name.clone()));
        }
        Ok(())
    }

    /// Resolve relative input paths against `dir`.
    pub fn with_data_dir(mut self, dir: &Path) -> Self {
        for source in self.datasets.iter_mut().flat_map(|ds| ds.sources.iter_mut()) {
            if source.path.is_relative() {
                source.path = dir.join(&source.path);
            }
        }
        self
    }
}
