mod annotate;
mod color;
mod config;
mod data;
mod export;
mod overlap;
mod pipeline;
mod plot;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::info;

use config::{ExportOptions, PipelineConfig};
use export::ExportFormat;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// JSON pipeline config (defaults to the DBT / 5A / R234 layouts)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory that relative input paths are resolved against
    #[arg(short, long)]
    data_dir: Option<PathBuf>,

    /// Where to write the overlap diagram (PNG)
    #[arg(long)]
    venn_output: Option<PathBuf>,

    /// Save cleaned datasets and the common-gene table here
    #[arg(short, long)]
    export_dir: Option<PathBuf>,

    /// Table format for --export-dir
    #[arg(long, value_enum)]
    export_format: Option<ExportFormat>,

    /// Print the common-gene table
    #[arg(long)]
    show_common: bool,
}

/// Merge command-line overrides into the file or default config.
fn build_config(args: &Args) -> Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_file(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(dir) = &args.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(output) = &args.venn_output {
        config.venn.output = output.clone();
    }

    if let Some(dir) = &args.export_dir {
        let format = args
            .export_format
            .or(config.export.as_ref().map(|e| e.format))
            .unwrap_or_default();
        config.export = Some(ExportOptions {
            dir: dir.clone(),
            format,
        });
    } else if let (Some(format), Some(existing)) = (args.export_format, config.export.as_mut()) {
        existing.format = format;
    }

    Ok(config)
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();
    let config = build_config(&args)?;

    let report = pipeline::run(&config)?;

    if args.show_common {
        println!("{}", export::pretty_table(&report.analysis.annotated)?);
    }
    info!("Overlap diagram: {}", report.venn_path.display());
    for path in &report.exported {
        info!("Exported {}", path.display());
    }
    Ok(())
}
