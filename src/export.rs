use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use log::info;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use rust_xlsxwriter::{Format, Workbook};
use serde::{Deserialize, Serialize};

use crate::config::ExportOptions;
use crate::data::model::{AnnotatedTable, GeneTable, GENE_COLUMN};

/// File stem of the merged common-gene table.
pub const COMMON_GENES_STEM: &str = "Cell_lines_common_genes";

/// Supported table formats
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Excel workbook, one sheet, header row
    #[default]
    Xlsx,
    /// Comma-separated text, empty field for missing values
    Csv,
    /// Apache Parquet (for Python, R, Spark)
    Parquet,
}

impl ExportFormat {
    /// Get file extension for this format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Parquet => "parquet",
        }
    }
}

// ---------------------------------------------------------------------------
// Batch export of a whole run
// ---------------------------------------------------------------------------

/// Write every cleaned dataset as `<name>_cleaned.<ext>` and the merged table
/// as `Cell_lines_common_genes.<ext>` under `options.dir`.
pub fn export_all(
    options: &ExportOptions,
    datasets: &[GeneTable],
    common: &AnnotatedTable,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(&options.dir)
        .with_context(|| format!("creating export directory {}", options.dir.display()))?;

    let ext = options.format.extension();
    let mut written = Vec::with_capacity(datasets.len() + 1);

    for dataset in datasets {
        let path = options.dir.join(format!("{}_cleaned.{ext}", dataset.name));
        write_table(&path, &AnnotatedTable::from(dataset), options.format)?;
        written.push(path);
    }

    let path = options.dir.join(format!("{COMMON_GENES_STEM}.{ext}"));
    write_table(&path, common, options.format)?;
    written.push(path);

    Ok(written)
}

/// Write one table in the given format.
pub fn write_table(path: &Path, table: &AnnotatedTable, format: ExportFormat) -> Result<()> {
    match format {
        ExportFormat::Xlsx => write_xlsx(path, table),
        ExportFormat::Csv => write_csv(path, table),
        ExportFormat::Parquet => write_parquet(path, table),
    }
    .with_context(|| format!("exporting {}", path.display()))?;

    info!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

fn header(table: &AnnotatedTable) -> impl Iterator<Item = &str> {
    std::iter::once(GENE_COLUMN).chain(table.columns.iter().map(String::as_str))
}

// ---------------------------------------------------------------------------
// CSV
// ---------------------------------------------------------------------------

fn write_csv(path: &Path, table: &AnnotatedTable) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV file")?;
    writer.write_record(header(table))?;
    for row in &table.rows {
        let mut record = Vec::with_capacity(row.values.len() + 1);
        record.push(row.gene.clone());
        record.extend(
            row.values
                .iter()
                .map(|v| v.map(|x| x.to_string()).unwrap_or_default()),
        );
        writer.write_record(&record)?;
    }
    writer.flush().context("flushing CSV file")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Excel
// ---------------------------------------------------------------------------

fn write_xlsx(path: &Path, table: &AnnotatedTable) -> Result<()> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    let worksheet = workbook.add_worksheet();

    for (col, name) in header(table).enumerate() {
        worksheet.write_string_with_format(0, col as u16, name, &header_format)?;
    }
    for (i, row) in table.rows.iter().enumerate() {
        let r = i as u32 + 1;
        worksheet.write_string(r, 0, &row.gene)?;
        for (j, value) in row.values.iter().enumerate() {
            if let Some(v) = value {
                worksheet.write_number(r, j as u16 + 1, *v)?;
            }
        }
    }

    workbook.save(path).context("saving workbook")?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Arrow / Parquet
// ---------------------------------------------------------------------------

/// Convert a table to one Arrow batch: `Gene` as Utf8, values as nullable Float64.
pub fn to_record_batch(table: &AnnotatedTable) -> Result<RecordBatch> {
    let mut fields = vec![Field::new(GENE_COLUMN, DataType::Utf8, false)];
    fields.extend(
        table
            .columns
            .iter()
            .map(|name| Field::new(name, DataType::Float64, true)),
    );
    let schema = Arc::new(Schema::new(fields));

    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(table.columns.len() + 1);
    arrays.push(Arc::new(StringArray::from(
        table.rows.iter().map(|r| r.gene.as_str()).collect::<Vec<_>>(),
    )));
    for idx in 0..table.columns.len() {
        arrays.push(Arc::new(Float64Array::from(
            table.rows.iter().map(|r| r.values[idx]).collect::<Vec<_>>(),
        )));
    }

    RecordBatch::try_new(schema, arrays).context("Failed to create Arrow RecordBatch")
}

fn write_parquet(path: &Path, table: &AnnotatedTable) -> Result<()> {
    let batch = to_record_batch(table)?;

    let file = std::fs::File::create(path).context("Failed to create Parquet file")?;
    let props = WriterProperties::builder()
        .set_compression(parquet::basic::Compression::SNAPPY)
        .build();

    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("Failed to create Parquet writer")?;
    writer.write(&batch).context("Failed to write Parquet data")?;
    writer.close().context("Failed to close Parquet writer")?;
    Ok(())
}

/// Render a table as an aligned text grid.
pub fn pretty_table(table: &AnnotatedTable) -> Result<String> {
    let batch = to_record_batch(table)?;
    let rendered = pretty_format_batches(&[batch]).context("formatting table")?;
    Ok(rendered.to_string())
}
