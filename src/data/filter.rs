use super::model::{CellValue, GeneRecord};

// ---------------------------------------------------------------------------
// Missing-value detection
// ---------------------------------------------------------------------------

/// Text tokens read as "not available" rather than as a value.
/// Matched exactly, without trimming.
pub const MISSING_MARKERS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Whether a text cell stands for a missing value.
pub fn is_missing_marker(s: &str) -> bool {
    MISSING_MARKERS.contains(&s)
}

/// Interpret a cell as a gene identifier.
///
/// Empty cells, error cells and missing markers yield `None`; numeric
/// identifiers are rendered as text.
pub fn gene_identifier(cell: &CellValue) -> Option<String> {
    match cell {
        CellValue::Empty | CellValue::Error(_) => None,
        CellValue::String(s) if is_missing_marker(s) => None,
        CellValue::Float(v) if v.is_nan() => None,
        other => Some(other.to_string()),
    }
}

/// Interpret a cell as a number. Anything that is not a number is `None`.
pub fn numeric_value(cell: &CellValue) -> Option<f64> {
    match cell {
        CellValue::Float(v) if !v.is_nan() => Some(*v),
        CellValue::Integer(i) => Some(*i as f64),
        CellValue::String(s) if !is_missing_marker(s) => {
            s.trim().parse::<f64>().ok().filter(|v| !v.is_nan())
        }
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Row cleaning
// ---------------------------------------------------------------------------

/// Build cleaned records from the three extracted columns of each data row,
/// dropping every row whose gene cell is missing.
///
/// Each item is `(gene, log2fc, adj_p_value)` for one sheet row.
pub fn clean_rows<'a, I>(rows: I) -> Vec<GeneRecord>
where
    I: IntoIterator<Item = [&'a CellValue; 3]>,
{
    rows.into_iter()
        .filter_map(|[gene, log2fc, padj]| {
            let gene = gene_identifier(gene)?;
            Some(GeneRecord::new(gene, numeric_value(log2fc), numeric_value(padj)))
        })
        .collect()
}
