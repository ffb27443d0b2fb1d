use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// Column names shared by every cleaned table
// ---------------------------------------------------------------------------

pub const GENE_COLUMN: &str = "Gene";
pub const LOG2FC_COLUMN: &str = "Log2FC";
pub const ADJ_P_VALUE_COLUMN: &str = "AdjPValue";

/// Value columns of a cleaned table, in output order.
pub const VALUE_COLUMNS: [&str; 2] = [LOG2FC_COLUMN, ADJ_P_VALUE_COLUMN];

// ---------------------------------------------------------------------------
// CellValue – a single raw spreadsheet cell
// ---------------------------------------------------------------------------

/// A raw cell as read from a workbook or delimited file, before cleaning.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// Date/time cells kept as their rendered text.
    DateTime(String),
    /// Formula error such as `#N/A` or `#DIV/0!`.
    Error(String),
    Empty,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::String(s) | CellValue::DateTime(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Bool(b) => write!(f, "{b}"),
            CellValue::Error(e) => write!(f, "{e}"),
            CellValue::Empty => Ok(()),
        }
    }
}

// ---------------------------------------------------------------------------
// GeneRecord – one row of a cleaned sheet
// ---------------------------------------------------------------------------

/// A single differential-expression result.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneRecord {
    /// Gene identifier. Never empty, never a missing marker.
    pub gene: String,
    /// log2 fold change, `None` when the cell held no number.
    pub log2fc: Option<f64>,
    /// Adjusted p-value, `None` when the cell held no number.
    pub adj_p_value: Option<f64>,
}

impl GeneRecord {
    pub fn new(gene: impl Into<String>, log2fc: Option<f64>, adj_p_value: Option<f64>) -> Self {
        GeneRecord {
            gene: gene.into(),
            log2fc,
            adj_p_value,
        }
    }

    /// Value cells in [`VALUE_COLUMNS`] order.
    pub fn values(&self) -> [Option<f64>; 2] {
        [self.log2fc, self.adj_p_value]
    }
}

// ---------------------------------------------------------------------------
// GeneTable – a named, cleaned dataset
// ---------------------------------------------------------------------------

/// All cleaned rows of one experimental condition, tagged with its name.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneTable {
    pub name: String,
    pub records: Vec<GeneRecord>,
}

impl GeneTable {
    pub fn new(name: impl Into<String>, records: Vec<GeneRecord>) -> Self {
        GeneTable {
            name: name.into(),
            records,
        }
    }

    /// Concatenate tables into one named table, keeping every row in order.
    pub fn concat(name: impl Into<String>, tables: impl IntoIterator<Item = GeneTable>) -> Self {
        let records = tables
            .into_iter()
            .flat_map(|table| table.records)
            .collect();
        GeneTable::new(name, records)
    }

    /// Set of gene identifiers present in this table.
    pub fn gene_set(&self) -> BTreeSet<&str> {
        self.records.iter().map(|r| r.gene.as_str()).collect()
    }

    /// Row positions keyed by gene, in table order.
    pub fn index_by_gene(&self) -> BTreeMap<&str, Vec<usize>> {
        let mut index: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (i, record) in self.records.iter().enumerate() {
            index.entry(record.gene.as_str()).or_default().push(i);
        }
        index
    }

    /// Genes that occur on more than one row.
    pub fn duplicate_genes(&self) -> Vec<&str> {
        self.index_by_gene()
            .into_iter()
            .filter(|(_, rows)| rows.len() > 1)
            .map(|(gene, _)| gene)
            .collect()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl fmt::Display for GeneTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {} genes", self.name, self.len())
    }
}

// ---------------------------------------------------------------------------
// AnnotatedTable – common genes with values merged in from every source
// ---------------------------------------------------------------------------

/// One output row of the annotated table.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedRow {
    pub gene: String,
    /// Same length and order as [`AnnotatedTable::columns`].
    pub values: Vec<Option<f64>>,
}

/// Gene key column plus any number of nullable numeric columns.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotatedTable {
    /// Value column names (the `Gene` key column is implicit).
    pub columns: Vec<String>,
    pub rows: Vec<AnnotatedRow>,
}

impl AnnotatedTable {
    /// A table with only the key column, one row per gene.
    pub fn seeded<I, S>(genes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        AnnotatedTable {
            columns: Vec::new(),
            rows: genes
                .into_iter()
                .map(|g| AnnotatedRow {
                    gene: g.into(),
                    values: Vec::new(),
                })
                .collect(),
        }
    }

    /// Position of a value column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// All values of one column, in row order.
    #[cfg(test)]
    pub fn column(&self, name: &str) -> Option<Vec<Option<f64>>> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(|r| r.values[idx]).collect())
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<&GeneTable> for AnnotatedTable {
    fn from(table: &GeneTable) -> Self {
        AnnotatedTable {
            columns: VALUE_COLUMNS.iter().map(|c| c.to_string()).collect(),
            rows: table
                .records
                .iter()
                .map(|r| AnnotatedRow {
                    gene: r.gene.clone(),
                    values: r.values().to_vec(),
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(name: &str, genes: &[&str]) -> GeneTable {
        GeneTable::new(
            name,
            genes
                .iter()
                .map(|g| GeneRecord::new(*g, Some(1.0), Some(0.01)))
                .collect(),
        )
    }

    #[test]
    fn test_concat_keeps_all_rows_in_order() {
        let a = table("sheet3", &["A", "B", "C"]);
        let b = table("sheet4", &["C", "D"]);

        let combined = GeneTable::concat("R234", [a, b]);

        assert_eq!(combined.name, "R234");
        assert_eq!(combined.len(), 5);
        let genes: Vec<&str> = combined.records.iter().map(|r| r.gene.as_str()).collect();
        assert_eq!(genes, vec!["A", "B", "C", "C", "D"]);
    }

    #[test]
    fn test_concat_with_empty_table() {
        let a = table("x", &["A", "B"]);
        let combined = GeneTable::concat("R234", [a, table("y", &[])]);
        assert_eq!(combined.len(), 2);
    }

    #[test]
    fn test_gene_set_ignores_duplicates() {
        let t = table("R234", &["B", "A", "B"]);
        let set: Vec<&str> = t.gene_set().into_iter().collect();
        assert_eq!(set, vec!["A", "B"]);
        assert_eq!(t.duplicate_genes(), vec!["B"]);
    }

    #[test]
    fn test_display_reports_row_count() {
        let t = table("DBT", &["A", "B", "B"]);
        assert_eq!(t.to_string(), "DBT : 3 genes");
    }

    #[test]
    fn test_annotated_from_gene_table() {
        let t = table("DBT", &["A"]);
        let annotated = AnnotatedTable::from(&t);
        assert_eq!(annotated.columns, vec!["Log2FC", "AdjPValue"]);
        assert_eq!(annotated.column("AdjPValue"), Some(vec![Some(0.01)]));
        assert_eq!(annotated.column("missing"), None);
    }
}
