use std::fmt;
use std::path::{Path, PathBuf};

use calamine::{open_workbook_auto, Data, Range, Reader};
use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::filter::clean_rows;
use super::model::{CellValue, GeneRecord, GeneTable};

// ---------------------------------------------------------------------------
// Load options
// ---------------------------------------------------------------------------

/// Which sheet of a workbook to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SheetSelector {
    /// Zero-based position in the workbook.
    Index(usize),
    Name(String),
}

impl Default for SheetSelector {
    fn default() -> Self {
        SheetSelector::Index(0)
    }
}

impl fmt::Display for SheetSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SheetSelector::Index(i) => write!(f, "#{i}"),
            SheetSelector::Name(n) => write!(f, "'{n}'"),
        }
    }
}

/// Zero-based absolute column positions of the three extracted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnLayout {
    pub gene: usize,
    pub log2fc: usize,
    pub adj_p_value: usize,
}

impl Default for ColumnLayout {
    fn default() -> Self {
        ColumnLayout {
            gene: 2,
            log2fc: 4,
            adj_p_value: 5,
        }
    }
}

impl ColumnLayout {
    pub fn new(gene: usize, log2fc: usize, adj_p_value: usize) -> Self {
        ColumnLayout {
            gene,
            log2fc,
            adj_p_value,
        }
    }

    fn roles(&self) -> [(&'static str, usize); 3] {
        [
            ("gene", self.gene),
            ("log2fc", self.log2fc),
            ("adj_p_value", self.adj_p_value),
        ]
    }
}

/// How to read one sheet: selector, rows above the header, and column layout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SheetOptions {
    pub sheet: SheetSelector,
    /// Rows skipped before the header row.
    pub skip_rows: usize,
    pub columns: ColumnLayout,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("input file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),

    #[error("cannot read workbook {}", .path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: calamine::Error,
    },

    #[error("sheet {sheet} not found in {} (available: {available:?})", .path.display())]
    SheetNotFound {
        path: PathBuf,
        sheet: SheetSelector,
        available: Vec<String>,
    },

    #[error("delimited file {} has a single sheet, cannot select {sheet}", .path.display())]
    DelimitedSheet { path: PathBuf, sheet: SheetSelector },

    #[error("sheet '{sheet}' has {rows} rows, no header row after skipping {skip_rows}")]
    MissingHeader {
        sheet: String,
        skip_rows: usize,
        rows: usize,
    },

    #[error("{role} column {index} is out of range for sheet '{sheet}' ({width} columns)")]
    ColumnOutOfRange {
        sheet: String,
        role: &'static str,
        index: usize,
        width: usize,
    },

    #[error("cannot read delimited file {}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

pub type LoadResult<T> = std::result::Result<T, LoadError>;

// ---------------------------------------------------------------------------
// SheetGrid – a dense, absolutely addressed sheet
// ---------------------------------------------------------------------------

/// Every cell of a sheet from A1 to the last used cell.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetGrid {
    pub name: String,
    /// Number of columns up to and including the last used column.
    pub width: usize,
    pub rows: Vec<Vec<CellValue>>,
}

static EMPTY_CELL: CellValue = CellValue::Empty;

impl SheetGrid {
    fn cell(&self, row: usize, col: usize) -> &CellValue {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .unwrap_or(&EMPTY_CELL)
    }
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Read a sheet and clean it into a named [`GeneTable`].
pub fn load_and_clean(path: &Path, name: &str, options: &SheetOptions) -> LoadResult<GeneTable> {
    let grid = read_sheet(path, &options.sheet)?;
    let records = normalize(&grid, options.skip_rows, &options.columns)?;
    debug!(
        "{}: sheet '{}' gave {} rows after cleaning",
        path.display(),
        grid.name,
        records.len()
    );
    Ok(GeneTable::new(name, records))
}

/// Read one sheet of a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – spreadsheet workbooks
/// * `.csv` / `.tsv` – a single delimited sheet
pub fn read_sheet(path: &Path, sheet: &SheetSelector) -> LoadResult<SheetGrid> {
    if !path.exists() {
        return Err(LoadError::NotFound(path.to_path_buf()));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => read_workbook_sheet(path, sheet),
        "csv" => read_delimited(path, sheet, b','),
        "tsv" => read_delimited(path, sheet, b'\t'),
        other => Err(LoadError::UnsupportedExtension(other.to_string())),
    }
}

/// Select the three layout columns from the rows below the header and drop
/// rows without a gene.
///
/// Row `skip_rows` is the header row: it must exist and is discarded.
pub fn normalize(
    grid: &SheetGrid,
    skip_rows: usize,
    layout: &ColumnLayout,
) -> LoadResult<Vec<GeneRecord>> {
    if grid.rows.len() <= skip_rows {
        return Err(LoadError::MissingHeader {
            sheet: grid.name.clone(),
            skip_rows,
            rows: grid.rows.len(),
        });
    }

    for (role, index) in layout.roles() {
        if index >= grid.width {
            return Err(LoadError::ColumnOutOfRange {
                sheet: grid.name.clone(),
                role,
                index,
                width: grid.width,
            });
        }
    }

    let first_data_row = skip_rows + 1;
    let extracted = (first_data_row..grid.rows.len()).map(|row| {
        [
            grid.cell(row, layout.gene),
            grid.cell(row, layout.log2fc),
            grid.cell(row, layout.adj_p_value),
        ]
    });
    let records = clean_rows(extracted);

    let data_rows = grid.rows.len() - first_data_row;
    debug!(
        "sheet '{}': {} data rows, {} dropped for missing gene",
        grid.name,
        data_rows,
        data_rows - records.len()
    );
    Ok(records)
}

// ---------------------------------------------------------------------------
// Workbook reader
// ---------------------------------------------------------------------------

fn read_workbook_sheet(path: &Path, sheet: &SheetSelector) -> LoadResult<SheetGrid> {
    let workbook_err = |source| LoadError::Workbook {
        path: path.to_path_buf(),
        source,
    };

    let mut workbook = open_workbook_auto(path).map_err(workbook_err)?;
    let names = workbook.sheet_names();

    let name = match sheet {
        SheetSelector::Index(i) => names.get(*i).cloned(),
        SheetSelector::Name(n) => names.iter().find(|s| *s == n).cloned(),
    };
    let Some(name) = name else {
        return Err(LoadError::SheetNotFound {
            path: path.to_path_buf(),
            sheet: sheet.clone(),
            available: names,
        });
    };

    let range = workbook.worksheet_range(&name).map_err(workbook_err)?;
    let grid = grid_from_range(name, &range);
    debug!(
        "{}: sheet '{}' is {} rows x {} columns",
        path.display(),
        grid.name,
        grid.rows.len(),
        grid.width
    );
    Ok(grid)
}

/// Lay a used range out on absolute coordinates, padding from A1.
fn grid_from_range(name: String, range: &Range<Data>) -> SheetGrid {
    let Some((last_row, last_col)) = range.end() else {
        return SheetGrid {
            name,
            width: 0,
            rows: Vec::new(),
        };
    };

    let rows = (0..=last_row)
        .map(|r| {
            (0..=last_col)
                .map(|c| range.get_value((r, c)).map_or(CellValue::Empty, cell_from_data))
                .collect()
        })
        .collect();

    SheetGrid {
        name,
        width: last_col as usize + 1,
        rows,
    }
}

fn cell_from_data(cell: &Data) -> CellValue {
    match cell {
        Data::String(s) => CellValue::String(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(_) => CellValue::DateTime(cell.to_string()),
        Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::DateTime(s.clone()),
        Data::Error(e) => CellValue::Error(e.to_string()),
        Data::Empty => CellValue::Empty,
    }
}

// ---------------------------------------------------------------------------
// Delimited reader
// ---------------------------------------------------------------------------

/// A CSV/TSV file is one sheet with no header handling of its own; every
/// line, including the header, becomes a grid row.
fn read_delimited(path: &Path, sheet: &SheetSelector, delimiter: u8) -> LoadResult<SheetGrid> {
    if *sheet != SheetSelector::Index(0) {
        return Err(LoadError::DelimitedSheet {
            path: path.to_path_buf(),
            sheet: sheet.clone(),
        });
    }

    let csv_err = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)
        .map_err(csv_err)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(csv_err)?;
        let row: Vec<CellValue> = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    CellValue::Empty
                } else {
                    CellValue::String(field.to_string())
                }
            })
            .collect();
        rows.push(row);
    }

    let width = rows.iter().map(Vec::len).max().unwrap_or(0);
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("sheet")
        .to_string();

    Ok(SheetGrid { name, width, rows })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_xlsxwriter::Workbook;
    use std::io::Write;
    use tempfile::TempDir;

    /// One sheet's rows; `None` leaves the cell unwritten.
    type Rows<'a> = &'a [&'a [Option<&'a str>]];

    /// Write a workbook where numeric-looking text is stored as numbers.
    fn write_workbook(dir: &TempDir, file: &str, sheets: &[Rows]) -> PathBuf {
        let path = dir.path().join(file);
        let mut workbook = Workbook::new();
        for rows in sheets {
            let worksheet = workbook.add_worksheet();
            for (r, row) in rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    let Some(text) = cell else { continue };
                    match text.parse::<f64>() {
                        Ok(v) => worksheet.write_number(r as u32, c as u16, v).unwrap(),
                        Err(_) => worksheet.write_string(r as u32, c as u16, *text).unwrap(),
                    };
                }
            }
        }
        workbook.save(&path).unwrap();
        path
    }

    fn genes(table: &GeneTable) -> Vec<&str> {
        table.records.iter().map(|r| r.gene.as_str()).collect()
    }

    const DBT_LIKE: &[&[Option<&str>]] = &[
        &[Some("DBT treated vs control")],
        &[Some("id"), Some("chr"), Some("gene"), Some("base"), Some("lfc"), Some("padj")],
        &[Some("1"), Some("chr1"), Some("TP53"), Some("10"), Some("1.5"), Some("0.001")],
        &[Some("2"), Some("chr2"), Some("NA"), Some("11"), Some("2.5"), Some("0.002")],
        &[Some("3"), Some("chr3"), None, Some("12"), Some("-0.5"), Some("0.3")],
        &[Some("4"), Some("chr4"), Some("MYC"), Some("13"), Some("NA"), Some("0.04")],
    ];

    #[test]
    fn test_load_xlsx_with_skipped_title_row() {
        let dir = TempDir::new().unwrap();
        let path = write_workbook(&dir, "DBT.xlsx", &[DBT_LIKE]);
        let options = SheetOptions {
            skip_rows: 1,
            ..SheetOptions::default()
        };

        let table = load_and_clean(&path, "DBT", &options).unwrap();

        assert_eq!(table.name, "DBT");
        assert_eq!(genes(&table), vec!["TP53", "MYC"]);
        assert_eq!(table.records[0], GeneRecord::new("TP53", Some(1.5), Some(0.001)));
        assert_eq!(table.records[1].log2fc, None);
        assert_eq!(table.records[1].adj_p_value, Some(0.04));
    }

    #[test]
    fn test_cleaned_count_is_rows_with_genes() {
        let dir = TempDir::new().unwrap();
        let path = write_workbook(&dir, "DBT.xlsx", &[DBT_LIKE]);
        let grid = read_sheet(&path, &SheetSelector::Index(0)).unwrap();

        let records = normalize(&grid, 1, &ColumnLayout::default()).unwrap();

        // 4 data rows, 2 with a missing gene
        assert_eq!(grid.rows.len() - 2, 4);
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_positions_are_absolute_when_leading_columns_empty() {
        let dir = TempDir::new().unwrap();
        let rows: &[&[Option<&str>]] = &[
            &[None, None, Some("gene"), None, Some("lfc"), Some("padj")],
            &[None, None, Some("EGFR"), None, Some("0.7"), Some("0.01")],
        ];
        let path = write_workbook(&dir, "5A.xlsx", &[rows]);

        let table = load_and_clean(&path, "5A", &SheetOptions::default()).unwrap();

        assert_eq!(table.records, vec![GeneRecord::new("EGFR", Some(0.7), Some(0.01))]);
    }

    #[test]
    fn test_select_sheet_by_index_and_name() {
        let dir = TempDir::new().unwrap();
        let other: &[&[Option<&str>]] = &[&[Some("summary")]];
        let sheet3: &[&[Option<&str>]] = &[
            &[Some("R234 up")],
            &[Some("a"), Some("b"), Some("gene"), Some("c"), Some("d"), Some("lfc"), Some("padj")],
            &[Some("1"), Some("x"), Some("KRAS"), Some("y"), Some("z"), Some("3.1"), Some("0.0001")],
        ];
        let path = write_workbook(&dir, "R234.xlsx", &[other, other, sheet3]);
        let layout = ColumnLayout::new(2, 5, 6);

        let by_index = SheetOptions {
            sheet: SheetSelector::Index(2),
            skip_rows: 1,
            columns: layout,
        };
        let table = load_and_clean(&path, "R234", &by_index).unwrap();
        assert_eq!(table.records, vec![GeneRecord::new("KRAS", Some(3.1), Some(0.0001))]);

        let by_name = SheetOptions {
            sheet: SheetSelector::Name("Sheet3".to_string()),
            ..by_index
        };
        assert_eq!(load_and_clean(&path, "R234", &by_name).unwrap(), table);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = read_sheet(&dir.path().join("nope.xlsx"), &SheetSelector::Index(0)).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn test_unknown_sheet() {
        let dir = TempDir::new().unwrap();
        let path = write_workbook(&dir, "DBT.xlsx", &[DBT_LIKE]);

        let err = read_sheet(&path, &SheetSelector::Index(3)).unwrap_err();
        assert!(matches!(err, LoadError::SheetNotFound { .. }));

        let err = read_sheet(&path, &SheetSelector::Name("Results".into())).unwrap_err();
        match err {
            LoadError::SheetNotFound { available, .. } => assert_eq!(available, vec!["Sheet1"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_column_out_of_range() {
        let dir = TempDir::new().unwrap();
        let path = write_workbook(&dir, "DBT.xlsx", &[DBT_LIKE]);
        let options = SheetOptions {
            skip_rows: 1,
            columns: ColumnLayout::new(2, 5, 6),
            ..SheetOptions::default()
        };

        let err = load_and_clean(&path, "DBT", &options).unwrap_err();
        match err {
            LoadError::ColumnOutOfRange {
                role, index, width, ..
            } => {
                assert_eq!(role, "adj_p_value");
                assert_eq!(index, 6);
                assert_eq!(width, 6);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_header_row() {
        let grid = SheetGrid {
            name: "Sheet1".into(),
            width: 6,
            rows: vec![vec![CellValue::Empty; 6]],
        };
        let err = normalize(&grid, 1, &ColumnLayout::default()).unwrap_err();
        assert!(matches!(err, LoadError::MissingHeader { rows: 1, .. }));

        // Header present, no data: empty table, not an error.
        assert!(normalize(&grid, 0, &ColumnLayout::default()).unwrap().is_empty());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("genes.txt");
        std::fs::write(&path, "x").unwrap();
        let err = read_sheet(&path, &SheetSelector::Index(0)).unwrap_err();
        assert!(matches!(err, LoadError::UnsupportedExtension(ext) if ext == "txt"));
    }

    #[test]
    fn test_load_csv() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("5A.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "id,chr,gene,base,lfc,padj").unwrap();
        writeln!(file, "1,chr1,TP53,10,1.5,0.001").unwrap();
        writeln!(file, "2,chr1,NA,10,1.5,0.001").unwrap();
        writeln!(file, "3,chr1,,10,1.5,0.001").unwrap();
        writeln!(file, "4,chr1,MYC,10,NA").unwrap();
        drop(file);

        let table = load_and_clean(&path, "5A", &SheetOptions::default()).unwrap();

        assert_eq!(genes(&table), vec!["TP53", "MYC"]);
        assert_eq!(table.records[1], GeneRecord::new("MYC", None, None));

        let err = read_sheet(&path, &SheetSelector::Index(1)).unwrap_err();
        assert!(matches!(err, LoadError::DelimitedSheet { .. }));
    }

    #[test]
    fn test_sheet_selector_from_json() {
        let idx: SheetSelector = serde_json::from_str("2").unwrap();
        let name: SheetSelector = serde_json::from_str("\"Up\"").unwrap();
        assert_eq!(idx, SheetSelector::Index(2));
        assert_eq!(name, SheetSelector::Name("Up".into()));
    }

    #[test]
    fn test_error_cells_keep_spreadsheet_text() {
        use calamine::CellErrorType;

        let na = cell_from_data(&Data::Error(CellErrorType::NA));
        let div0 = cell_from_data(&Data::Error(CellErrorType::Div0));

        assert_eq!(na.to_string(), "#N/A");
        assert_eq!(div0.to_string(), "#DIV/0!");
        assert_eq!(crate::data::filter::gene_identifier(&na), None);
    }
}
