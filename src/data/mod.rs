/// Data layer: core types, loading, and cleaning.
///
/// Architecture:
/// ```text
///  .xlsx / .xls / .ods / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  sheet → SheetGrid (absolute A1 coordinates)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  pick 3 columns, drop rows without a gene
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ GeneTable │  named Vec<GeneRecord>, concat across sheets
///   └──────────┘
/// ```

pub mod loader;
pub mod model;
pub mod filter;
