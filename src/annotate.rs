use log::warn;

use crate::data::model::{AnnotatedRow, AnnotatedTable, GeneTable, VALUE_COLUMNS};

// ---------------------------------------------------------------------------
// Left join on gene
// ---------------------------------------------------------------------------

/// Left-join `right` onto `left` by gene.
///
/// Each left row is repeated once per matching right row, in right-table
/// order; a left row without a match is kept once with `None` values.
/// Right columns whose names already exist on the left get `suffix` appended.
pub fn left_join(left: &AnnotatedTable, right: &GeneTable, suffix: &str) -> AnnotatedTable {
    let mut columns = left.columns.clone();
    for name in VALUE_COLUMNS {
        if left.column_index(name).is_some() {
            columns.push(format!("{name}{suffix}"));
        } else {
            columns.push(name.to_string());
        }
    }

    let index = right.index_by_gene();
    let mut rows = Vec::with_capacity(left.len());
    for row in &left.rows {
        match index.get(row.gene.as_str()) {
            Some(matches) => {
                for &i in matches {
                    let mut values = row.values.clone();
                    values.extend(right.records[i].values());
                    rows.push(AnnotatedRow {
                        gene: row.gene.clone(),
                        values,
                    });
                }
            }
            None => {
                let mut values = row.values.clone();
                values.extend([None; VALUE_COLUMNS.len()]);
                rows.push(AnnotatedRow {
                    gene: row.gene.clone(),
                    values,
                });
            }
        }
    }

    AnnotatedTable { columns, rows }
}

/// Seed a table with `genes` and left-join every source onto it in order.
///
/// Each source joins with suffix `_<name>`; the first source never collides,
/// so its columns keep their plain names.
pub fn annotate<I, S>(genes: I, sources: &[&GeneTable]) -> AnnotatedTable
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut table = AnnotatedTable::seeded(genes);
    for source in sources {
        let dupes = source.duplicate_genes();
        if !dupes.is_empty() {
            warn!(
                "{} has {} genes on more than one row; joined rows will repeat",
                source.name,
                dupes.len()
            );
        }
        table = left_join(&table, source, &format!("_{}", source.name));
    }
    table
}
