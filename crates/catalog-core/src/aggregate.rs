//! Row aggregation: flat column rows into one record per table.

use indexmap::IndexMap;

use crate::document::{ColumnEntry, TableRecord};
use crate::row::MetadataRow;

/// Table records keyed by table name, in order of first appearance.
pub type TableRecords = IndexMap<String, TableRecord>;

/// Fold metadata rows into table records.
///
/// Rows are consumed in input order and need not be grouped by table. The
/// first row seen for a table fixes its table-level fields; every row adds
/// one column. An empty input yields an empty map.
pub fn aggregate<I>(rows: I, database: &str) -> TableRecords
where
    I: IntoIterator<Item = MetadataRow>,
{
    let mut tables = TableRecords::new();

    for row in rows {
        let record = tables
            .entry(row.table_name.clone())
            .or_insert_with(|| {
                TableRecord::new(database, row.table_name.as_str(), row.table_comment.as_deref())
            });

        let column = ColumnEntry::new(
            row.column_name,
            row.column_type,
            row.column_comment.unwrap_or_default(),
        );
        record.push_column(column);
    }

    tables
}
