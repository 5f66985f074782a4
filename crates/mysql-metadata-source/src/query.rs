//! The INFORMATION_SCHEMA query and row decoding.

use catalog_core::{MetadataRow, SourceError};
use mysql_async::{from_value_opt, Row, Value};

/// One row per column of every base table or view in the bound schema.
pub const METADATA_QUERY: &str = "
    SELECT t.TABLE_NAME, t.TABLE_COMMENT, c.COLUMN_NAME, c.COLUMN_TYPE, c.COLUMN_COMMENT
    FROM INFORMATION_SCHEMA.TABLES t
    JOIN INFORMATION_SCHEMA.COLUMNS c
        ON t.TABLE_NAME = c.TABLE_NAME AND t.TABLE_SCHEMA = c.TABLE_SCHEMA
    WHERE t.TABLE_SCHEMA = ?
    ORDER BY t.TABLE_NAME, c.ORDINAL_POSITION";

pub(crate) fn decode_row(row: Row) -> Result<MetadataRow, SourceError> {
    Ok(MetadataRow {
        table_name: required_text(&row, 0, "table name")?,
        table_comment: text_value(row.as_ref(1), "table comment")?,
        column_name: required_text(&row, 2, "column name")?,
        column_type: required_text(&row, 3, "column type")?,
        column_comment: text_value(row.as_ref(4), "column comment")?,
    })
}

fn required_text(row: &Row, index: usize, field: &str) -> Result<String, SourceError> {
    text_value(row.as_ref(index), field)?
        .ok_or_else(|| SourceError::Query(format!("Missing {field}")))
}

/// Convert a nullable text cell; values that are not valid UTF-8 text are query errors.
fn text_value(value: Option<&Value>, field: &str) -> Result<Option<String>, SourceError> {
    match value {
        None => Ok(None),
        Some(value) => from_value_opt::<Option<String>>(value.clone())
            .map_err(|_| SourceError::Query(format!("{field} is not valid text"))),
    }
}
