//! Flat metadata rows as returned by a source query.

use serde::{Deserialize, Serialize};

/// One column of one table, as read from the source catalog.
///
/// Rows for the same table are not required to be contiguous.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRow {
    pub table_name: String,
    pub table_comment: Option<String>,
    pub column_name: String,
    pub column_type: String,
    pub column_comment: Option<String>,
}

impl MetadataRow {
    pub fn new(
        table_name: impl Into<String>,
        table_comment: Option<&str>,
        column_name: impl Into<String>,
        column_type: impl Into<String>,
        column_comment: Option<&str>,
    ) -> Self {
        Self {
            table_name: table_name.into(),
            table_comment: table_comment.map(str::to_string),
            column_name: column_name.into(),
            column_type: column_type.into(),
            column_comment: column_comment.map(str::to_string),
        }
    }
}
