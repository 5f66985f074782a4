//! Table records and the publishable document shape.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::identity::derive_id;

/// Description used when a table has no comment.
pub const DEFAULT_DESCRIPTION: &str = "no description";

/// A single column inside a table document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnEntry {
    pub name: String,
    /// Full column type, including length or precision (e.g. `varchar(255)`).
    #[serde(rename = "type")]
    pub column_type: String,
    /// Column comment; empty when the source has none.
    pub comment: String,
}

impl ColumnEntry {
    pub fn new(
        name: impl Into<String>,
        column_type: impl Into<String>,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            column_type: column_type.into(),
            comment: comment.into(),
        }
    }
}

/// Aggregated state for one table while rows are being folded.
///
/// Table-level fields are fixed when the record is created. Columns are keyed
/// by name: a repeated column keeps its first position and takes the values of
/// the latest row.
#[derive(Debug, Clone, PartialEq)]
pub struct TableRecord {
    pub database: String,
    pub table_name: String,
    pub description: String,
    columns: IndexMap<String, ColumnEntry>,
}

impl TableRecord {
    /// Create an empty record. `table_comment` falls back to
    /// [`DEFAULT_DESCRIPTION`] when missing or blank.
    pub fn new(
        database: impl Into<String>,
        table_name: impl Into<String>,
        table_comment: Option<&str>,
    ) -> Self {
        let description = match table_comment {
            Some(comment) if !comment.trim().is_empty() => comment.to_string(),
            _ => DEFAULT_DESCRIPTION.to_string(),
        };
        Self {
            database: database.into(),
            table_name: table_name.into(),
            description,
            columns: IndexMap::new(),
        }
    }

    /// Add a column, returning the entry it replaced if the name was already present.
    pub fn push_column(&mut self, column: ColumnEntry) -> Option<ColumnEntry> {
        self.columns.insert(column.name.clone(), column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &ColumnEntry> {
        self.columns.values()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

/// The unit of publication: one catalog entry per table.
///
/// Field names are the stored wire shape and must not change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDocument {
    pub source: String,
    pub database: String,
    pub table_name: String,
    pub description: String,
    pub owner: String,
    pub last_updated: DateTime<Utc>,
    pub columns: Vec<ColumnEntry>,
}

impl TableDocument {
    /// Identity of this document in the sink.
    pub fn id(&self) -> String {
        derive_id(&self.source, &self.database, &self.table_name)
    }
}

/// Turn an aggregated record into its final document.
pub fn build(
    record: TableRecord,
    source: &str,
    now: DateTime<Utc>,
    owner_default: &str,
) -> TableDocument {
    TableDocument {
        source: source.to_string(),
        database: record.database,
        table_name: record.table_name,
        description: record.description,
        owner: owner_default.to_string(),
        last_updated: now,
        columns: record.columns.into_values().collect(),
    }
}
