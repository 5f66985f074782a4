//! Core types for the catalog-sync framework.
//!
//! This crate holds everything between "rows came back from the catalog
//! tables" and "documents are ready to publish":
//!
//! - [`MetadataRow`] - one flat column row returned by a metadata source
//! - [`aggregate`] - folds rows into one [`TableRecord`] per table
//! - [`build`] - turns a record into a publishable [`TableDocument`]
//! - [`derive_id`] - stable document identity from logical coordinates
//! - [`MetadataSource`] - the trait source crates implement
//!
//! # Architecture
//!
//! ```text
//! catalog-core (this crate)
//!    │
//!    ├─── mysql-metadata-source  (implements MetadataSource)
//!    ├─── catalog-sink           (DocumentSink trait over TableDocument)
//!    │       └─── elasticsearch-sink
//!    └─── catalog-sync           (publisher + run orchestrator + CLI)
//! ```

pub mod aggregate;
pub mod document;
pub mod identity;
pub mod row;
pub mod source;

pub use aggregate::{aggregate, TableRecords};
pub use document::{build, ColumnEntry, TableDocument, TableRecord, DEFAULT_DESCRIPTION};
pub use identity::derive_id;
pub use row::MetadataRow;
pub use source::{MetadataSource, SourceError};
