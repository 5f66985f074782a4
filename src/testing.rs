//! In-memory test doubles for the source and sink boundaries.
//!
//! Both doubles count their calls so tests can assert which stages of a run
//! actually reached the outside world.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use catalog_core::{
    build, ColumnEntry, MetadataRow, MetadataSource, SourceError, TableDocument, TableRecord,
};
use catalog_sink::{DocumentSink, ItemResult, SinkError};
use chrono::{TimeZone, Utc};
use tokio::sync::Mutex;

/// Build a small fixed document for `table` in database `shop`.
pub fn table_document(table: &str) -> TableDocument {
    let comment = format!("{table} table");
    let mut record = TableRecord::new("shop", table, Some(comment.as_str()));
    record.push_column(ColumnEntry::new("id", "int", ""));
    let now = Utc
        .with_ymd_and_hms(2026, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or_default();
    build(record, "mysql", now, "admin")
}

#[derive(Debug, Clone)]
enum SourceFailure {
    Connection(String),
    Query(String),
}

/// Metadata source returning scripted rows.
pub struct MockMetadataSource {
    rows: Vec<MetadataRow>,
    failure: Option<SourceFailure>,
    delay: Option<Duration>,
    fetch_calls: AtomicUsize,
    requested: Mutex<Vec<String>>,
}

impl MockMetadataSource {
    pub fn with_rows(rows: Vec<MetadataRow>) -> Self {
        Self {
            rows,
            failure: None,
            delay: None,
            fetch_calls: AtomicUsize::new(0),
            requested: Mutex::new(Vec::new()),
        }
    }

    pub fn empty() -> Self {
        Self::with_rows(Vec::new())
    }

    pub fn connection_error(reason: &str) -> Self {
        let mut source = Self::empty();
        source.failure = Some(SourceFailure::Connection(reason.to_string()));
        source
    }

    pub fn query_error(reason: &str) -> Self {
        let mut source = Self::empty();
        source.failure = Some(SourceFailure::Query(reason.to_string()));
        source
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Database names passed to `fetch_rows`, in call order.
    pub async fn requested_databases(&self) -> Vec<String> {
        self.requested.lock().await.clone()
    }
}

#[async_trait::async_trait]
impl MetadataSource for MockMetadataSource {
    fn source_kind(&self) -> &str {
        "mysql"
    }

    async fn fetch_rows(&self, database_name: &str) -> Result<Vec<MetadataRow>, SourceError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        self.requested.lock().await.push(database_name.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.failure {
            Some(SourceFailure::Connection(reason)) => Err(SourceError::Connection(reason.clone())),
            Some(SourceFailure::Query(reason)) => Err(SourceError::Query(reason.clone())),
            None => Ok(self.rows.clone()),
        }
    }
}

/// Document sink that stores documents per index, keyed by id.
pub struct MockDocumentSink {
    healthy: bool,
    unavailable: bool,
    health_delay: Option<Duration>,
    delay: Option<Duration>,
    /// table name -> rejection reason
    rejected_tables: HashMap<String, String>,
    silent_tables: Vec<String>,
    indices: Mutex<HashMap<String, HashMap<String, TableDocument>>>,
    health_calls: AtomicUsize,
    bulk_calls: AtomicUsize,
}

impl Default for MockDocumentSink {
    fn default() -> Self {
        Self::new()
    }
}

impl MockDocumentSink {
    pub fn new() -> Self {
        Self {
            healthy: true,
            unavailable: false,
            health_delay: None,
            delay: None,
            rejected_tables: HashMap::new(),
            silent_tables: Vec::new(),
            indices: Mutex::new(HashMap::new()),
            health_calls: AtomicUsize::new(0),
            bulk_calls: AtomicUsize::new(0),
        }
    }

    /// Fail the health check.
    pub fn unhealthy(mut self) -> Self {
        self.healthy = false;
        self
    }

    /// Fail every bulk call at the transport level.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    /// Stall the health check for `delay` before answering.
    pub fn with_health_delay(mut self, delay: Duration) -> Self {
        self.health_delay = Some(delay);
        self
    }

    /// Stall every bulk call for `delay`.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Reject the document of `table` with `reason`.
    pub fn reject_table(mut self, table: &str, reason: &str) -> Self {
        self.rejected_tables
            .insert(table.to_string(), reason.to_string());
        self
    }

    /// Accept the document of `table` but leave it out of the response.
    pub fn drop_results_for(mut self, table: &str) -> Self {
        self.silent_tables.push(table.to_string());
        self
    }

    pub fn health_calls(&self) -> usize {
        self.health_calls.load(Ordering::SeqCst)
    }

    pub fn bulk_calls(&self) -> usize {
        self.bulk_calls.load(Ordering::SeqCst)
    }

    /// Documents currently held in `index`, sorted by table name.
    pub async fn stored(&self, index: &str) -> Vec<TableDocument> {
        let indices = self.indices.lock().await;
        let mut docs: Vec<TableDocument> = indices
            .get(index)
            .map(|docs| docs.values().cloned().collect())
            .unwrap_or_default();
        docs.sort_by(|a, b| a.table_name.cmp(&b.table_name));
        docs
    }

    pub async fn stored_ids(&self, index: &str) -> Vec<String> {
        let indices = self.indices.lock().await;
        let mut ids: Vec<String> = indices
            .get(index)
            .map(|docs| docs.keys().cloned().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }
}

#[async_trait::async_trait]
impl DocumentSink for MockDocumentSink {
    async fn health_check(&self) -> bool {
        self.health_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.health_delay {
            tokio::time::sleep(delay).await;
        }
        self.healthy
    }

    async fn bulk_upsert(
        &self,
        index_name: &str,
        items: &[(String, TableDocument)],
    ) -> Result<Vec<ItemResult>, SinkError> {
        self.bulk_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.unavailable {
            return Err(SinkError::Unavailable("connection refused".to_string()));
        }

        let mut indices = self.indices.lock().await;
        let index = indices.entry(index_name.to_string()).or_default();

        let mut results = Vec::with_capacity(items.len());
        for (id, document) in items {
            if let Some(reason) = self.rejected_tables.get(&document.table_name) {
                results.push(ItemResult::failure(id.clone(), reason.clone()));
                continue;
            }
            index.insert(id.clone(), document.clone());
            if !self.silent_tables.contains(&document.table_name) {
                results.push(ItemResult::success(id.clone()));
            }
        }
        Ok(results)
    }
}
