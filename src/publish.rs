//! Batch publishing of table documents.
//!
//! All documents of a run go to the sink in one bulk call. Item-level
//! rejections are collected into [`PublishResult`]; only a failure of the
//! call itself is returned as an error.

use std::collections::HashMap;
use std::time::Duration;

use catalog_core::TableDocument;
use catalog_sink::{DocumentSink, SinkError};
use tracing::{info, warn};

/// Reason recorded for a submitted document the sink never reported on.
const MISSING_RESULT_REASON: &str = "no result reported by sink";

/// A document the sink rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemFailure {
    pub id: String,
    pub table_name: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishWarning {
    /// Nothing was submitted because there were no documents.
    EmptyBatch,
}

/// Aggregate outcome of one bulk publish.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishResult {
    pub succeeded_count: usize,
    pub failed_count: usize,
    pub failures: Vec<ItemFailure>,
    pub warning: Option<PublishWarning>,
}

impl PublishResult {
    fn empty_batch() -> Self {
        Self {
            warning: Some(PublishWarning::EmptyBatch),
            ..Self::default()
        }
    }

    fn record_failure(&mut self, failure: ItemFailure) {
        warn!(
            "Document {} (table {}) rejected: {}",
            failure.id, failure.table_name, failure.reason
        );
        self.failed_count += 1;
        self.failures.push(failure);
    }

    /// True when every submitted document was accepted.
    pub fn is_clean(&self) -> bool {
        self.failed_count == 0
    }
}

/// Upsert `documents` into `index_name` with a single bulk call bounded by `timeout`.
///
/// Each document is keyed by [`TableDocument::id`], so an existing document
/// with the same id is replaced. An empty input returns immediately with
/// [`PublishWarning::EmptyBatch`] and never touches the sink.
pub async fn publish<S: DocumentSink>(
    documents: Vec<TableDocument>,
    sink: &S,
    index_name: &str,
    timeout: Duration,
) -> Result<PublishResult, SinkError> {
    if documents.is_empty() {
        warn!("No documents to publish to {index_name}");
        return Ok(PublishResult::empty_batch());
    }

    let items: Vec<(String, TableDocument)> = documents
        .into_iter()
        .map(|document| (document.id(), document))
        .collect();

    info!("Publishing {} documents to {index_name}", items.len());

    let results = tokio::time::timeout(timeout, sink.bulk_upsert(index_name, &items))
        .await
        .map_err(|_| SinkError::TimedOut(timeout))??;

    // id -> table name for everything still awaiting a result
    let mut pending: HashMap<&str, &str> = items
        .iter()
        .map(|(id, document)| (id.as_str(), document.table_name.as_str()))
        .collect();

    let mut result = PublishResult::default();
    for item in results {
        let Some(table_name) = pending.remove(item.id.as_str()) else {
            warn!("Sink reported on unknown or repeated id {}", item.id);
            continue;
        };
        if item.ok {
            result.succeeded_count += 1;
        } else {
            result.record_failure(ItemFailure {
                id: item.id,
                table_name: table_name.to_string(),
                reason: item
                    .error
                    .unwrap_or_else(|| "rejected without a reason".to_string()),
            });
        }
    }

    // Keep submission order for ids the sink stayed silent about.
    for (id, document) in &items {
        if pending.contains_key(id.as_str()) {
            result.record_failure(ItemFailure {
                id: id.clone(),
                table_name: document.table_name.clone(),
                reason: MISSING_RESULT_REASON.to_string(),
            });
        }
    }

    info!(
        "Published to {index_name}: {} succeeded, {} failed",
        result.succeeded_count, result.failed_count
    );

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{table_document, MockDocumentSink};

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_publish_empty_skips_sink() {
        let sink = MockDocumentSink::new();
        let result = publish(Vec::new(), &sink, "data-catalog", TIMEOUT)
            .await
            .unwrap();

        assert_eq!(result.succeeded_count, 0);
        assert_eq!(result.failed_count, 0);
        assert_eq!(result.warning, Some(PublishWarning::EmptyBatch));
        assert_eq!(sink.bulk_calls(), 0);
    }

    #[tokio::test]
    async fn test_publish_all_succeed() {
        let sink = MockDocumentSink::new();
        let docs = vec![table_document("users"), table_document("orders")];

        let result = publish(docs, &sink, "data-catalog", TIMEOUT).await.unwrap();

        assert_eq!(result.succeeded_count, 2);
        assert!(result.is_clean());
        assert_eq!(result.warning, None);
        assert_eq!(sink.bulk_calls(), 1);
        assert_eq!(sink.stored("data-catalog").await.len(), 2);
    }

    #[tokio::test]
    async fn test_publish_partial_failure() {
        let sink = MockDocumentSink::new().reject_table("orders", "mapper_parsing_exception");
        let docs = vec![
            table_document("users"),
            table_document("orders"),
            table_document("items"),
        ];
        let orders_id = docs[1].id();

        let result = publish(docs, &sink, "data-catalog", TIMEOUT).await.unwrap();

        assert_eq!(result.succeeded_count, 2);
        assert_eq!(result.failed_count, 1);
        assert_eq!(
            result.failures,
            vec![ItemFailure {
                id: orders_id,
                table_name: "orders".to_string(),
                reason: "mapper_parsing_exception".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn test_publish_missing_results_are_failures() {
        let sink = MockDocumentSink::new().drop_results_for("orders");
        let docs = vec![table_document("users"), table_document("orders")];

        let result = publish(docs, &sink, "data-catalog", TIMEOUT).await.unwrap();

        assert_eq!(result.succeeded_count, 1);
        assert_eq!(result.failed_count, 1);
        assert_eq!(result.failures[0].table_name, "orders");
        assert_eq!(result.failures[0].reason, MISSING_RESULT_REASON);
    }

    #[tokio::test]
    async fn test_publish_unavailable_sink_is_error() {
        let sink = MockDocumentSink::new().unavailable();
        let result = publish(vec![table_document("users")], &sink, "data-catalog", TIMEOUT).await;
        assert!(matches!(result, Err(SinkError::Unavailable(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_publish_times_out() {
        let sink = MockDocumentSink::new().with_delay(Duration::from_secs(60));
        let result = publish(vec![table_document("users")], &sink, "data-catalog", TIMEOUT).await;
        assert!(matches!(result, Err(SinkError::TimedOut(t)) if t == TIMEOUT));
    }
}
