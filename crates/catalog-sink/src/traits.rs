//! DocumentSink trait definition.

use catalog_core::TableDocument;

use crate::SinkError;

/// Outcome of one item inside a bulk call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemResult {
    pub id: String,
    pub ok: bool,
    /// Sink-reported reason when `ok` is false.
    pub error: Option<String>,
}

impl ItemResult {
    pub fn success(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ok: true,
            error: None,
        }
    }

    pub fn failure(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ok: false,
            error: Some(reason.into()),
        }
    }
}

/// Trait for publishing table documents to a search store.
///
/// # Usage Pattern
///
/// Callers use generics for static dispatch:
///
/// ```ignore
/// pub async fn publish<S: DocumentSink>(sink: &S, items: &[(String, TableDocument)]) {
///     let results = sink.bulk_upsert("data-catalog", items).await?;
/// }
/// ```
#[async_trait::async_trait]
pub trait DocumentSink: Send + Sync {
    /// Lightweight reachability check. Never errors; an unreachable sink is `false`.
    async fn health_check(&self) -> bool;

    /// Index-or-replace every `(id, document)` pair in a single call.
    ///
    /// A document whose id already exists is fully replaced. Returns one
    /// [`ItemResult`] per item the sink reported on.
    async fn bulk_upsert(
        &self,
        index_name: &str,
        items: &[(String, TableDocument)],
    ) -> Result<Vec<ItemResult>, SinkError>;
}
