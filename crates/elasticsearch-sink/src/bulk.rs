//! `_bulk` request encoding and response decoding.

use std::collections::HashMap;

use catalog_core::TableDocument;
use catalog_sink::{ItemResult, SinkError};
use serde::Deserialize;
use serde_json::{json, Value};

/// Encode items as an NDJSON `_bulk` body of `index` actions.
pub fn bulk_body(items: &[(String, TableDocument)]) -> Result<String, SinkError> {
    let mut body = String::new();
    for (id, document) in items {
        let action = json!({ "index": { "_id": id } });
        body.push_str(&action.to_string());
        body.push('\n');
        let source = serde_json::to_string(document)
            .map_err(|e| SinkError::Decode(format!("failed to encode document {id}: {e}")))?;
        body.push_str(&source);
        body.push('\n');
    }
    Ok(body)
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    #[serde(rename = "_id")]
    id: Option<String>,
    status: u16,
    error: Option<Value>,
}

/// Decode a `_bulk` response into one result per reported item.
pub fn parse_bulk_response(text: &str) -> Result<Vec<ItemResult>, SinkError> {
    let response: BulkResponse =
        serde_json::from_str(text).map_err(|e| SinkError::Decode(e.to_string()))?;

    let mut results = Vec::with_capacity(response.items.len());
    for entry in response.items {
        // Each entry is keyed by its action name ("index").
        for (_, item) in entry {
            let id = item.id.unwrap_or_default();
            let ok = (200..300).contains(&item.status) && item.error.is_none();
            if ok {
                results.push(ItemResult::success(id));
            } else {
                let reason = item
                    .error
                    .as_ref()
                    .map(error_reason)
                    .unwrap_or_else(|| format!("status {}", item.status));
                results.push(ItemResult::failure(id, reason));
            }
        }
    }
    Ok(results)
}

/// Render an item error as `type: reason` when the sink reports both.
fn error_reason(error: &Value) -> String {
    let kind = error.get("type").and_then(Value::as_str);
    let reason = error.get("reason").and_then(Value::as_str);
    match (kind, reason) {
        (Some(kind), Some(reason)) => format!("{kind}: {reason}"),
        (None, Some(reason)) => reason.to_string(),
        (Some(kind), None) => kind.to_string(),
        (None, None) => error.to_string(),
    }
}
