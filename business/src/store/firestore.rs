//! Firestore listener over the REST `runQuery` endpoint.
//!
//! The first query result is delivered as the initial snapshot. The query is
//! then re-run every poll interval and a snapshot is delivered only when the
//! result differs from the last one delivered. Any failure is reported once
//! through the error callback and ends the listener.

use std::sync::atomic::{AtomicU64, Ordering};

use cumeets_states::{TaskHandle, TaskId};
use log::{debug, error, info};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tokio::runtime::Handle;

use super::{Document, DocumentStore, FieldOp, OnError, OnSnapshot, Predicate, Subscription};
use crate::config::FirebaseConfig;
use crate::error::StoreError;

#[derive(Debug)]
pub struct FirestoreStore {
    client: reqwest::Client,
    config: FirebaseConfig,
    runtime: Handle,
    next_generation: AtomicU64,
}

impl FirestoreStore {
    /// Binds the store to the current Tokio runtime.
    pub fn new(config: FirebaseConfig) -> Result<Self, StoreError> {
        let runtime = Handle::try_current().ok().ok_or(StoreError::NoRuntime)?;
        Ok(Self::with_runtime(config, runtime))
    }

    pub fn with_runtime(config: FirebaseConfig, runtime: Handle) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            runtime,
            next_generation: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &FirebaseConfig {
        &self.config
    }

    fn query(&self, collection: &str, predicate: &Predicate) -> RunQuery {
        RunQuery {
            client: self.client.clone(),
            url: self.config.run_query_url(),
            api_key: self.config.api_key().to_owned(),
            body: structured_query(collection, predicate),
        }
    }

    /// Runs the query once.
    pub async fn fetch(
        &self,
        collection: &str,
        predicate: &Predicate,
    ) -> Result<Vec<Document>, StoreError> {
        self.query(collection, predicate).run().await
    }
}

impl DocumentStore for FirestoreStore {
    fn subscribe(
        &self,
        collection: &str,
        predicate: Predicate,
        on_snapshot: OnSnapshot,
        on_error: OnError,
    ) -> Subscription {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let handle = TaskHandle::spawn_token(TaskId::new(collection, generation));
        let query = self.query(collection, &predicate);
        let interval = self.config.poll_interval();
        let token = handle.cancellation_token();
        let task_id = handle.id();

        info!("Starting Firestore listener {task_id} where {predicate}");
        self.runtime.spawn(async move {
            let mut last: Option<Vec<Document>> = None;
            loop {
                let result = tokio::select! {
                    _ = token.cancelled() => break,
                    result = query.run() => result,
                };
                match result {
                    Ok(documents) => {
                        if last.as_ref() != Some(&documents) {
                            debug!("Listener {task_id}: {} document(s)", documents.len());
                            last = Some(documents.clone());
                            on_snapshot(documents);
                        }
                    }
                    Err(err) => {
                        error!("Listener {task_id} failed: {err}");
                        if !token.is_cancelled() {
                            on_error(err.to_string());
                        }
                        break;
                    }
                }
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = tokio::time::sleep(interval) => {}
                }
            }
            debug!("Listener {task_id} stopped");
        });

        Subscription::new(handle)
    }
}

struct RunQuery {
    client: reqwest::Client,
    url: String,
    api_key: String,
    body: Value,
}

impl RunQuery {
    async fn run(&self) -> Result<Vec<Document>, StoreError> {
        let response = self
            .client
            .post(&self.url)
            .query(&[("key", self.api_key.as_str())])
            .json(&self.body)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            return Err(StoreError::Status {
                status: status.as_u16(),
                message: error_message(&body)
                    .unwrap_or_else(|| status.canonical_reason().unwrap_or("unknown").to_owned()),
            });
        }

        decode_run_query(&body)
    }
}

fn structured_query(collection: &str, predicate: &Predicate) -> Value {
    let op = match predicate.op {
        FieldOp::Equal => "EQUAL",
    };
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection }],
            "where": {
                "fieldFilter": {
                    "field": { "fieldPath": predicate.field.as_str() },
                    "op": op,
                    "value": { "stringValue": predicate.value },
                }
            }
        }
    })
}

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    document: Option<FirestoreDocument>,
}

#[derive(Debug, Deserialize)]
struct FirestoreDocument {
    name: String,
    #[serde(default)]
    fields: Map<String, Value>,
}

/// Items without a `document` (e.g. a bare `readTime`) are skipped.
pub fn decode_run_query(body: &[u8]) -> Result<Vec<Document>, StoreError> {
    let items: Vec<RunQueryItem> = serde_json::from_slice(body)?;
    Ok(items
        .into_iter()
        .filter_map(|item| item.document)
        .map(|doc| Document {
            id: document_id(&doc.name).to_owned(),
            fields: decode_fields(&doc.fields),
        })
        .collect())
}

// `projects/{p}/databases/{d}/documents/{collection}/{id}`
fn document_id(name: &str) -> &str {
    name.rsplit('/').next().unwrap_or(name)
}

fn decode_fields(fields: &Map<String, Value>) -> Map<String, Value> {
    fields
        .iter()
        .map(|(key, value)| (key.clone(), decode_value(value)))
        .collect()
}

/// Flatten a typed Firestore value (`{"stringValue": "x"}`) into plain JSON.
pub fn decode_value(value: &Value) -> Value {
    let Some((kind, inner)) = value.as_object().and_then(|obj| obj.iter().next()) else {
        return Value::Null;
    };
    match kind.as_str() {
        "integerValue" => inner
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::from)
            .unwrap_or_else(|| inner.clone()),
        "mapValue" => inner
            .get("fields")
            .and_then(Value::as_object)
            .map(|fields| Value::Object(decode_fields(fields)))
            .unwrap_or_else(|| Value::Object(Map::new())),
        "arrayValue" => Value::Array(
            inner
                .get("values")
                .and_then(Value::as_array)
                .map(|values| values.iter().map(decode_value).collect())
                .unwrap_or_default(),
        ),
        "stringValue" | "doubleValue" | "booleanValue" | "timestampValue" | "referenceValue"
        | "bytesValue" | "geoPointValue" => inner.clone(),
        // `nullValue` and kinds this decoder does not know
        _ => Value::Null,
    }
}

// Firestore errors come back either as `{"error": {...}}` or `[{"error": {...}}]`.
fn error_message(body: &[u8]) -> Option<String> {
    let value: Value = serde_json::from_slice(body).ok()?;
    let error = match &value {
        Value::Array(items) => items.first()?.get("error")?,
        other => other.get("error")?,
    };
    error
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_owned)
}
