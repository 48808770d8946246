use futures_util::future::LocalBoxFuture;
use gloo_net::http::Request;
use shared_types::{TaskInstance, TaskInstanceMap};
use thiserror::Error;

/// Why a task-instance poll failed. `Display` is the text shown in the error
/// banner (`<status>: <detail>`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Non-2xx response, carrying the HTTP status text.
    #[error("error: {0}")]
    Http(String),
    /// The request never produced a response.
    #[error("error: {0}")]
    Network(String),
    /// The body was not a task-instance map.
    #[error("parsererror: {0}")]
    Decode(String),
}

/// Where task-instance snapshots come from.
pub trait TaskInstanceSource {
    /// Starts one request. Each call is independent; nothing is de-duplicated.
    fn fetch(&self) -> LocalBoxFuture<'static, Result<TaskInstanceMap, FetchError>>;
}

/// Decodes the endpoint body. The endpoint may also send the map as a JSON
/// string holding the encoded object.
pub fn decode_task_instances(body: &str) -> Result<TaskInstanceMap, FetchError> {
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| FetchError::Decode(e.to_string()))?;
    let value = match value {
        serde_json::Value::String(inner) => {
            serde_json::from_str(&inner).map_err(|e| FetchError::Decode(e.to_string()))?
        }
        other => other,
    };
    task_instances_from_value(value)
}

/// Decodes a task-instance map record by record. Records that do not decode
/// are logged and left out; the rest of the snapshot is kept.
pub fn task_instances_from_value(value: serde_json::Value) -> Result<TaskInstanceMap, FetchError> {
    let serde_json::Value::Object(records) = value else {
        return Err(FetchError::Decode(
            "expected an object of task instances".to_string(),
        ));
    };

    let mut task_instances = TaskInstanceMap::new();
    for (task_id, record) in records {
        match serde_json::from_value::<TaskInstance>(record) {
            Ok(ti) => {
                task_instances.insert(task_id, ti);
            }
            Err(e) => {
                dioxus_logger::tracing::warn!("Skipping task instance {}: {}", task_id, e);
            }
        }
    }
    Ok(task_instances)
}

/// Polls the graph page's task-instance endpoint over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTaskInstanceSource {
    url: String,
    params: Vec<(String, String)>,
}

impl HttpTaskInstanceSource {
    pub fn new(url: impl Into<String>, params: Vec<(String, String)>) -> Self {
        Self {
            url: url.into(),
            params,
        }
    }

    pub async fn fetch_task_instances(&self) -> Result<TaskInstanceMap, FetchError> {
        let response = Request::get(&self.url)
            .query(self.params.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !response.ok() {
            let status_text = response.status_text();
            return Err(FetchError::Http(if status_text.is_empty() {
                response.status().to_string()
            } else {
                status_text
            }));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        decode_task_instances(&body)
    }
}

impl TaskInstanceSource for HttpTaskInstanceSource {
    fn fetch(&self) -> LocalBoxFuture<'static, Result<TaskInstanceMap, FetchError>> {
        let source = self.clone();
        Box::pin(async move { source.fetch_task_instances().await })
    }
}
