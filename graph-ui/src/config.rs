use std::collections::HashMap;

use serde::Deserialize;
use shared_types::{TaskInstanceMap, TaskMeta};

use crate::api::task_instances_from_value;
use crate::controller::RefreshRate;
use crate::GraphUiError;

/// Page globals read by the graph view, in the names the page defines them.
pub const GLOBAL_NAMES: [&str; 6] = [
    "getTaskInstanceURL",
    "getTaskInstanceParams",
    "tasks",
    "dagTZ",
    "refresh_rate",
    "task_instances",
];

/// Settings the hosting page hands to the graph view.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GraphPageConfig {
    #[serde(rename = "getTaskInstanceURL")]
    pub task_instance_url: String,

    #[serde(rename = "getTaskInstanceParams", default)]
    task_instance_params: serde_json::Map<String, serde_json::Value>,

    #[serde(default)]
    pub tasks: HashMap<String, TaskMeta>,

    #[serde(rename = "dagTZ", default = "default_dag_tz")]
    pub dag_tz: String,

    /// Milliseconds; zero or negative disables auto-refresh on load.
    #[serde(default)]
    pub refresh_rate: Option<f64>,

    /// Decoded record by record; see [`GraphPageConfig::task_instances`].
    #[serde(default)]
    task_instances: serde_json::Value,
}

fn default_dag_tz() -> String {
    "UTC".to_string()
}

impl GraphPageConfig {
    /// Builds the config from an object holding the page globals.
    pub fn from_globals(globals: serde_json::Value) -> Result<Self, GraphUiError> {
        if let Some(object) = globals.as_object() {
            if !object.contains_key("getTaskInstanceURL") {
                return Err(GraphUiError::MissingGlobal("getTaskInstanceURL"));
            }
        }
        serde_json::from_value(globals).map_err(|e| GraphUiError::InvalidConfig(e.to_string()))
    }

    /// Query parameters of the poll request. Non-string values are sent in
    /// their JSON form.
    pub fn task_instance_params(&self) -> Vec<(String, String)> {
        self.task_instance_params
            .iter()
            .map(|(key, value)| {
                let value = match value {
                    serde_json::Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (key.clone(), value)
            })
            .collect()
    }

    /// Records embedded in the page. Records that do not decode are skipped.
    pub fn task_instances(&self) -> TaskInstanceMap {
        if self.task_instances.is_null() {
            return TaskInstanceMap::new();
        }
        task_instances_from_value(self.task_instances.clone()).unwrap_or_else(|e| {
            dioxus_logger::tracing::warn!("Ignoring page task_instances: {}", e);
            TaskInstanceMap::new()
        })
    }

    pub fn refresh_rate(&self) -> RefreshRate {
        match self.refresh_rate {
            Some(ms) if ms.is_finite() => RefreshRate(ms.trunc() as i64),
            _ => RefreshRate(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_page_globals() {
        let config = GraphPageConfig::from_globals(json!({
            "getTaskInstanceURL": "/object/task_instances",
            "getTaskInstanceParams": {"dag_id": "etl", "execution_date": "2024-03-01T00:00:00+00:00"},
            "tasks": {"extract": {"task_type": "PythonOperator", "dag_id": "etl"}},
            "dagTZ": "+02:00",
            "refresh_rate": 3000,
            "task_instances": {"extract": {"task_id": "extract", "state": "success"}}
        }))
        .expect("should parse");

        assert_eq!(config.task_instance_url, "/object/task_instances");
        assert_eq!(config.dag_tz, "+02:00");
        assert_eq!(config.refresh_rate(), RefreshRate(3000));
        assert_eq!(
            config.tasks["extract"].task_type.as_deref(),
            Some("PythonOperator")
        );
        assert_eq!(config.task_instances().len(), 1);
        assert_eq!(
            config.task_instance_params(),
            vec![
                ("dag_id".to_string(), "etl".to_string()),
                (
                    "execution_date".to_string(),
                    "2024-03-01T00:00:00+00:00".to_string()
                ),
            ]
        );
    }

    #[test]
    fn optional_globals_default() {
        let config = GraphPageConfig::from_globals(json!({
            "getTaskInstanceURL": "/object/task_instances"
        }))
        .expect("should parse");

        assert_eq!(config.dag_tz, "UTC");
        assert_eq!(config.refresh_rate(), RefreshRate(0));
        assert!(config.tasks.is_empty());
        assert!(config.task_instances().is_empty());
        assert!(config.task_instance_params().is_empty());
    }

    #[test]
    fn numeric_params_are_stringified() {
        let config = GraphPageConfig::from_globals(json!({
            "getTaskInstanceURL": "/ti",
            "getTaskInstanceParams": {"num_runs": 25}
        }))
        .unwrap();
        assert_eq!(
            config.task_instance_params(),
            vec![("num_runs".to_string(), "25".to_string())]
        );
    }

    #[test]
    fn missing_url_is_reported() {
        let err = GraphPageConfig::from_globals(json!({"tasks": {}})).expect_err("must fail");
        assert!(matches!(err, GraphUiError::MissingGlobal("getTaskInstanceURL")));
    }

    #[test]
    fn malformed_page_record_is_skipped() {
        let config = GraphPageConfig::from_globals(json!({
            "getTaskInstanceURL": "/ti",
            "task_instances": {
                "ok": {"task_id": "ok", "state": "queued"},
                "bad": {"task_id": "bad", "duration": [1, 2]}
            }
        }))
        .expect("should parse");

        let records = config.task_instances();
        assert_eq!(records.len(), 1);
        assert!(records.contains_key("ok"));
    }
}
