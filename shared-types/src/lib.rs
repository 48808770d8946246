//! Shared types between the task-instance endpoint and the graph view
//!
//! These types describe the JSON the webserver hands to the graph page:
//! - `TaskInstance` records keyed by task_id (polled by `graph-ui`)
//! - `TaskMeta` entries from the page's `tasks` global
//!
//! Serializable with serde; TypeScript bindings are exported through ts-rs so the
//! hosting page can share the same record shape.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use ts_rs::TS;

// ============================================================================
// Reported fields
// ============================================================================

/// A field as the backend reported it.
///
/// The endpoint omits some keys and sends `null` for others; the graph view
/// distinguishes the two when it renders tooltip text (`undefined` vs `null`).
#[derive(Debug, Clone, PartialEq)]
pub enum Reported<T> {
    /// Key missing from the record.
    Absent,
    /// Key present with a JSON `null`.
    Null,
    Present(T),
}

impl<T> Reported<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Reported::Absent)
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Reported::Present(value) => Some(value),
            _ => None,
        }
    }

    pub fn present(self) -> Option<T> {
        match self {
            Reported::Present(value) => Some(value),
            _ => None,
        }
    }
}

impl<T> Default for Reported<T> {
    fn default() -> Self {
        Reported::Absent
    }
}

impl<T> From<Option<T>> for Reported<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Reported::Present(value),
            None => Reported::Null,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Reported<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reported::Absent => f.write_str("undefined"),
            Reported::Null => f.write_str("null"),
            Reported::Present(value) => value.fmt(f),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Reported<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        // Missing keys never reach here; `#[serde(default)]` yields `Absent`.
        Option::<T>::deserialize(deserializer).map(Reported::from)
    }
}

impl<T: Serialize> Serialize for Reported<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Reported::Present(value) => value.serialize(serializer),
            _ => serializer.serialize_none(),
        }
    }
}

// ============================================================================
// Task instances
// ============================================================================

/// Per-task progress split, in percent of the bar. Segments may be left out.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../graph-ui/bindings/generated.ts")]
pub struct TaskProgress {
    #[serde(default, skip_serializing_if = "Reported::is_absent")]
    #[ts(type = "number | null")]
    pub completed: Reported<f64>,
    #[serde(default, skip_serializing_if = "Reported::is_absent")]
    #[ts(type = "number | null")]
    pub warning: Reported<f64>,
    #[serde(default, skip_serializing_if = "Reported::is_absent")]
    #[ts(type = "number | null")]
    pub failed: Reported<f64>,
    #[serde(default, skip_serializing_if = "Reported::is_absent")]
    #[ts(type = "number | null")]
    pub ready: Reported<f64>,
}

impl TaskProgress {
    pub fn new(completed: f64, warning: f64, failed: f64, ready: f64) -> Self {
        Self {
            completed: Reported::Present(completed),
            warning: Reported::Present(warning),
            failed: Reported::Present(failed),
            ready: Reported::Present(ready),
        }
    }
}

/// One execution record of a task within a DAG run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../graph-ui/bindings/generated.ts")]
pub struct TaskInstance {
    #[serde(default, skip_serializing_if = "Reported::is_absent")]
    #[ts(type = "string | null")]
    pub task_id: Reported<String>,

    /// ISO-8601 logical date of the run
    #[serde(default, skip_serializing_if = "Reported::is_absent")]
    #[ts(type = "string | null")]
    pub execution_date: Reported<String>,

    #[serde(default, skip_serializing_if = "Reported::is_absent")]
    #[ts(type = "string | null")]
    pub run_id: Reported<String>,

    /// Seconds
    #[serde(default, skip_serializing_if = "Reported::is_absent")]
    #[ts(type = "number | null")]
    pub duration: Reported<f64>,

    /// Run state label, passed through verbatim (e.g. "success", "up_for_retry")
    #[serde(default, skip_serializing_if = "Reported::is_absent")]
    #[ts(type = "string | null")]
    pub state: Reported<String>,

    #[serde(default, skip_serializing_if = "Reported::is_absent")]
    #[ts(type = "string | null")]
    pub start_date: Reported<String>,

    #[serde(default, skip_serializing_if = "Reported::is_absent")]
    #[ts(type = "string | null")]
    pub end_date: Reported<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub progress: Option<TaskProgress>,
}

/// Task-instance payload of the graph endpoint, keyed by task_id.
pub type TaskInstanceMap = BTreeMap<String, TaskInstance>;

/// Static task metadata from the page's `tasks` global.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "../../graph-ui/bindings/generated.ts")]
pub struct TaskMeta {
    /// Operator class name
    #[serde(default)]
    pub task_type: Option<String>,
    #[serde(default)]
    pub dag_id: Option<String>,
    #[serde(default)]
    pub extra_links: Vec<String>,
}

// ============================================================================
// Tests
// ============================================================================
