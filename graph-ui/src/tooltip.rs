use std::collections::HashMap;
use std::rc::Rc;

use shared_types::{TaskInstance, TaskMeta};

use crate::datetime::{format_utc, tooltip_datetime, DagTimezone, LocalZone};

/// Everything besides the record itself that a tooltip needs.
#[derive(Debug, Clone)]
pub struct TooltipContext {
    pub tasks: HashMap<String, TaskMeta>,
    pub dag_tz: DagTimezone,
    pub local: Rc<dyn LocalZone>,
}

impl TooltipContext {
    pub fn new(
        tasks: HashMap<String, TaskMeta>,
        dag_tz: DagTimezone,
        local: Rc<dyn LocalZone>,
    ) -> Self {
        if let DagTimezone::Unknown(name) = &dag_tz {
            dioxus_logger::tracing::warn!(
                "Cannot resolve DAG timezone {}; tooltips show UTC and local time only",
                name
            );
        }
        Self {
            tasks,
            dag_tz,
            local,
        }
    }

    /// Operator name for a task; `undefined` when the page has no metadata for it.
    fn task_type(&self, task_id: &str) -> &str {
        self.tasks
            .get(task_id)
            .and_then(|meta| meta.task_type.as_deref())
            .unwrap_or("undefined")
    }
}

/// Builds the tooltip HTML for the node of `task_id`.
///
/// Missing fields are rendered as `undefined` and nulls as `null`; the run_id
/// line is only emitted when a run_id is present.
pub fn build_tooltip(task_id: &str, ti: &TaskInstance, ctx: &TooltipContext) -> String {
    let mut tt = format!("Task_id: {}<br>", ti.task_id);
    tt.push_str(&format!("Run: {}<br>", format_utc(&ti.execution_date)));
    if let Some(run_id) = ti.run_id.as_option() {
        tt.push_str(&format!("run_id: <nobr>{run_id}</nobr><br>"));
    }
    tt.push_str(&format!("Operator: {}<br>", ctx.task_type(task_id)));
    tt.push_str(&format!("Duration: {}<br>", ti.duration));
    tt.push_str(&format!("State: {}<br>", ti.state));
    tt.push_str(&tooltip_datetime(
        &ti.start_date,
        &ti.end_date,
        &ctx.dag_tz,
        &*ctx.local,
    ));
    tt
}
