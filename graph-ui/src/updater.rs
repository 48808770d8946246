//! Node-state updater
//!
//! Applies polled task-instance records to the graph nodes that are already on
//! the page: state class, tooltip and progress-bar widths.

use shared_types::{TaskInstance, TaskInstanceMap};

use crate::surface::{
    progress_bar_id, GraphSurface, ProgressSegment, NODE_CLASS_PREFIX, TOOLTIP_TITLE_ATTR,
    TOOLTIP_TOGGLE_ATTR,
};
use crate::tooltip::{build_tooltip, TooltipContext};

/// Applies every record to its node. Records without a rendered node are
/// skipped. Returns how many nodes were updated.
pub fn update_node_states<S>(
    surface: &mut S,
    task_instances: &TaskInstanceMap,
    ctx: &TooltipContext,
) -> usize
where
    S: GraphSurface + ?Sized,
{
    let mut updated = 0;
    for (task_id, ti) in task_instances {
        if apply_task_instance(surface, task_id, ti, ctx) {
            updated += 1;
        }
    }
    dioxus_logger::tracing::debug!(
        "Updated {} of {} graph nodes",
        updated,
        task_instances.len()
    );
    updated
}

fn apply_task_instance<S>(surface: &mut S, task_id: &str, ti: &TaskInstance, ctx: &TooltipContext) -> bool
where
    S: GraphSurface + ?Sized,
{
    if !surface.has_task_node(task_id) {
        return false;
    }

    let class = format!("{NODE_CLASS_PREFIX}{}", ti.state);
    surface.set_node_attribute(task_id, "class", &class);
    surface.set_node_attribute(task_id, TOOLTIP_TOGGLE_ATTR, "tooltip");
    let tooltip = build_tooltip(task_id, ti, ctx);
    surface.set_node_attribute(task_id, TOOLTIP_TITLE_ATTR, &tooltip);

    if surface.element_exists(&progress_bar_id(task_id)) {
        match &ti.progress {
            Some(progress) => {
                for segment in ProgressSegment::ALL {
                    let value = match segment {
                        ProgressSegment::Completed => &progress.completed,
                        ProgressSegment::Warning => &progress.warning,
                        ProgressSegment::Failed => &progress.failed,
                        ProgressSegment::Ready => &progress.ready,
                    };
                    // `undefined%` is not a width; the segment keeps its current one.
                    if let Some(value) = value.as_option() {
                        surface.set_width(&segment.element_id(task_id), &format!("{value}%"));
                    }
                }
            }
            None => {
                dioxus_logger::tracing::warn!(
                    "Task {} has a progress bar but no progress in its record",
                    task_id
                );
            }
        }
    }

    true
}
