//! DOM contract of the graph page
//!
//! Everything this crate changes on the page goes through [`GraphSurface`]. The
//! browser implementation lives in [`crate::web::WebSurface`]; tests use an
//! in-memory table.

pub const LOADING_ID: &str = "loading";
pub const ERROR_ID: &str = "error";
pub const ERROR_MSG_ID: &str = "error_msg";
pub const CHART_SECTION_ID: &str = "chart_section";
pub const DATATABLE_SECTION_ID: &str = "datatable_section";
pub const SVG_CONTAINER_ID: &str = "svg_container";
pub const REFRESH_BUTTON_ID: &str = "refresh_button";
pub const STOP_AUTO_REFRESH_BUTTON_ID: &str = "stop_auto_refresh_button";
pub const START_AUTO_REFRESH_BUTTON_ID: &str = "start_auto_refresh_button";

/// Class attribute of a graph node is this prefix followed by the run state.
pub const NODE_CLASS_PREFIX: &str = "node enter ";

/// Attribute read by the tooltip plugin to decide which elements get a tooltip.
pub const TOOLTIP_TOGGLE_ATTR: &str = "data-toggle";
/// Attribute holding the tooltip HTML.
pub const TOOLTIP_TITLE_ATTR: &str = "data-original-title";

/// Id of the progress bar container rendered for a task, if any.
pub fn progress_bar_id(task_id: &str) -> String {
    format!("progress_{task_id}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressSegment {
    Completed,
    Warning,
    Failed,
    Ready,
}

impl ProgressSegment {
    pub const ALL: [ProgressSegment; 4] = [
        ProgressSegment::Completed,
        ProgressSegment::Warning,
        ProgressSegment::Failed,
        ProgressSegment::Ready,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProgressSegment::Completed => "completed",
            ProgressSegment::Warning => "warning",
            ProgressSegment::Failed => "failed",
            ProgressSegment::Ready => "ready",
        }
    }

    pub fn element_id(self, task_id: &str) -> String {
        format!("progress_{}_{task_id}", self.as_str())
    }
}

/// Mutations the refresh loop performs on the rendered page.
///
/// Element ids are plain ids (no `#`). Operations on ids that do not exist are
/// no-ops, matching how a selector with no match behaves on the page.
pub trait GraphSurface {
    /// Whether a graph node is bound to `task_id`.
    fn has_task_node(&self, task_id: &str) -> bool;

    /// Sets an attribute on the node bound to `task_id`. Returns `false` when no
    /// node is rendered for it.
    fn set_node_attribute(&mut self, task_id: &str, name: &str, value: &str) -> bool;

    fn element_exists(&self, id: &str) -> bool;

    /// Sets the CSS width of an element, e.g. `"40%"`.
    fn set_width(&mut self, id: &str, width: &str);

    /// Replaces the text content of an element.
    fn set_text(&mut self, id: &str, text: &str);

    fn set_style(&mut self, id: &str, property: &str, value: &str);

    fn show(&mut self, id: &str);

    fn hide(&mut self, id: &str);

    /// Collapses an element over `duration_ms`, ending hidden.
    fn hide_animated(&mut self, id: &str, duration_ms: u32);

    /// Fades an element out over `duration_ms`, ending hidden.
    fn fade_out(&mut self, id: &str, duration_ms: u32);
}
