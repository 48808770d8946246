//! Browser bindings: the real page, the browser event loop and boot.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use futures_util::future::LocalBoxFuture;
use gloo_timers::callback::{Interval, Timeout};
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement};

use crate::api::HttpTaskInstanceSource;
use crate::controller::RefreshController;
use crate::datetime::DagTimezone;
use crate::interop::{bind_click, read_page_config, BrowserZone};
use crate::runtime::Runtime;
use crate::surface::{
    GraphSurface, REFRESH_BUTTON_ID, START_AUTO_REFRESH_BUTTON_ID, STOP_AUTO_REFRESH_BUTTON_ID,
};
use crate::tooltip::TooltipContext;
use crate::GraphUiError;

/// Attribute the graph renderer may set on node groups to name their task.
pub const TASK_ID_ATTR: &str = "data-task-id";

const NODE_SELECTOR: &str = "g.node";
const LABEL_SELECTOR: &str = "tspan";

// ============================================================================
// Surface
// ============================================================================

/// The rendered graph page.
///
/// Graph nodes are indexed once on attach: by `data-task-id` when the renderer
/// set it, otherwise by their label text. The first node wins on duplicates.
pub struct WebSurface {
    document: Document,
    nodes: HashMap<String, Element>,
}

impl WebSurface {
    pub fn attach(document: Document) -> Self {
        let nodes = index_task_nodes(&document);
        dioxus_logger::tracing::info!("Indexed {} graph nodes", nodes.len());
        Self { document, nodes }
    }

    fn html_element(&self, id: &str) -> Option<HtmlElement> {
        self.document
            .get_element_by_id(id)?
            .dyn_into::<HtmlElement>()
            .ok()
    }

    fn animate_out(&self, id: &str, duration_ms: u32) {
        let Some(element) = self.html_element(id) else {
            return;
        };
        let style = element.style();
        let _ = style.set_property("transition", &format!("opacity {duration_ms}ms"));
        let _ = style.set_property("opacity", "0");

        Timeout::new(duration_ms, move || {
            // Shown again while fading; leave it visible.
            if style.get_property_value("opacity").ok().as_deref() == Some("0") {
                let _ = style.set_property("display", "none");
            }
        })
        .forget();
    }
}

fn index_task_nodes(document: &Document) -> HashMap<String, Element> {
    let mut nodes = HashMap::new();
    let Ok(list) = document.query_selector_all(NODE_SELECTOR) else {
        return nodes;
    };

    for idx in 0..list.length() {
        let Some(element) = list.item(idx).and_then(|n| n.dyn_into::<Element>().ok()) else {
            continue;
        };
        let task_id = element
            .get_attribute(TASK_ID_ATTR)
            .or_else(|| label_text(&element));
        if let Some(task_id) = task_id {
            nodes.entry(task_id).or_insert(element);
        }
    }
    nodes
}

fn label_text(node: &Element) -> Option<String> {
    node.query_selector(LABEL_SELECTOR)
        .ok()
        .flatten()
        .and_then(|label| label.text_content())
}

fn default_display(element: &HtmlElement) -> &'static str {
    match element.tag_name().to_ascii_lowercase().as_str() {
        "button" | "a" | "span" => "inline-block",
        _ => "block",
    }
}

impl GraphSurface for WebSurface {
    fn has_task_node(&self, task_id: &str) -> bool {
        self.nodes.contains_key(task_id)
    }

    fn set_node_attribute(&mut self, task_id: &str, name: &str, value: &str) -> bool {
        let Some(node) = self.nodes.get(task_id) else {
            return false;
        };
        if let Err(e) = node.set_attribute(name, value) {
            dioxus_logger::tracing::warn!("Failed to set {} on node {}: {:?}", name, task_id, e);
        }
        true
    }

    fn element_exists(&self, id: &str) -> bool {
        self.document.get_element_by_id(id).is_some()
    }

    fn set_width(&mut self, id: &str, width: &str) {
        self.set_style(id, "width", width);
    }

    fn set_text(&mut self, id: &str, text: &str) {
        if let Some(element) = self.document.get_element_by_id(id) {
            element.set_text_content(Some(text));
        }
    }

    fn set_style(&mut self, id: &str, property: &str, value: &str) {
        if let Some(element) = self.html_element(id) {
            let _ = element.style().set_property(property, value);
        }
    }

    fn show(&mut self, id: &str) {
        if let Some(element) = self.html_element(id) {
            let style = element.style();
            let _ = style.remove_property("transition");
            let _ = style.remove_property("opacity");
            let _ = style.set_property("display", default_display(&element));
        }
    }

    fn hide(&mut self, id: &str) {
        self.set_style(id, "display", "none");
    }

    fn hide_animated(&mut self, id: &str, duration_ms: u32) {
        self.animate_out(id, duration_ms);
    }

    fn fade_out(&mut self, id: &str, duration_ms: u32) {
        self.animate_out(id, duration_ms);
    }
}

// ============================================================================
// Runtime
// ============================================================================

/// Browser event loop: `spawn_local` plus gloo timers.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserRuntime;

impl Runtime for BrowserRuntime {
    type Interval = Interval;

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        wasm_bindgen_futures::spawn_local(task);
    }

    fn set_interval(&self, period_ms: u32, tick: Box<dyn FnMut()>) -> Interval {
        Interval::new(period_ms, tick)
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) {
        Timeout::new(delay_ms, callback).forget();
    }
}

// ============================================================================
// Boot
// ============================================================================

pub type BrowserController = RefreshController<WebSurface, HttpTaskInstanceSource, BrowserRuntime>;

/// Attaches the refresh loop to the current page: reads the page globals,
/// indexes the graph, binds the buttons and applies the initial records.
pub fn boot() -> Result<BrowserController, GraphUiError> {
    let window = web_sys::window().ok_or(GraphUiError::NoWindow)?;
    let document = window.document().ok_or(GraphUiError::NoDocument)?;
    let config = read_page_config(&window)?;

    let source = HttpTaskInstanceSource::new(
        config.task_instance_url.clone(),
        config.task_instance_params(),
    );
    let refresh_rate = config.refresh_rate();
    let initial = config.task_instances();
    let tooltip = TooltipContext::new(
        config.tasks,
        DagTimezone::parse(&config.dag_tz),
        Rc::new(BrowserZone),
    );
    let surface = Rc::new(RefCell::new(WebSurface::attach(document.clone())));
    let controller = RefreshController::new(surface, source, BrowserRuntime, tooltip, refresh_rate);

    let refresh = controller.clone();
    bind_click(&document, REFRESH_BUTTON_ID, move || refresh.refresh());
    let stop = controller.clone();
    bind_click(&document, STOP_AUTO_REFRESH_BUTTON_ID, move || stop.stop());
    let start = controller.clone();
    bind_click(&document, START_AUTO_REFRESH_BUTTON_ID, move || start.start());

    controller.initialize(&initial);
    Ok(controller)
}
