use chrono::{DateTime, FixedOffset, Offset, Utc};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{Document, MouseEvent, Window};

use crate::config::{GraphPageConfig, GLOBAL_NAMES};
use crate::datetime::LocalZone;
use crate::GraphUiError;

/// Calls `handler` on every click of the element with `id`.
///
/// A missing element is logged and skipped; the page may omit a button.
pub fn bind_click<F>(document: &Document, id: &str, mut handler: F)
where
    F: FnMut() + 'static,
{
    let Some(element) = document.get_element_by_id(id) else {
        log::warn!("No #{} element to bind a click handler to", id);
        return;
    };

    let click_closure = Closure::wrap(Box::new(move |_e: MouseEvent| {
        handler();
    }) as Box<dyn FnMut(MouseEvent)>);

    if let Err(e) =
        element.add_event_listener_with_callback("click", click_closure.as_ref().unchecked_ref())
    {
        log::warn!("Failed to add click listener to #{}: {:?}", id, e);
        return;
    }

    // Leak the closure to keep it alive for the lifetime of the page
    click_closure.forget();
}

/// Reads a page global as JSON. `undefined` globals yield `None`.
fn read_global(window: &Window, name: &'static str) -> Result<Option<serde_json::Value>, GraphUiError> {
    let value = js_sys::Reflect::get(window, &JsValue::from_str(name))
        .map_err(|e| GraphUiError::InvalidConfig(format!("{name}: {e:?}")))?;
    if value.is_undefined() {
        return Ok(None);
    }

    let json = js_sys::JSON::stringify(&value)
        .map_err(|e| GraphUiError::InvalidConfig(format!("{name}: {e:?}")))?;
    let Some(json) = json.as_string() else {
        return Ok(None);
    };
    serde_json::from_str(&json)
        .map(Some)
        .map_err(|e| GraphUiError::InvalidConfig(format!("{name}: {e}")))
}

/// Collects the graph view's globals from `window`.
pub fn read_page_config(window: &Window) -> Result<GraphPageConfig, GraphUiError> {
    let mut globals = serde_json::Map::new();
    for name in GLOBAL_NAMES {
        if let Some(value) = read_global(window, name)? {
            globals.insert(name.to_string(), value);
        }
    }
    GraphPageConfig::from_globals(serde_json::Value::Object(globals))
}

/// The browser's local timezone, asked per instant through `Date`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserZone;

impl LocalZone for BrowserZone {
    fn offset_at(&self, instant: &DateTime<Utc>) -> FixedOffset {
        let date = js_sys::Date::new(&JsValue::from_f64(instant.timestamp_millis() as f64));
        // getTimezoneOffset is minutes *behind* UTC
        let seconds_east = (-date.get_timezone_offset() * 60.0) as i32;
        FixedOffset::east_opt(seconds_east).unwrap_or(Utc.fix())
    }
}
