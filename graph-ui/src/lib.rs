pub mod api;
pub mod banner;
pub mod config;
pub mod controller;
pub mod datetime;
pub mod interop;
pub mod runtime;
pub mod surface;
pub mod tooltip;
pub mod updater;
pub mod web;

#[cfg(test)]
pub(crate) mod testing;

pub use api::*;
pub use controller::*;
pub use surface::GraphSurface;
pub use updater::update_node_states;
pub use web::{boot, BrowserController};

use thiserror::Error;

/// Failures while attaching the graph view to the page.
#[derive(Debug, Error)]
pub enum GraphUiError {
    #[error("no global `window` exists")]
    NoWindow,
    #[error("no document on window")]
    NoDocument,
    #[error("page global `{0}` is not defined")]
    MissingGlobal(&'static str),
    #[error("invalid page configuration: {0}")]
    InvalidConfig(String),
}
