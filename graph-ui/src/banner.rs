use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::runtime::Runtime;
use crate::surface::{
    GraphSurface, CHART_SECTION_ID, DATATABLE_SECTION_ID, ERROR_ID, ERROR_MSG_ID, LOADING_ID,
};

/// How long the error banner stays up before fading.
pub const ERROR_AUTO_HIDE_MS: u32 = 10_000;
pub const ERROR_FADE_MS: u32 = 600;
pub const SECTION_HIDE_MS: u32 = 1_000;

/// The error banner. Each report restarts the auto-hide delay; fades
/// scheduled for earlier reports are ignored.
#[derive(Debug, Clone, Default)]
pub struct ErrorBanner {
    generation: Rc<Cell<u64>>,
}

impl ErrorBanner {
    /// Shows `message` in the error banner and collapses the chart and table.
    ///
    /// The banner fades out on its own [`ERROR_AUTO_HIDE_MS`] after the latest
    /// report.
    pub fn report<S, R>(&self, surface: &Rc<RefCell<S>>, runtime: &R, message: &str)
    where
        S: GraphSurface + 'static,
        R: Runtime + ?Sized,
    {
        dioxus_logger::tracing::warn!("Graph refresh failed: {}", message);

        {
            let mut surface = surface.borrow_mut();
            surface.set_text(ERROR_MSG_ID, message);
            surface.show(ERROR_ID);
        }

        let generation = self.generation.get().wrapping_add(1);
        self.generation.set(generation);
        let current = Rc::clone(&self.generation);
        let fading = Rc::clone(surface);
        runtime.set_timeout(
            ERROR_AUTO_HIDE_MS,
            Box::new(move || {
                if current.get() == generation {
                    fading.borrow_mut().fade_out(ERROR_ID, ERROR_FADE_MS);
                }
            }),
        );

        let mut surface = surface.borrow_mut();
        surface.hide(LOADING_ID);
        surface.hide_animated(CHART_SECTION_ID, SECTION_HIDE_MS);
        surface.hide_animated(DATATABLE_SECTION_ID, SECTION_HIDE_MS);
    }
}
