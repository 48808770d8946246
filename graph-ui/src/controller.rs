//! Refresh controller
//!
//! Owns the polling loop of the graph view: the manual refresh button, the
//! automatic refresh timer and its start/stop buttons. Responses are applied in
//! arrival order; a request already in flight still lands after `stop()`.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use shared_types::TaskInstanceMap;

use crate::api::TaskInstanceSource;
use crate::banner::ErrorBanner;
use crate::runtime::Runtime;
use crate::surface::{
    GraphSurface, ERROR_ID, LOADING_ID, START_AUTO_REFRESH_BUTTON_ID,
    STOP_AUTO_REFRESH_BUTTON_ID, SVG_CONTAINER_ID,
};
use crate::tooltip::TooltipContext;
use crate::updater::update_node_states;

/// Interval used by the start button when the page disabled auto-refresh.
pub const DEFAULT_REFRESH_MS: u32 = 3_000;

const DIMMED_OPACITY: &str = "0.2";

/// Auto-refresh period from the page's `refresh_rate`, in milliseconds.
/// Zero or negative disables auto-start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshRate(pub i64);

impl RefreshRate {
    /// Period to start with on page load, if auto-refresh is enabled.
    pub fn auto_start_ms(self) -> Option<u32> {
        if self.0 > 0 {
            Some(u32::try_from(self.0).unwrap_or(u32::MAX))
        } else {
            None
        }
    }

    /// Period used when the user starts auto-refresh explicitly.
    pub fn period_ms(self) -> u32 {
        self.auto_start_ms().unwrap_or(DEFAULT_REFRESH_MS)
    }
}

struct ControllerInner<S, F, R: Runtime> {
    surface: Rc<RefCell<S>>,
    source: F,
    runtime: R,
    tooltip: TooltipContext,
    refresh_rate: RefreshRate,
    banner: ErrorBanner,
    timer: RefCell<Option<R::Interval>>,
}

/// Handle to the refresh loop. Clones share the same state.
pub struct RefreshController<S, F, R: Runtime> {
    inner: Rc<ControllerInner<S, F, R>>,
}

impl<S, F, R: Runtime> Clone for RefreshController<S, F, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S, F, R> RefreshController<S, F, R>
where
    S: GraphSurface + 'static,
    F: TaskInstanceSource + 'static,
    R: Runtime + 'static,
{
    pub fn new(
        surface: Rc<RefCell<S>>,
        source: F,
        runtime: R,
        tooltip: TooltipContext,
        refresh_rate: RefreshRate,
    ) -> Self {
        Self {
            inner: Rc::new(ControllerInner {
                surface,
                source,
                runtime,
                tooltip,
                refresh_rate,
                banner: ErrorBanner::default(),
                timer: RefCell::new(None),
            }),
        }
    }

    pub fn surface(&self) -> &Rc<RefCell<S>> {
        &self.inner.surface
    }

    /// Applies the records embedded in the page and starts auto-refresh when
    /// the page asked for it. Buttons are left as rendered.
    pub fn initialize(&self, initial: &TaskInstanceMap) {
        self.apply(initial);
        match self.inner.refresh_rate.auto_start_ms() {
            Some(period_ms) => {
                dioxus_logger::tracing::info!("Auto-refreshing graph every {}ms", period_ms);
                self.start_timer(period_ms);
            }
            None => dioxus_logger::tracing::info!("Graph auto-refresh disabled"),
        }
    }

    /// Applies a snapshot to the graph nodes.
    pub fn apply(&self, task_instances: &TaskInstanceMap) -> usize {
        update_node_states(
            &mut *self.inner.surface.borrow_mut(),
            task_instances,
            &self.inner.tooltip,
        )
    }

    /// Manual refresh: dims the graph while the request runs and reports
    /// failures in the error banner.
    pub fn refresh(&self) {
        {
            let mut surface = self.inner.surface.borrow_mut();
            surface.show(LOADING_ID);
            surface.set_style(SVG_CONTAINER_ID, "opacity", DIMMED_OPACITY);
        }

        let request = self.inner.source.fetch();
        let inner = Rc::clone(&self.inner);
        self.inner.runtime.spawn(Box::pin(async move {
            let controller = RefreshController { inner };
            match request.await {
                Ok(task_instances) => {
                    controller.apply(&task_instances);
                    let mut surface = controller.inner.surface.borrow_mut();
                    surface.hide(LOADING_ID);
                    surface.set_style(SVG_CONTAINER_ID, "opacity", "1");
                    surface.hide(ERROR_ID);
                }
                Err(e) => {
                    controller.inner.banner.report(
                        &controller.inner.surface,
                        &controller.inner.runtime,
                        &e.to_string(),
                    );
                }
            }
        }));
    }

    /// Timer-driven refresh. Failures are not shown to the user.
    pub fn auto_refresh(&self) {
        let request = self.inner.source.fetch();
        let inner = Rc::clone(&self.inner);
        self.inner.runtime.spawn(Box::pin(async move {
            let controller = RefreshController { inner };
            match request.await {
                Ok(task_instances) => {
                    controller.apply(&task_instances);
                }
                Err(e) => {
                    dioxus_logger::tracing::debug!("Auto-refresh failed: {}", e);
                }
            }
        }));
    }

    /// Stop button: cancels the timer and swaps the buttons.
    pub fn stop(&self) {
        if self.inner.timer.borrow_mut().take().is_some() {
            dioxus_logger::tracing::info!("Graph auto-refresh stopped");
        }
        let mut surface = self.inner.surface.borrow_mut();
        surface.hide(STOP_AUTO_REFRESH_BUTTON_ID);
        surface.show(START_AUTO_REFRESH_BUTTON_ID);
    }

    /// Start button: (re)starts the timer and swaps the buttons.
    pub fn start(&self) {
        let period_ms = self.inner.refresh_rate.period_ms();
        dioxus_logger::tracing::info!("Graph auto-refresh started ({}ms)", period_ms);
        self.start_timer(period_ms);
        let mut surface = self.inner.surface.borrow_mut();
        surface.hide(START_AUTO_REFRESH_BUTTON_ID);
        surface.show(STOP_AUTO_REFRESH_BUTTON_ID);
    }

    /// Keeps the refresh loop running for the lifetime of the page, whether or
    /// not any button holds a handle to it.
    pub fn keep_alive(self) {
        std::mem::forget(self);
    }

    pub fn is_auto_refreshing(&self) -> bool {
        self.inner.timer.borrow().is_some()
    }

    fn start_timer(&self, period_ms: u32) {
        let weak: Weak<ControllerInner<S, F, R>> = Rc::downgrade(&self.inner);
        let interval = self.inner.runtime.set_interval(
            period_ms,
            Box::new(move || {
                if let Some(inner) = weak.upgrade() {
                    RefreshController { inner }.auto_refresh();
                }
            }),
        );
        // Replacing the handle drops, and so cancels, any previous timer.
        *self.inner.timer.borrow_mut() = Some(interval);
    }
}
