use futures_util::future::LocalBoxFuture;

/// Event-loop services the refresh loop runs on.
///
/// Everything is single-threaded; callbacks never run concurrently with each
/// other.
pub trait Runtime {
    /// Handle of a repeating timer. Dropping it cancels the timer.
    type Interval;

    /// Runs a future to completion in the background.
    fn spawn(&self, task: LocalBoxFuture<'static, ()>);

    /// Calls `tick` every `period_ms` until the returned handle is dropped.
    fn set_interval(&self, period_ms: u32, tick: Box<dyn FnMut()>) -> Self::Interval;

    /// Calls `callback` once after `delay_ms`.
    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>);
}
