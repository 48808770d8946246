//! In-memory doubles for the page, the event loop and the endpoint.

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use futures::channel::oneshot;
use futures::executor::{LocalPool, LocalSpawner};
use futures::task::LocalSpawnExt;
use futures_util::future::LocalBoxFuture;
use shared_types::TaskInstanceMap;

use crate::api::{FetchError, TaskInstanceSource};
use crate::runtime::Runtime;
use crate::surface::GraphSurface;

// ============================================================================
// Surface
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct MemoryElement {
    pub text: String,
    pub styles: BTreeMap<String, String>,
    pub visible: bool,
    /// Duration of the last animated hide, if any.
    pub last_transition_ms: Option<u32>,
}

impl Default for MemoryElement {
    fn default() -> Self {
        Self {
            text: String::new(),
            styles: BTreeMap::new(),
            visible: true,
            last_transition_ms: None,
        }
    }
}

/// Page made of graph nodes (keyed by task_id) and plain elements (keyed by id).
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemorySurface {
    nodes: BTreeMap<String, BTreeMap<String, String>>,
    elements: BTreeMap<String, MemoryElement>,
}

impl MemorySurface {
    pub fn with_nodes(task_ids: &[&str]) -> Self {
        let mut surface = Self::default();
        for task_id in task_ids {
            surface
                .nodes
                .insert((*task_id).to_string(), BTreeMap::new());
        }
        surface
    }

    pub fn add_element(&mut self, id: &str) {
        self.elements
            .insert(id.to_string(), MemoryElement::default());
    }

    pub fn node_attr(&self, task_id: &str, name: &str) -> Option<&str> {
        self.nodes.get(task_id)?.get(name).map(String::as_str)
    }

    pub fn style(&self, id: &str, property: &str) -> Option<&str> {
        self.elements.get(id)?.styles.get(property).map(String::as_str)
    }

    pub fn text(&self, id: &str) -> Option<&str> {
        self.elements.get(id).map(|el| el.text.as_str())
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.elements.get(id).is_some_and(|el| el.visible)
    }

    pub fn element(&self, id: &str) -> Option<&MemoryElement> {
        self.elements.get(id)
    }
}

impl GraphSurface for MemorySurface {
    fn has_task_node(&self, task_id: &str) -> bool {
        self.nodes.contains_key(task_id)
    }

    fn set_node_attribute(&mut self, task_id: &str, name: &str, value: &str) -> bool {
        match self.nodes.get_mut(task_id) {
            Some(attrs) => {
                attrs.insert(name.to_string(), value.to_string());
                true
            }
            None => false,
        }
    }

    fn element_exists(&self, id: &str) -> bool {
        self.elements.contains_key(id)
    }

    fn set_width(&mut self, id: &str, width: &str) {
        self.set_style(id, "width", width);
    }

    fn set_text(&mut self, id: &str, text: &str) {
        if let Some(el) = self.elements.get_mut(id) {
            el.text = text.to_string();
        }
    }

    fn set_style(&mut self, id: &str, property: &str, value: &str) {
        if let Some(el) = self.elements.get_mut(id) {
            el.styles.insert(property.to_string(), value.to_string());
        }
    }

    fn show(&mut self, id: &str) {
        if let Some(el) = self.elements.get_mut(id) {
            el.visible = true;
        }
    }

    fn hide(&mut self, id: &str) {
        if let Some(el) = self.elements.get_mut(id) {
            el.visible = false;
        }
    }

    fn hide_animated(&mut self, id: &str, duration_ms: u32) {
        if let Some(el) = self.elements.get_mut(id) {
            el.visible = false;
            el.last_transition_ms = Some(duration_ms);
        }
    }

    fn fade_out(&mut self, id: &str, duration_ms: u32) {
        self.hide_animated(id, duration_ms);
    }
}

// ============================================================================
// Runtime
// ============================================================================

struct ScheduledInterval {
    period: u64,
    due: u64,
    alive: Rc<Cell<bool>>,
    tick: Rc<RefCell<Box<dyn FnMut()>>>,
}

struct ScheduledTimeout {
    due: u64,
    seq: u64,
    callback: Box<dyn FnOnce()>,
}

#[derive(Default)]
struct Clock {
    now: u64,
    next_seq: u64,
    intervals: Vec<ScheduledInterval>,
    timeouts: Vec<ScheduledTimeout>,
}

enum Due {
    Interval(Rc<RefCell<Box<dyn FnMut()>>>),
    Timeout(Box<dyn FnOnce()>),
}

impl Clock {
    /// Pops the earliest callback due at or before `until`, moving `now` to it.
    fn next_due(&mut self, until: u64) -> Option<Due> {
        self.intervals.retain(|interval| interval.alive.get());

        let interval = self
            .intervals
            .iter_mut()
            .filter(|interval| interval.due <= until)
            .min_by_key(|interval| interval.due);
        let timeout_idx = self
            .timeouts
            .iter()
            .enumerate()
            .filter(|(_, timeout)| timeout.due <= until)
            .min_by_key(|(_, timeout)| (timeout.due, timeout.seq))
            .map(|(idx, _)| idx);

        match (interval, timeout_idx) {
            (Some(interval), Some(idx)) if interval.due < self.timeouts[idx].due => {
                Some(fire_interval(&mut self.now, interval))
            }
            (_, Some(idx)) => {
                let timeout = self.timeouts.remove(idx);
                self.now = timeout.due;
                Some(Due::Timeout(timeout.callback))
            }
            (Some(interval), None) => Some(fire_interval(&mut self.now, interval)),
            (None, None) => None,
        }
    }
}

fn fire_interval(now: &mut u64, interval: &mut ScheduledInterval) -> Due {
    *now = interval.due;
    interval.due += interval.period;
    Due::Interval(Rc::clone(&interval.tick))
}

pub struct ManualInterval {
    alive: Rc<Cell<bool>>,
}

impl Drop for ManualInterval {
    fn drop(&mut self) {
        self.alive.set(false);
    }
}

struct ManualInner {
    clock: RefCell<Clock>,
    pool: RefCell<LocalPool>,
    spawner: LocalSpawner,
}

/// Event loop driven by the test: virtual time plus a local executor.
#[derive(Clone)]
pub struct ManualRuntime {
    inner: Rc<ManualInner>,
}

impl ManualRuntime {
    pub fn new() -> Self {
        let pool = LocalPool::new();
        let spawner = pool.spawner();
        Self {
            inner: Rc::new(ManualInner {
                clock: RefCell::new(Clock::default()),
                pool: RefCell::new(pool),
                spawner,
            }),
        }
    }

    pub fn now(&self) -> u64 {
        self.inner.clock.borrow().now
    }

    pub fn active_intervals(&self) -> usize {
        self.inner
            .clock
            .borrow()
            .intervals
            .iter()
            .filter(|interval| interval.alive.get())
            .count()
    }

    /// Polls spawned tasks until none can make progress.
    pub fn run_until_stalled(&self) {
        self.inner.pool.borrow_mut().run_until_stalled();
    }

    /// Moves virtual time forward, firing due timers in order.
    pub fn advance(&self, ms: u32) {
        let until = self.now() + u64::from(ms);
        loop {
            let due = self.inner.clock.borrow_mut().next_due(until);
            match due {
                Some(Due::Interval(shared)) => {
                    let mut tick = shared.borrow_mut();
                    (&mut **tick)();
                }
                Some(Due::Timeout(callback)) => callback(),
                None => break,
            }
            self.run_until_stalled();
        }
        self.inner.clock.borrow_mut().now = until;
    }
}

impl Runtime for ManualRuntime {
    type Interval = ManualInterval;

    fn spawn(&self, task: LocalBoxFuture<'static, ()>) {
        if let Err(e) = self.inner.spawner.spawn_local(task) {
            panic!("local pool shut down: {e:?}");
        }
    }

    fn set_interval(&self, period_ms: u32, tick: Box<dyn FnMut()>) -> ManualInterval {
        let alive = Rc::new(Cell::new(true));
        let mut clock = self.inner.clock.borrow_mut();
        let period = u64::from(period_ms.max(1));
        let due = clock.now + period;
        clock.intervals.push(ScheduledInterval {
            period,
            due,
            alive: Rc::clone(&alive),
            tick: Rc::new(RefCell::new(tick)),
        });
        ManualInterval { alive }
    }

    fn set_timeout(&self, delay_ms: u32, callback: Box<dyn FnOnce()>) {
        let mut clock = self.inner.clock.borrow_mut();
        let due = clock.now + u64::from(delay_ms);
        let seq = clock.next_seq;
        clock.next_seq += 1;
        clock.timeouts.push(ScheduledTimeout { due, seq, callback });
    }
}

// ============================================================================
// Source
// ============================================================================

type Reply = Result<TaskInstanceMap, FetchError>;

/// Endpoint whose requests stay in flight until the test answers them.
#[derive(Clone, Default)]
pub struct GatedSource {
    pending: Rc<RefCell<VecDeque<oneshot::Sender<Reply>>>>,
    calls: Rc<Cell<usize>>,
}

impl GatedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }

    pub fn in_flight(&self) -> usize {
        self.pending.borrow().len()
    }

    /// Answers the oldest request still in flight.
    pub fn resolve_oldest(&self, reply: Reply) {
        let sender = self.pending.borrow_mut().pop_front();
        if let Some(sender) = sender {
            let _ = sender.send(reply);
        }
    }

    /// Answers the newest request still in flight.
    pub fn resolve_newest(&self, reply: Reply) {
        let sender = self.pending.borrow_mut().pop_back();
        if let Some(sender) = sender {
            let _ = sender.send(reply);
        }
    }
}

impl TaskInstanceSource for GatedSource {
    fn fetch(&self) -> LocalBoxFuture<'static, Reply> {
        let (tx, rx) = oneshot::channel();
        self.pending.borrow_mut().push_back(tx);
        self.calls.set(self.calls.get() + 1);
        Box::pin(async move {
            rx.await
                .unwrap_or_else(|_| Err(FetchError::Network("request dropped".to_string())))
        })
    }
}
