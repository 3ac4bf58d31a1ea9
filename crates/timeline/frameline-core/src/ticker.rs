//! Tickers: sources of elapsed wall time.
//!
//! A ticker knows nothing about frames. It hands its callback a delta in
//! milliseconds each time it steps. Implementations must never invoke the
//! callback from inside `start`.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Instant;

pub type TickCallback = Box<dyn FnMut(f64)>;

pub trait Ticker {
    /// Begin delivering deltas to `on_tick`, replacing any previous callback.
    fn start(&mut self, on_tick: TickCallback);
    fn stop(&mut self);
    fn is_running(&self) -> bool;
}

#[derive(Default)]
struct ManualInner {
    callback: Option<TickCallback>,
    running: bool,
    /// Bumped on every start/stop so a callback that restarts or stops the
    /// ticker from inside a tick is not overwritten when the tick returns.
    generation: u64,
}

/// Deterministic ticker stepped explicitly by the host. Clones share state, so a
/// host keeps one clone and hands another to the engine.
#[derive(Clone, Default)]
pub struct ManualTicker {
    inner: Rc<RefCell<ManualInner>>,
}

impl ManualTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver one delta. Returns false when not running.
    pub fn tick(&self, delta_ms: f64) -> bool {
        let (mut callback, generation) = {
            let mut inner = self.inner.borrow_mut();
            if !inner.running {
                return false;
            }
            match inner.callback.take() {
                Some(cb) => (cb, inner.generation),
                None => return false,
            }
        };
        callback(delta_ms);
        let mut inner = self.inner.borrow_mut();
        if inner.running && inner.generation == generation && inner.callback.is_none() {
            inner.callback = Some(callback);
        }
        true
    }

    /// Deliver `count` equal deltas, stopping early if the ticker stops.
    pub fn tick_n(&self, count: usize, delta_ms: f64) -> usize {
        let mut delivered = 0;
        for _ in 0..count {
            if !self.tick(delta_ms) {
                break;
            }
            delivered += 1;
        }
        delivered
    }
}

impl Ticker for ManualTicker {
    fn start(&mut self, on_tick: TickCallback) {
        let mut inner = self.inner.borrow_mut();
        inner.callback = Some(on_tick);
        inner.running = true;
        inner.generation = inner.generation.wrapping_add(1);
    }

    fn stop(&mut self) {
        let mut inner = self.inner.borrow_mut();
        inner.callback = None;
        inner.running = false;
        inner.generation = inner.generation.wrapping_add(1);
    }

    fn is_running(&self) -> bool {
        self.inner.borrow().running
    }
}

/// Measures real elapsed time between host `pump` calls (e.g. once per
/// animation frame). The first pump after `start` only establishes the origin.
#[derive(Clone, Default)]
pub struct WallClockTicker {
    steps: ManualTicker,
    last: Rc<Cell<Option<Instant>>>,
}

impl WallClockTicker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pump(&self) -> bool {
        if !self.steps.is_running() {
            return false;
        }
        let now = Instant::now();
        match self.last.replace(Some(now)) {
            Some(prev) => self.steps.tick(now.duration_since(prev).as_secs_f64() * 1000.0),
            None => true,
        }
    }
}

impl Ticker for WallClockTicker {
    fn start(&mut self, on_tick: TickCallback) {
        self.last.set(None);
        self.steps.start(on_tick);
    }

    fn stop(&mut self) {
        self.steps.stop();
        self.last.set(None);
    }

    fn is_running(&self) -> bool {
        self.steps.is_running()
    }
}
