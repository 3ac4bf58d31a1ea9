//! External clocks and the virtual-time override channel.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use crate::ids::HookId;
use crate::ticker::Ticker;

/// A host monotonic timeline (e.g. a document timeline) read once per host frame.
pub trait TimelineClock {
    /// Milliseconds, or `None` while the clock is inactive.
    fn current_time_ms(&self) -> Option<f64>;
}

/// Clock whose value is set by hand. Clones share the value.
#[derive(Clone, Default, Debug)]
pub struct ManualClock {
    time: Rc<Cell<Option<f64>>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, time_ms: Option<f64>) {
        self.time.set(time_ms);
    }
}

impl TimelineClock for ManualClock {
    fn current_time_ms(&self) -> Option<f64> {
        self.time.get()
    }
}

type Hook = Rc<dyn Fn(f64)>;

#[derive(Default)]
struct SlotInner {
    value: Option<f64>,
    hook: Option<(HookId, Hook)>,
    next_hook: u32,
}

/// Injectable override for the polled clock, written by a capture harness.
///
/// Writing a finite value runs the attached hook synchronously, so an engine
/// bound to this slot has applied the time before `set` returns. Clones share
/// state.
#[derive(Clone, Default)]
pub struct VirtualTimeSlot {
    inner: Rc<RefCell<SlotInner>>,
}

impl fmt::Debug for VirtualTimeSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("VirtualTimeSlot")
            .field("value", &inner.value)
            .field("hooked", &inner.hook.is_some())
            .finish()
    }
}

impl VirtualTimeSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: f64) -> Self {
        let slot = Self::new();
        slot.inner.borrow_mut().value = Some(value);
        slot
    }

    pub fn get(&self) -> Option<f64> {
        self.inner.borrow().value
    }

    /// Finite value currently held, if any.
    pub fn finite(&self) -> Option<f64> {
        self.get().filter(|v| v.is_finite())
    }

    pub fn set(&self, value: Option<f64>) {
        let hook = {
            let mut inner = self.inner.borrow_mut();
            inner.value = value;
            inner.hook.as_ref().map(|(_, h)| h.clone())
        };
        if let (Some(hook), Some(v)) = (hook, value.filter(|v| v.is_finite())) {
            hook(v);
        }
    }

    pub fn is_hooked(&self) -> bool {
        self.inner.borrow().hook.is_some()
    }

    /// Whether `id` is still the attached hook.
    pub(crate) fn holds(&self, id: HookId) -> bool {
        matches!(self.inner.borrow().hook, Some((current, _)) if current == id)
    }

    /// Attach the single synchronous listener, replacing any previous one.
    pub(crate) fn attach(&self, hook: Hook) -> HookId {
        let mut inner = self.inner.borrow_mut();
        let id = HookId(inner.next_hook);
        inner.next_hook = inner.next_hook.wrapping_add(1);
        inner.hook = Some((id, hook));
        id
    }

    /// Detach `id` and put back `restore` without running any hook.
    pub(crate) fn detach(&self, id: HookId, restore: Option<f64>) {
        let mut inner = self.inner.borrow_mut();
        if matches!(inner.hook, Some((current, _)) if current == id) {
            inner.hook = None;
            inner.value = restore;
        }
    }
}

/// Everything `Engine::bind_to_document_timeline` needs.
pub struct TimelineBinding {
    pub clock: Rc<dyn TimelineClock>,
    /// Polls the clock once per host frame; owned by the binding.
    pub poller: Box<dyn Ticker>,
    pub virtual_time: Option<VirtualTimeSlot>,
}

impl TimelineBinding {
    pub fn new(clock: Rc<dyn TimelineClock>, poller: Box<dyn Ticker>) -> Self {
        Self {
            clock,
            poller,
            virtual_time: None,
        }
    }

    pub fn with_virtual_time(mut self, slot: VirtualTimeSlot) -> Self {
        self.virtual_time = Some(slot);
        self
    }

    /// Override if finite, else the clock.
    pub(crate) fn read_ms(clock: &dyn TimelineClock, slot: Option<&VirtualTimeSlot>) -> Option<f64> {
        slot.and_then(VirtualTimeSlot::finite)
            .or_else(|| clock.current_time_ms().filter(|v| v.is_finite()))
    }
}
