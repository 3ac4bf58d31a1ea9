//! Driving the engine from a host timeline and the virtual-time override.

use std::rc::Rc;

use log::{debug, warn};

use super::Engine;
use crate::clock::{TimelineBinding, TimelineClock, VirtualTimeSlot};
use crate::ids::HookId;
use crate::ticker::Ticker;

struct SlotHook {
    slot: VirtualTimeSlot,
    hook: HookId,
    /// Slot value at bind time, put back on unbind.
    restore: Option<f64>,
}

pub(super) struct ClockLink {
    clock: Rc<dyn TimelineClock>,
    poller: Box<dyn Ticker>,
    virtual_time: Option<SlotHook>,
}

impl Engine {
    /// Follow `binding.clock`, polled once per host frame by `binding.poller`.
    /// A finite value in `binding.virtual_time` wins over the clock and is
    /// applied synchronously when written. Own ticks are ignored while bound.
    pub fn bind_to_document_timeline(&self, binding: TimelineBinding) {
        if !self.alive("bind_to_document_timeline") {
            return;
        }
        if self.detach_clock() {
            warn!("engine was already bound to an external clock; rebinding");
        }
        self.detach_master();
        self.stop_ticker();

        let TimelineBinding {
            clock,
            mut poller,
            virtual_time,
        } = binding;

        let virtual_time = virtual_time.map(|slot| {
            let restore = slot.get();
            let weak = self.downgrade();
            let hook = slot.attach(Rc::new(move |time_ms: f64| {
                if let Some(engine) = Engine::from_weak(&weak) {
                    engine.apply_clock_time(time_ms, true);
                }
            }));
            SlotHook {
                slot,
                hook,
                restore,
            }
        });
        let pending = virtual_time.as_ref().and_then(|v| v.slot.finite());

        let weak = self.downgrade();
        poller.start(Box::new(move |_delta_ms: f64| {
            if let Some(engine) = Engine::from_weak(&weak) {
                engine.poll_clock();
            }
        }));

        *self.shared.clock.borrow_mut() = Some(ClockLink {
            clock,
            poller,
            virtual_time,
        });
        debug!("bound to external clock");

        self.push();
        if let Some(time_ms) = pending {
            self.apply_clock_time(time_ms, true);
        }
    }

    pub fn unbind_from_document_timeline(&self) {
        if !self.detach_clock() {
            return;
        }
        debug!("unbound from external clock");
        if self.alive("unbind_from_document_timeline") {
            self.push();
            self.resume_ticker_if_playing();
        }
    }

    /// True while this engine's hook is the one attached to its virtual-time
    /// slot. Another engine binding the same slot takes it over.
    pub fn is_virtual_time_bound(&self) -> bool {
        self.shared
            .clock
            .borrow()
            .as_ref()
            .and_then(|link| link.virtual_time.as_ref())
            .is_some_and(|v| v.slot.holds(v.hook))
    }

    /// Read the override or the clock and apply it. No-op when unbound.
    pub(super) fn poll_clock(&self) {
        let (clock, slot) = {
            let guard = self.shared.clock.borrow();
            let Some(link) = guard.as_ref() else {
                return;
            };
            (
                link.clock.clone(),
                link.virtual_time.as_ref().map(|v| v.slot.clone()),
            )
        };
        if let Some(time_ms) = TimelineBinding::read_ms(clock.as_ref(), slot.as_ref()) {
            self.apply_clock_time(time_ms, false);
        }
    }

    /// Seek to `time_ms` of wall time, clamped to the timeline. `force` notifies
    /// even when the frame did not move.
    fn apply_clock_time(&self, time_ms: f64, force: bool) {
        if !self.alive("clock update") || !time_ms.is_finite() {
            return;
        }
        let changed = self.with_core(|core| {
            let frame = time_ms / 1000.0 * core.timeline.fps();
            let moved = core.timeline.seek(frame);
            let captions = core.refresh_captions();
            moved || captions
        });
        if changed || force {
            self.push();
            self.notify();
        }
    }

    /// Stop polling, release the slot and restore its bind-time value.
    pub(super) fn detach_clock(&self) -> bool {
        let Some(mut link) = self.shared.clock.borrow_mut().take() else {
            return false;
        };
        link.poller.stop();
        if let Some(v) = link.virtual_time {
            v.slot.detach(v.hook, v.restore);
        }
        true
    }
}
