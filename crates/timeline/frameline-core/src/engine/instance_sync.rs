//! One engine mirroring another.

use std::rc::Rc;

use log::{debug, warn};

use super::Engine;
use crate::ids::SubscriptionId;
use crate::state::EngineState;

pub(super) struct MasterLink {
    master: Engine,
    subscription: SubscriptionId,
}

impl Engine {
    /// Mirror `master`: play state and rate are copied, position is translated
    /// through wall-clock time so engines with different frame rates stay
    /// aligned. Stops this engine's own ticker and any clock binding.
    pub fn bind_to(&self, master: &Engine) {
        if !self.alive("bind_to") {
            return;
        }
        if Rc::ptr_eq(&self.shared, &master.shared) || master.follows(self) {
            warn!("bind_to would create a sync cycle; ignored");
            return;
        }
        self.detach_master();
        self.detach_clock();
        self.stop_ticker();

        let weak = self.downgrade();
        let subscription = master.subscribe(move |state| {
            if let Some(engine) = Engine::from_weak(&weak) {
                engine.follow(state);
            }
        });
        *self.shared.master.borrow_mut() = Some(MasterLink {
            master: master.clone(),
            subscription,
        });
        debug!("bound to master engine");
    }

    /// Stop mirroring. Resumes own ticking if the mirrored state was playing.
    pub fn unbind(&self) {
        if !self.detach_master() {
            return;
        }
        debug!("unbound from master engine");
        if self.alive("unbind") {
            self.resume_ticker_if_playing();
        }
    }

    pub fn is_bound_to_master(&self) -> bool {
        self.is_master_bound()
    }

    /// Whether `other` appears anywhere up this engine's master chain.
    fn follows(&self, other: &Engine) -> bool {
        let mut current = self.shared.master.borrow().as_ref().map(|l| l.master.clone());
        while let Some(engine) = current {
            if Rc::ptr_eq(&engine.shared, &other.shared) {
                return true;
            }
            current = engine.shared.master.borrow().as_ref().map(|l| l.master.clone());
        }
        false
    }

    fn follow(&self, master: &EngineState) {
        if !self.alive("follow") {
            return;
        }
        let changed = self.with_core(|core| {
            let timeline = &mut core.timeline;
            let fps = timeline.fps();
            let mut changed = timeline.seek(master.current_time * fps);
            changed |= if master.is_playing {
                timeline.play()
            } else {
                timeline.pause()
            };
            changed |= timeline.set_playback_rate(master.playback_rate);
            core.refresh_captions() || changed
        });
        if changed {
            self.push();
            self.notify();
        }
    }

    pub(super) fn detach_master(&self) -> bool {
        let Some(link) = self.shared.master.borrow_mut().take() else {
            return false;
        };
        link.master.unsubscribe(link.subscription);
        true
    }
}
