//! Host animation objects that follow the engine's playhead.

use std::cell::RefCell;
use std::rc::Rc;

/// An animation owned by the host (a CSS/Web animation, a tween, ...).
pub trait HostAnimation {
    fn set_current_time(&self, time_ms: f64);
    fn pause(&self);
    fn is_paused(&self) -> bool;
}

/// Where the engine discovers animations to keep in step.
pub trait AnimationScope {
    /// Animations in this scope; with `subtree`, also those of descendants.
    fn animations(&self, subtree: bool) -> Vec<Rc<dyn HostAnimation>>;
}

/// A flat, explicitly populated scope.
#[derive(Default)]
pub struct AnimationRegistry {
    animations: RefCell<Vec<Rc<dyn HostAnimation>>>,
}

impl AnimationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, animation: Rc<dyn HostAnimation>) {
        self.animations.borrow_mut().push(animation);
    }

    /// Removes by identity. Returns whether it was present.
    pub fn unregister(&self, animation: &Rc<dyn HostAnimation>) -> bool {
        let mut list = self.animations.borrow_mut();
        let before = list.len();
        list.retain(|a| !Rc::ptr_eq(a, animation));
        list.len() != before
    }

    pub fn len(&self) -> usize {
        self.animations.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.animations.borrow().is_empty()
    }
}

impl AnimationScope for AnimationRegistry {
    fn animations(&self, _subtree: bool) -> Vec<Rc<dyn HostAnimation>> {
        self.animations.borrow().clone()
    }
}

/// Seek every animation in `scope` to `time_ms` and hold it paused there.
pub fn sync_animations(scope: &dyn AnimationScope, time_ms: f64) {
    for animation in scope.animations(true) {
        animation.set_current_time(time_ms);
        if !animation.is_paused() {
            animation.pause();
        }
    }
}
