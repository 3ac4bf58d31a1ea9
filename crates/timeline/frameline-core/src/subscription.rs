//! Subscriber bookkeeping.

use std::rc::Rc;

use crate::ids::{IdAllocator, SubscriptionId};
use crate::state::EngineState;

pub type Listener = Rc<dyn Fn(&EngineState)>;

#[derive(Default)]
pub struct SubscriberSet {
    ids: IdAllocator,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl SubscriberSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, listener: Listener) -> SubscriptionId {
        let id = self.ids.alloc_subscription();
        self.listeners.push((id, listener));
        id
    }

    /// Allocate an id without registering anything.
    pub fn reserve_id(&mut self) -> SubscriptionId {
        self.ids.alloc_subscription()
    }

    pub fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    pub fn contains(&self, id: SubscriptionId) -> bool {
        self.listeners.iter().any(|(sid, _)| *sid == id)
    }

    /// Listeners in subscription order, cloned so none are borrowed while they run.
    pub fn snapshot(&self) -> Vec<(SubscriptionId, Listener)> {
        self.listeners.clone()
    }

    pub fn clear(&mut self) {
        self.listeners.clear();
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}
