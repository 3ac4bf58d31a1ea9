//! Identifiers handed out by the engine.

use serde::{Deserialize, Serialize};

/// Returned by `Engine::subscribe`; pass to `Engine::unsubscribe`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u32);

/// Returned by `Engine::register_stability_check`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct StabilityCheckId(pub u32);

/// Handle for a hook attached to a `VirtualTimeSlot`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct HookId(pub u32);

/// Monotonic allocator for all engine ids.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_subscription: u32,
    next_check: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_subscription(&mut self) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription = self.next_subscription.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_check(&mut self) -> StabilityCheckId {
        let id = StabilityCheckId(self.next_check);
        self.next_check = self.next_check.wrapping_add(1);
        id
    }
}
