//! Host-registered checks awaited by `Engine::wait_until_stable`.

use std::rc::Rc;

use crate::driver::StableFuture;
use crate::error::Result;
use crate::ids::{IdAllocator, StabilityCheckId};

pub type StabilityCheck = Rc<dyn Fn() -> StableFuture>;

#[derive(Default)]
pub struct StabilityRegistry {
    ids: IdAllocator,
    checks: Vec<(StabilityCheckId, StabilityCheck)>,
}

impl StabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, check: StabilityCheck) -> StabilityCheckId {
        let id = self.ids.alloc_check();
        self.checks.push((id, check));
        id
    }

    pub fn unregister(&mut self, id: StabilityCheckId) -> bool {
        let before = self.checks.len();
        self.checks.retain(|(cid, _)| *cid != id);
        self.checks.len() != before
    }

    pub fn snapshot(&self) -> Vec<StabilityCheck> {
        self.checks.iter().map(|(_, c)| c.clone()).collect()
    }

    pub fn clear(&mut self) {
        self.checks.clear();
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

/// Await every future in order; the first failure wins.
pub async fn await_all(futures: Vec<StableFuture>) -> Result<()> {
    for fut in futures {
        fut.await?;
    }
    Ok(())
}
