//! Reader-writer sharing for concurrent embedders.

use std::sync::Arc;

use parking_lot::RwLock;

use super::resolver::ZoneWorld;

/// `ZoneWorld` behind an `Arc<RwLock>`: many concurrent resolve calls,
/// exclusive access for operator edits. A reader always observes a
/// fully-applied hierarchy state, never a half-finished edit.
#[derive(Debug, Clone)]
pub struct SharedZoneWorld {
    inner: Arc<RwLock<ZoneWorld>>,
}

impl SharedZoneWorld {
    pub fn new(world: ZoneWorld) -> Self {
        Self {
            inner: Arc::new(RwLock::new(world)),
        }
    }

    pub fn read<T>(&self, f: impl FnOnce(&ZoneWorld) -> T) -> T {
        f(&self.inner.read())
    }

    pub fn write<T>(&self, f: impl FnOnce(&mut ZoneWorld) -> T) -> T {
        f(&mut self.inner.write())
    }
}
