use std::time::Instant;

use crate::Engine;

/// Per-store host state, reachable from host functions through `Caller`.
pub struct HostState {
    started: Instant,
    objects: usize,
}

impl HostState {
    fn new() -> Self {
        Self {
            started: Instant::now(),
            objects: 0,
        }
    }

    /// When the owning store was created.
    pub fn started(&self) -> Instant {
        self.started
    }

    /// Record that an object (instance or host function) was created in the
    /// store.
    pub(crate) fn track_object(&mut self) {
        self.objects += 1;
    }
}

pub type Store = wasmtime::Store<HostState>;

/// Owner of the runtime object graph.
///
/// Every instance, host function and memory created while running a module
/// lives in the wasmtime store held here. Nothing outside the runtime keeps
/// references into the store between runs, so a sweep with an empty root set
/// releases all of it.
pub struct Runtime {
    engine: Engine,
    store: Store,
}

impl Runtime {
    pub fn new(engine: &Engine) -> Self {
        Self {
            engine: engine.clone(),
            store: new_store(engine),
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn store_mut(&mut self) -> &mut Store {
        &mut self.store
    }

    /// Number of objects currently alive in the store.
    pub fn live_objects(&self) -> usize {
        self.store.data().objects
    }

    /// Release every object not reachable from the (empty) root set.
    ///
    /// Returns how many objects were released.
    pub fn release_unreferenced(&mut self) -> usize {
        let released = std::mem::replace(&mut self.store, new_store(&self.engine));
        let count = released.data().objects;
        tracing::debug!(released = count, "released unreferenced objects");
        count
    }
}

fn new_store(engine: &Engine) -> Store {
    wasmtime::Store::new(engine.runtime(), HostState::new())
}
