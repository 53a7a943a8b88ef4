//! Transport contract and per-scope client pool
//!
//! The transport itself lives outside this layer; the core only consumes the
//! create/read/update/delete contract. The one shared resource below the
//! per-operation world is a lazily built client per remote scope, behind a
//! lock so concurrent first use cannot build duplicates.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::wire::WireValue;

/// The remote management API, as consumed by operations.
///
/// Payloads are wire-format nested structures as produced by the conversion
/// protocol. Any failure aborts the operation with no partial apply.
pub trait Transport {
    /// Create an entity; returns the assigned id and the response payload
    fn create(&self, scope: &str, kind: &str, payload: &WireValue) -> Result<(String, WireValue)>;

    /// Read an entity by id
    fn read(&self, scope: &str, kind: &str, id: &str) -> Result<WireValue>;

    /// Update an entity by id; returns the response payload
    fn update(&self, scope: &str, kind: &str, id: &str, payload: &WireValue) -> Result<WireValue>;

    /// Delete an entity by id
    fn delete(&self, scope: &str, kind: &str, id: &str) -> Result<()>;
}

/// Lazily constructed per-scope client cache.
///
/// The host engine runs many operations concurrently across independent
/// entities; the pool guarantees each scope's client is built exactly once.
/// Locking is keyed by scope: the map-wide lock is held only long enough to
/// find the scope's slot, and the build runs under the slot's own lock, so a
/// slow first build for one scope never blocks first use of another.
pub struct ClientPool<C> {
    build: Box<dyn Fn(&str) -> Result<C> + Send + Sync>,
    slots: Mutex<HashMap<String, Arc<Mutex<Option<Arc<C>>>>>>,
}

fn lock_recovering<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl<C> ClientPool<C> {
    pub fn new(build: impl Fn(&str) -> Result<C> + Send + Sync + 'static) -> Self {
        Self {
            build: Box::new(build),
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// The client for a scope, building it on first use
    pub fn get(&self, scope: &str) -> Result<Arc<C>> {
        let slot = {
            let mut slots = lock_recovering(&self.slots);
            Arc::clone(slots.entry(scope.to_string()).or_default())
        };
        let mut slot = lock_recovering(&slot);
        if let Some(client) = slot.as_ref() {
            return Ok(Arc::clone(client));
        }
        log::debug!("building client for scope `{scope}`");
        let client = Arc::new((self.build)(scope)?);
        *slot = Some(Arc::clone(&client));
        Ok(client)
    }

    /// Number of clients built so far
    pub fn len(&self) -> usize {
        let slots = lock_recovering(&self.slots);
        slots
            .values()
            .filter(|slot| lock_recovering(slot).is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
