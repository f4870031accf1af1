use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::trace;

/// Anything dispatched through an [`EventSource`] knows its own name.
pub trait Event: Send + Sync {
    fn event_name(&self) -> &str;
}

pub type Listener<E> = Arc<dyn Fn(&E) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

#[derive(Debug, Clone, Copy, Default)]
pub struct ListenOptions {
    /// Drop the listener after its first invocation
    pub once: bool,
}

impl ListenOptions {
    pub fn once() -> Self {
        Self { once: true }
    }
}

/// Something listeners can be attached to and detached from.
pub trait EventSource<E>: Send + Sync {
    fn add_listener(
        &self,
        event_name: &str,
        listener: Listener<E>,
        options: ListenOptions,
    ) -> ListenerId;

    /// Returns `false` if the listener was already gone
    fn remove_listener(&self, event_name: &str, id: ListenerId) -> bool;
}

struct Registration<E> {
    id: ListenerId,
    listener: Listener<E>,
    once: bool,
}

/// In-memory [`EventSource`] used by widgets and player adapters.
pub struct EventEmitter<E> {
    listeners: Mutex<HashMap<String, Vec<Registration<E>>>>,
    next_id: AtomicU64,
}

impl<E> Default for EventEmitter<E> {
    fn default() -> Self {
        Self {
            listeners: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl<E> std::fmt::Debug for EventEmitter<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("listener_count", &self.listener_count())
            .finish()
    }
}

impl<E: Event> EventEmitter<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Dispatch `event` to every listener registered under its name.
    ///
    /// Listeners are snapshotted before dispatch, so a listener may add or
    /// remove listeners without deadlocking. Returns how many were invoked.
    pub fn emit(&self, event: &E) -> usize {
        let name = event.event_name();
        let snapshot: Vec<Listener<E>> = {
            let mut listeners = match self.listeners.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let Some(registrations) = listeners.get_mut(name) else {
                return 0;
            };
            let snapshot = registrations
                .iter()
                .map(|r| Arc::clone(&r.listener))
                .collect();
            registrations.retain(|r| !r.once);
            snapshot
        };

        trace!("Dispatching '{}' to {} listener(s)", name, snapshot.len());
        for listener in &snapshot {
            listener(event);
        }
        snapshot.len()
    }
}

impl<E> EventEmitter<E> {
    pub fn listener_count(&self) -> usize {
        match self.listeners.lock() {
            Ok(guard) => guard.values().map(Vec::len).sum(),
            Err(poisoned) => poisoned.into_inner().values().map(Vec::len).sum(),
        }
    }
}

impl<E: Event> EventSource<E> for EventEmitter<E> {
    fn add_listener(
        &self,
        event_name: &str,
        listener: Listener<E>,
        options: ListenOptions,
    ) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        listeners
            .entry(event_name.to_string())
            .or_default()
            .push(Registration {
                id,
                listener,
                once: options.once,
            });
        id
    }

    fn remove_listener(&self, event_name: &str, id: ListenerId) -> bool {
        let mut listeners = match self.listeners.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        let Some(registrations) = listeners.get_mut(event_name) else {
            return false;
        };
        let before = registrations.len();
        registrations.retain(|r| r.id != id);
        let removed = registrations.len() != before;
        if registrations.is_empty() {
            listeners.remove(event_name);
        }
        removed
    }
}
