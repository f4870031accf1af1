use std::sync::Arc;
use tracing::trace;

use super::emitter::{EventSource, Listener, ListenOptions, ListenerId};

struct Binding {
    event_name: String,
    id: ListenerId,
    unbind: Box<dyn FnOnce(&str, ListenerId) -> bool + Send>,
}

/// Scoped subscription ledger.
///
/// Every listener registered through [`EventHandler::listen`] is recorded so
/// that [`EventHandler::remove_all`] can detach all of them at once. Dropping
/// the ledger also detaches everything.
#[derive(Default)]
pub struct EventHandler {
    bindings: Vec<Binding>,
}

impl std::fmt::Debug for EventHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHandler")
            .field(
                "bindings",
                &self
                    .bindings
                    .iter()
                    .map(|b| b.event_name.as_str())
                    .collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl EventHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event_name` on `source` and record the binding.
    ///
    /// Returns the ledger so several subscriptions chain in one expression.
    pub fn listen<E, S, F>(
        &mut self,
        source: &Arc<S>,
        event_name: &str,
        handler: F,
        options: ListenOptions,
    ) -> &mut Self
    where
        E: 'static,
        S: EventSource<E> + ?Sized + 'static,
        F: Fn(&E) + Send + Sync + 'static,
    {
        let listener: Listener<E> = Arc::new(handler);
        let id = source.add_listener(event_name, listener, options);
        let source = Arc::clone(source);
        self.bindings.push(Binding {
            event_name: event_name.to_string(),
            id,
            unbind: Box::new(move |name, id| source.remove_listener(name, id)),
        });
        self
    }

    /// Detach every recorded binding and clear the ledger. Safe to repeat.
    pub fn remove_all(&mut self) {
        if self.bindings.is_empty() {
            return;
        }
        trace!("Removing {} listener binding(s)", self.bindings.len());
        for binding in self.bindings.drain(..) {
            (binding.unbind)(&binding.event_name, binding.id);
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.remove_all();
    }
}
