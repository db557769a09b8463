// Runner shim - per-reporter view of the shared run source

use super::redirect::OutputRedirector;
use super::stream::Sink;
use crate::events::{EventKind, EventSource, Listener, RunEvent};
use crate::state::RunStats;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use tracing::debug;

/// Event relay standing between the true run source and one reporter.
///
/// The shim subscribes upstream lazily: the first local listener for an event
/// kind wires exactly one forwarding listener on the source. Every forwarded
/// event is republished to the local listeners while the redirector points at
/// this shim's sink.
pub struct RunnerShim {
    source: Arc<dyn EventSource>,
    sink: Sink,
    redirector: Arc<OutputRedirector>,
    listeners: Mutex<HashMap<EventKind, Vec<Listener>>>,
    wired: Mutex<BTreeSet<EventKind>>,
    this: Weak<RunnerShim>,
}

impl RunnerShim {
    pub fn new(
        source: Arc<dyn EventSource>,
        sink: Sink,
        redirector: Arc<OutputRedirector>,
    ) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            source,
            sink,
            redirector,
            listeners: Mutex::new(HashMap::new()),
            wired: Mutex::new(BTreeSet::new()),
            this: this.clone(),
        })
    }

    pub fn sink(&self) -> &Sink {
        &self.sink
    }

    /// Event kinds already forwarded from the source, in declaration order
    pub fn wired_events(&self) -> Vec<EventKind> {
        lock(&self.wired).iter().copied().collect()
    }

    /// Run `func` inside this shim's output window
    pub fn scoped<R, F>(&self, func: F) -> R
    where
        F: FnOnce() -> R,
    {
        self.redirector.with_redirected(&self.sink, func)
    }

    fn delegate(&self, kind: EventKind) {
        if !lock(&self.wired).insert(kind) {
            return;
        }

        debug!("Shim: Delegating '{}'", kind);

        // Weak back-reference: the source's listener list must not keep the
        // shim alive.
        let this = self.this.clone();
        self.source.on(
            kind,
            Arc::new(move |event: &RunEvent| {
                if let Some(shim) = this.upgrade() {
                    shim.scoped(|| shim.publish(event));
                }
            }),
        );
    }

    fn publish(&self, event: &RunEvent) {
        let listeners = lock(&self.listeners)
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();

        for listener in &listeners {
            listener(event);
        }
    }
}

impl EventSource for RunnerShim {
    fn on(&self, kind: EventKind, listener: Listener) {
        lock(&self.listeners).entry(kind).or_default().push(listener);
        self.delegate(kind);
    }

    fn total(&self) -> usize {
        self.source.total()
    }

    fn stats(&self) -> RunStats {
        self.source.stats()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
