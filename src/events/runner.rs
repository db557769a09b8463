// In-process run source

use super::{EventKind, EventSource, Listener, RunEvent};
use crate::state::RunStats;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Run source that delivers events synchronously, in emission order, to every
/// listener registered for the event's kind.
#[derive(Default)]
pub struct Runner {
    listeners: Mutex<HashMap<EventKind, Vec<Listener>>>,
    stats: Mutex<RunStats>,
    total: AtomicUsize,
    halted: AtomicBool,
}

impl Runner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a runner that expects `total` tests
    pub fn with_total(total: usize) -> Self {
        let runner = Self::default();
        runner.total.store(total, Ordering::SeqCst);
        runner
    }

    /// Deliver one event to its listeners.
    ///
    /// The listener list is snapshotted before delivery, so a listener may
    /// subscribe further listeners without deadlocking; those only see later
    /// events.
    pub fn emit(&self, event: &RunEvent) {
        self.record(event);

        let listeners = lock(&self.listeners)
            .get(&event.kind())
            .cloned()
            .unwrap_or_default();

        for listener in &listeners {
            listener(event);
        }
    }

    /// Emit every event in order and return the failure count.
    ///
    /// Stops before the next event once the runner is halted.
    pub fn replay<'a, I>(&self, events: I) -> usize
    where
        I: IntoIterator<Item = &'a RunEvent>,
    {
        for event in events {
            if self.is_halted() {
                debug!("Runner halted, skipping remaining events");
                break;
            }
            self.emit(event);
        }
        self.failures()
    }

    /// Stop an in-flight [`Runner::replay`] after the event being delivered
    pub fn halt(&self) {
        self.halted.store(true, Ordering::SeqCst);
    }

    pub fn is_halted(&self) -> bool {
        self.halted.load(Ordering::SeqCst)
    }

    /// Number of listeners subscribed for one event kind
    pub fn listener_count(&self, kind: EventKind) -> usize {
        lock(&self.listeners).get(&kind).map_or(0, Vec::len)
    }

    pub fn failures(&self) -> usize {
        lock(&self.stats).failures
    }

    fn record(&self, event: &RunEvent) {
        let mut stats = lock(&self.stats);
        match event {
            RunEvent::Start { total } => {
                if *total > 0 {
                    self.total.store(*total, Ordering::SeqCst);
                }
                stats.begin();
            }
            RunEvent::SuiteBegin { depth, .. } if *depth > 0 => stats.suites += 1,
            RunEvent::Pass(_) => stats.passes += 1,
            RunEvent::Fail(_) => stats.failures += 1,
            RunEvent::Pending(_) => stats.pending += 1,
            RunEvent::TestEnd(_) => stats.tests += 1,
            RunEvent::End { .. } => stats.finish(),
            _ => {}
        }
        debug!("Runner: emitting '{}'", event.kind());
    }
}

impl EventSource for Runner {
    fn on(&self, kind: EventKind, listener: Listener) {
        lock(&self.listeners).entry(kind).or_default().push(listener);
    }

    fn total(&self) -> usize {
        self.total.load(Ordering::SeqCst)
    }

    fn stats(&self) -> RunStats {
        lock(&self.stats).clone()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::TestInfo;
    use std::sync::Arc;

    #[test]
    fn test_emit_reaches_only_matching_listeners() {
        let runner = Runner::new();
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = seen.clone();
        let source: &dyn EventSource = &runner;
        source.listen(EventKind::Pass, move |event| {
            sink.lock().unwrap().push(event.kind());
        });

        runner.emit(&RunEvent::Start { total: 2 });
        runner.emit(&RunEvent::Pass(TestInfo::new("a", "a")));
        runner.emit(&RunEvent::Fail(TestInfo::new("b", "b")));

        assert_eq!(*seen.lock().unwrap(), vec![EventKind::Pass]);
    }

    #[test]
    fn test_stats_track_outcomes() {
        let runner = Runner::new();
        let events = vec![
            RunEvent::Start { total: 3 },
            RunEvent::SuiteBegin {
                title: String::new(),
                depth: 0,
            },
            RunEvent::SuiteBegin {
                title: "math".into(),
                depth: 1,
            },
            RunEvent::Pass(TestInfo::new("math a", "a")),
            RunEvent::TestEnd(TestInfo::new("math a", "a")),
            RunEvent::Fail(TestInfo::new("math b", "b")),
            RunEvent::TestEnd(TestInfo::new("math b", "b")),
            RunEvent::Pending(TestInfo::new("math c", "c")),
            RunEvent::TestEnd(TestInfo::new("math c", "c")),
            RunEvent::End {
                stats: RunStats::default(),
            },
        ];

        let failures = runner.replay(&events);

        let stats = runner.stats();
        assert_eq!(failures, 1);
        assert_eq!(runner.total(), 3);
        assert_eq!(stats.suites, 1);
        assert_eq!(stats.tests, 3);
        assert_eq!(stats.passes, 1);
        assert_eq!(stats.pending, 1);
    }

    #[test]
    fn test_listener_may_subscribe_during_emit() {
        let runner = Arc::new(Runner::new());
        let inner = runner.clone();
        let source: &dyn EventSource = &*runner;
        source.listen(EventKind::Start, move |_| {
            let nested: &dyn EventSource = &*inner;
            nested.listen(EventKind::End, |_| {});
        });

        runner.emit(&RunEvent::Start { total: 0 });

        assert_eq!(runner.listener_count(EventKind::End), 1);
    }

    #[test]
    fn test_replay_stops_once_halted() {
        let runner = Arc::new(Runner::new());
        let seen = Arc::new(Mutex::new(Vec::new()));

        let halting = runner.clone();
        let sink = seen.clone();
        let source: &dyn EventSource = &*runner;
        source.listen(EventKind::Fail, move |event| {
            sink.lock().unwrap().push(event.kind());
            halting.halt();
        });
        let sink = seen.clone();
        source.listen(EventKind::Pass, move |event| {
            sink.lock().unwrap().push(event.kind());
        });

        let events = vec![
            RunEvent::Pass(TestInfo::new("a", "a")),
            RunEvent::Fail(TestInfo::new("b", "b")),
            RunEvent::Pass(TestInfo::new("c", "c")),
            RunEvent::Fail(TestInfo::new("d", "d")),
        ];
        let failures = runner.replay(&events);

        assert!(runner.is_halted());
        assert_eq!(failures, 1);
        assert_eq!(*seen.lock().unwrap(), vec![EventKind::Pass, EventKind::Fail]);
    }
}
