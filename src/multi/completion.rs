// Completion coordination - wait for every reporter's done hook

use super::shim::RunnerShim;
use crate::report::Reporter;
use futures::future::join_all;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{OnceCell, oneshot};
use tracing::{debug, warn};

/// Continuation handed to a reporter's completion hook.
///
/// Call [`DoneSignal::finish`] once finalization is over. Dropping the signal
/// without finishing also releases the coordinator, with a warning.
pub struct DoneSignal {
    reporter: String,
    tx: Option<oneshot::Sender<()>>,
}

impl DoneSignal {
    fn new(reporter: &str, tx: oneshot::Sender<()>) -> Self {
        Self {
            reporter: reporter.to_string(),
            tx: Some(tx),
        }
    }

    /// Signal that the reporter has finished
    pub fn finish(mut self) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for DoneSignal {
    fn drop(&mut self) {
        if let Some(tx) = self.tx.take() {
            warn!(
                "Reporter '{}' dropped its done callback without calling it",
                self.reporter
            );
            let _ = tx.send(());
        }
    }
}

struct Registered {
    name: String,
    reporter: Arc<dyn Reporter>,
    shim: Arc<RunnerShim>,
}

/// Aggregates the completion hooks of every completion-capable reporter.
///
/// The hooks run at most once per coordinator; later waits observe the first
/// round's outcome. No timeout: a hook that never finishes stalls the wait.
#[derive(Default)]
pub struct CompletionCoordinator {
    reporters: Vec<Registered>,
    settled: OnceCell<usize>,
}

impl CompletionCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `reporter` if it exposes a completion hook. Returns whether it
    /// was registered.
    pub fn register(
        &mut self,
        name: &str,
        reporter: Arc<dyn Reporter>,
        shim: Arc<RunnerShim>,
    ) -> bool {
        if !reporter.has_done() {
            return false;
        }

        self.reporters.push(Registered {
            name: name.to_string(),
            reporter,
            shim,
        });
        true
    }

    pub fn len(&self) -> usize {
        self.reporters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reporters.is_empty()
    }

    /// Invoke every hook with `failures`, then call `on_all_done(failures)`
    /// exactly once. With no hooks registered this completes on first poll.
    pub async fn await_all<F>(&self, failures: usize, on_all_done: F)
    where
        F: FnOnce(usize),
    {
        let failures = self.wait(failures).await;
        on_all_done(failures);
    }

    /// Invoke every hook with `failures` and resolve once all have finished
    pub async fn wait(&self, failures: usize) -> usize {
        if self.reporters.is_empty() {
            return failures;
        }

        *self
            .settled
            .get_or_init(|| self.run_hooks(failures))
            .await
    }

    async fn run_hooks(&self, failures: usize) -> usize {
        let count = self.reporters.len();
        let outstanding = Arc::new(AtomicUsize::new(count));
        debug!("Awaiting on {} reporters to invoke done callback.", count);

        let pending: Vec<_> = self
            .reporters
            .iter()
            .map(|registered| {
                let (tx, rx) = oneshot::channel();
                let signal = DoneSignal::new(&registered.name, tx);
                // The synchronous part of the hook writes into the reporter's
                // own sink, like its event handlers do.
                registered
                    .shim
                    .scoped(|| registered.reporter.done(failures, signal));
                rx
            })
            .collect();

        join_all(pending.into_iter().map(|rx| {
            let outstanding = outstanding.clone();
            async move {
                let _ = rx.await;
                let left = outstanding.fetch_sub(1, Ordering::SeqCst) - 1;
                debug!("Awaiting on {} reporters to invoke done callback.", left);
            }
        }))
        .await;

        debug!("All reporters invoked done callback.");
        failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Runner;
    use crate::multi::redirect::{CaptureBuffer, OutputRedirector};
    use crate::multi::stream::Sink;
    use futures::FutureExt;
    use std::sync::Mutex;

    /// Hook that parks its signal until the test releases it
    struct Parked {
        calls: AtomicUsize,
        parked: Mutex<Option<DoneSignal>>,
    }

    impl Parked {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                parked: Mutex::new(None),
            })
        }

        fn release(&self) {
            if let Some(signal) = self.parked.lock().unwrap().take() {
                signal.finish();
            }
        }

        /// Wait for the hook to be invoked, then release it
        async fn release_when_called(&self) {
            while self.calls.load(Ordering::SeqCst) == 0 {
                tokio::task::yield_now().await;
            }
            self.release();
        }
    }

    impl Reporter for Parked {
        fn has_done(&self) -> bool {
            true
        }

        fn done(&self, _failures: usize, done: DoneSignal) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.parked.lock().unwrap() = Some(done);
        }
    }

    struct Plain;

    impl Reporter for Plain {}

    fn shim() -> Arc<RunnerShim> {
        let redirector = OutputRedirector::with_writers(CaptureBuffer::new(), CaptureBuffer::new());
        RunnerShim::new(Arc::new(Runner::new()), Sink::Shared, redirector)
    }

    #[test]
    fn test_without_hooks_fires_on_first_poll() {
        let mut coordinator = CompletionCoordinator::new();
        assert!(!coordinator.register("plain", Arc::new(Plain), shim()));

        let fired = Mutex::new(None);
        let ready = coordinator
            .await_all(3, |failures| *fired.lock().unwrap() = Some(failures))
            .now_or_never();

        assert!(ready.is_some());
        assert_eq!(*fired.lock().unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_waits_for_every_hook_in_any_order() {
        let first = Parked::new();
        let second = Parked::new();
        let mut coordinator = CompletionCoordinator::new();
        assert!(coordinator.register("first", first.clone(), shim()));
        assert!(coordinator.register("second", second.clone(), shim()));
        let coordinator = Arc::new(coordinator);

        let fired = Arc::new(AtomicUsize::new(0));
        let task = {
            let coordinator = coordinator.clone();
            let fired = fired.clone();
            tokio::spawn(async move {
                coordinator
                    .await_all(2, |_| {
                        fired.fetch_add(1, Ordering::SeqCst);
                    })
                    .await;
            })
        };

        second.release_when_called().await;
        tokio::task::yield_now().await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        first.release_when_called().await;
        task.await.unwrap();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(first.calls.load(Ordering::SeqCst), 1);
        assert_eq!(second.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_hooks_run_once_across_waits() {
        let hook = Parked::new();
        let mut coordinator = CompletionCoordinator::new();
        coordinator.register("once", hook.clone(), shim());

        let waiting = coordinator.wait(0);
        futures::pin_mut!(waiting);
        assert!((&mut waiting).now_or_never().is_none());
        hook.release();
        assert_eq!(waiting.await, 0);

        assert_eq!(coordinator.wait(5).await, 0);
        assert_eq!(hook.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_dropped_signal_counts_as_done() {
        let hook = Parked::new();
        let mut coordinator = CompletionCoordinator::new();
        coordinator.register("dropper", hook.clone(), shim());

        let waiting = coordinator.wait(1);
        futures::pin_mut!(waiting);
        assert!((&mut waiting).now_or_never().is_none());
        drop(hook.parked.lock().unwrap().take());

        assert_eq!(waiting.await, 1);
    }
}
