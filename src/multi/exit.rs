// Exit sequencing - drain sinks and completion hooks before terminating

use super::completion::CompletionCoordinator;
use super::stream::FileSink;
use futures::future::{BoxFuture, join_all};
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::OnceCell;
use tracing::{debug, warn};

/// A destination that must be closed before the process may exit
pub trait Closeable: Send + Sync {
    /// Human-readable name for logs
    fn label(&self) -> String;

    /// Flush and release the destination
    fn close(&self) -> BoxFuture<'static, io::Result<()>>;
}

impl Closeable for FileSink {
    fn label(&self) -> String {
        self.path().display().to_string()
    }

    fn close(&self) -> BoxFuture<'static, io::Result<()>> {
        FileSink::close(self)
    }
}

/// Guards process termination on open sinks and pending completion hooks.
///
/// The entry point awaits [`ExitSequencer::drain`] with the exit code it
/// wants and the run's failure count, then terminates with whatever code the
/// drain hands back, which is always the requested one.
pub struct ExitSequencer {
    sinks: Vec<Arc<dyn Closeable>>,
    completion: Arc<CompletionCoordinator>,
    exiting: AtomicBool,
    closed: OnceCell<()>,
}

impl ExitSequencer {
    /// Install a sequencer for `sinks`. There is nothing to guard, and no
    /// sequencer, when the run owns no file sinks.
    pub fn install(
        sinks: Vec<Arc<dyn Closeable>>,
        completion: Arc<CompletionCoordinator>,
    ) -> Option<Self> {
        if sinks.is_empty() {
            return None;
        }

        debug!("Installing exit guard over {} sink(s)", sinks.len());
        Some(Self {
            sinks,
            completion,
            exiting: AtomicBool::new(false),
            closed: OnceCell::new(),
        })
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// True once a termination request is in flight
    pub fn is_exiting(&self) -> bool {
        self.exiting.load(Ordering::SeqCst)
    }

    /// Handle a termination request.
    ///
    /// The first request closes every sink, then waits for the completion
    /// hooks with `failures`, then resolves to `code`. A request arriving
    /// while another is in flight resolves to its own `code` immediately.
    pub async fn drain(&self, code: i32, failures: usize) -> i32 {
        if self.exiting.swap(true, Ordering::SeqCst) {
            debug!("Exit already in progress, exiting with {} now", code);
            return code;
        }

        self.close_sinks().await;

        if !self.completion.is_empty() {
            self.completion.wait(failures).await;
        }

        debug!("All sinks drained, exiting with {}", code);
        code
    }

    /// Close every sink concurrently. Runs once; later calls wait for the
    /// first. A sink that fails to close is logged and skipped.
    pub async fn close_sinks(&self) {
        self.closed
            .get_or_init(|| async {
                let results = join_all(self.sinks.iter().map(|sink| sink.close())).await;

                for (sink, result) in self.sinks.iter().zip(results) {
                    if let Err(e) = result {
                        warn!("Failed to close sink '{}': {}", sink.label(), e);
                    }
                }
                debug!("All {} sink(s) closed", self.sinks.len());
            })
            .await;
    }
}
