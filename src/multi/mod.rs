// Multi module - fan one run out to many reporters

pub mod completion;
pub mod exit;
pub mod redirect;
pub mod registry;
pub mod setup;
pub mod shim;
pub mod stream;

pub use completion::{CompletionCoordinator, DoneSignal};
pub use exit::{Closeable, ExitSequencer};
pub use redirect::{CaptureBuffer, Output, OutputRedirector};
pub use registry::{
    REPORTER_OPTIONS_KEY, ReporterConstructor, ReporterContext, ReporterOptions, ReporterOrigin,
    ReporterRegistry,
};
pub use setup::{OptionMap, ReporterEntry, ReporterSpec, parse_setup, resolve_setup};
pub use shim::RunnerShim;
pub use stream::{FileSink, SHARED_DESTINATION, Sink, resolve_stream};

use crate::error::Result;
use crate::events::EventSource;
use crate::report::Reporter;
use std::sync::Arc;
use tracing::{debug, warn};

/// One initialized reporter with its shim
pub struct FanoutEntry {
    pub spec: ReporterSpec,
    pub shim: Arc<RunnerShim>,
    pub reporter: Arc<dyn Reporter>,
}

/// A run source fanned out to every reporter of a setup.
///
/// Construction is all-or-nothing: any unknown reporter or unusable
/// destination fails the whole fan-out.
pub struct Fanout {
    entries: Vec<FanoutEntry>,
    redirector: Arc<OutputRedirector>,
    completion: Arc<CompletionCoordinator>,
    sequencer: Option<ExitSequencer>,
}

impl Fanout {
    pub fn new(
        source: Arc<dyn EventSource>,
        setup: &[ReporterSpec],
        shared_options: &OptionMap,
        registry: &ReporterRegistry,
        redirector: Arc<OutputRedirector>,
    ) -> Result<Self> {
        // Resolve every name before touching the filesystem, so an unknown
        // reporter leaves no files behind.
        for spec in setup {
            registry.resolve(&spec.name)?;
        }

        let shared_count = setup
            .iter()
            .filter(|spec| spec.destination == SHARED_DESTINATION)
            .count();
        if shared_count > 1 {
            warn!(
                "{} reporters write to the shared output; their output may interleave",
                shared_count
            );
        }

        // Open every destination before constructing any reporter, so an
        // unusable path fails the fan-out with nothing subscribed.
        let streams = setup
            .iter()
            .map(|spec| resolve_stream(&spec.destination))
            .collect::<Result<Vec<Sink>>>()?;

        let mut entries = Vec::with_capacity(setup.len());
        let mut completion = CompletionCoordinator::new();
        let mut sinks: Vec<Arc<dyn Closeable>> = Vec::new();

        for (spec, sink) in setup.iter().zip(streams) {
            debug!(
                "Initialising reporter '{}' to '{}' with options {:?}",
                spec.name, spec.destination, spec.options
            );

            if let Sink::File(file) = &sink {
                sinks.push(Arc::new(file.clone()));
            }

            let shim = RunnerShim::new(source.clone(), sink, redirector.clone());
            let options = ReporterOptions::merged(shared_options, spec.options.as_ref());
            let reporter = registry.instantiate(&spec.name, &shim, &redirector, options)?;

            if completion.register(&spec.name, reporter.clone(), shim.clone()) {
                debug!("Reporter '{}' has a done hook", spec.name);
            }

            entries.push(FanoutEntry {
                spec: spec.clone(),
                shim,
                reporter,
            });
        }

        let completion = Arc::new(completion);
        let sequencer = ExitSequencer::install(sinks, completion.clone());

        Ok(Self {
            entries,
            redirector,
            completion,
            sequencer,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[FanoutEntry] {
        &self.entries
    }

    pub fn completion(&self) -> &CompletionCoordinator {
        &self.completion
    }

    pub fn sequencer(&self) -> Option<&ExitSequencer> {
        self.sequencer.as_ref()
    }

    /// Finish the run: wait for every done hook, then close the file sinks.
    ///
    /// Hooks go first so that they can still write into their own sinks.
    pub async fn done(&self, failures: usize) -> usize {
        let failures = self.completion.wait(failures).await;
        if let Some(sequencer) = &self.sequencer {
            sequencer.close_sinks().await;
        }
        self.flush_shared();
        failures
    }

    /// Handle a termination request with `code`, resolving to the code the
    /// process must exit with once everything has drained. Done hooks still
    /// pending receive `failures`.
    pub async fn drain(&self, code: i32, failures: usize) -> i32 {
        let code = match &self.sequencer {
            Some(sequencer) => sequencer.drain(code, failures).await,
            None => code,
        };
        self.flush_shared();
        code
    }

    fn flush_shared(&self) {
        if let Err(e) = self.redirector.flush_defaults() {
            warn!("Failed to flush shared output: {}", e);
        }
    }
}
