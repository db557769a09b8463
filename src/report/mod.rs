// Report module - built-in reporters

pub mod dot;
pub mod json;
pub mod junit;
pub mod spec;
pub mod streaming;
pub mod summary;
pub mod tap;

pub use dot::DotReporter;
pub use json::JsonReporter;
pub use junit::JunitReporter;
pub use spec::SpecReporter;
pub use streaming::JsonStreamReporter;
pub use summary::SummaryReporter;
pub use tap::TapReporter;

use crate::events::EventSource;
use crate::multi::{DoneSignal, Output, ReporterConstructor, ReporterContext};
use crate::state::{RunStats, TestResult, TestResults};
use console::Style;
use std::sync::Arc;

/// Reporter trait.
///
/// A reporter subscribes to its event source when it is constructed; the
/// object itself only carries the optional completion hook.
pub trait Reporter: Send + Sync {
    /// Whether [`Reporter::done`] needs to run after the run ends
    fn has_done(&self) -> bool {
        false
    }

    /// Completion hook. Must eventually call `done.finish()`.
    fn done(&self, failures: usize, done: DoneSignal) {
        let _ = failures;
        done.finish();
    }
}

/// Reporters shipped with the crate, in lookup order
pub fn builtin_reporters() -> Vec<(&'static str, ReporterConstructor)> {
    vec![
        entry("spec", spec::create),
        entry("dot", dot::create),
        entry("tap", tap::create),
        entry("json", json::create),
        entry("json-stream", streaming::create),
        entry("junit", junit::create),
        entry("summary", summary::create),
    ]
}

fn entry<F>(name: &'static str, constructor: F) -> (&'static str, ReporterConstructor)
where
    F: Fn(&dyn EventSource, ReporterContext) -> Arc<dyn Reporter> + Send + Sync + 'static,
{
    let constructor: ReporterConstructor = Arc::new(constructor);
    (name, constructor)
}

/// Colors for console-style reporters; plain text unless enabled
#[derive(Debug, Clone)]
pub(crate) struct Palette {
    pass: Style,
    fail: Style,
    pending: Style,
    dim: Style,
}

impl Palette {
    pub(crate) fn new(enabled: bool) -> Self {
        Self {
            pass: Style::new().green().force_styling(enabled),
            fail: Style::new().red().force_styling(enabled),
            pending: Style::new().cyan().force_styling(enabled),
            dim: Style::new().dim().force_styling(enabled),
        }
    }

    /// Palette from the `color` option (own option first, then shared)
    pub(crate) fn from_context(context: &ReporterContext) -> Self {
        Self::new(context.options.lookup("color") == Some("true"))
    }

    pub(crate) fn pass(&self, text: &str) -> String {
        self.pass.apply_to(text).to_string()
    }

    pub(crate) fn fail(&self, text: &str) -> String {
        self.fail.apply_to(text).to_string()
    }

    pub(crate) fn pending(&self, text: &str) -> String {
        self.pending.apply_to(text).to_string()
    }

    pub(crate) fn dim(&self, text: &str) -> String {
        self.dim.apply_to(text).to_string()
    }
}

/// Counters as seen by one reporter, timed by the `end` event's stats.
///
/// A replayed log may carry empty stats on `end`, so the counts come from the
/// reporter's own results.
pub(crate) fn tally(results: &TestResults, end: &RunStats) -> RunStats {
    RunStats {
        tests: results.total(),
        passes: results.passed(),
        failures: results.failed(),
        pending: results.pending(),
        ..end.clone()
    }
}

/// Closing block shared by the console reporters: counts, then failure details
pub(crate) fn write_epilogue(
    out: &Output,
    palette: &Palette,
    stats: &RunStats,
    failures: &[TestResult],
) {
    out.println("");
    out.println(&format!(
        "  {} {}",
        palette.pass(&format!("{} passing", stats.passes)),
        palette.dim(&format!("({}ms)", stats.duration_ms))
    ));

    if stats.pending > 0 {
        out.println(&format!(
            "  {}",
            palette.pending(&format!("{} pending", stats.pending))
        ));
    }

    if stats.failures > 0 {
        out.println(&format!(
            "  {}",
            palette.fail(&format!("{} failing", stats.failures))
        ));
        out.println("");

        for (index, failure) in failures.iter().enumerate() {
            out.println(&format!("  {}) {}:", index + 1, failure.full_title));
            let message = failure.error_message.as_deref().unwrap_or("Test failed");
            for line in message.lines() {
                out.println(&format!("     {}", palette.fail(line)));
            }
            out.println("");
        }
    }

    out.println("");
}
