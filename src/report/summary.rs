// Summary reporter - a short totals block, written by the completion hook

use super::{Reporter, tally};
use crate::events::{EventKind, EventSource, RunEvent};
use crate::multi::{DoneSignal, Output, ReporterContext};
use crate::state::{RunStats, TestResult, TestResults, TestStatus};
use std::io::Write;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Heading used when no `title` option is given
pub const DEFAULT_TITLE: &str = "Test summary";

#[derive(Default)]
struct SummaryState {
    results: TestResults,
    end: Option<RunStats>,
}

/// Writes nothing while the run is in progress. The totals are written from
/// [`Reporter::done`], after every other reporter has seen `end`.
pub struct SummaryReporter {
    state: Arc<Mutex<SummaryState>>,
    output: Output,
    title: String,
}

pub fn create(source: &dyn EventSource, context: ReporterContext) -> Arc<dyn Reporter> {
    Arc::new(SummaryReporter::new(source, context))
}

impl SummaryReporter {
    pub fn new(source: &dyn EventSource, context: ReporterContext) -> Self {
        let state = Arc::new(Mutex::new(SummaryState::default()));

        for (kind, status) in [
            (EventKind::Pass, TestStatus::Pass),
            (EventKind::Fail, TestStatus::Fail),
            (EventKind::Pending, TestStatus::Pending),
        ] {
            let state = state.clone();
            source.listen(kind, move |event| {
                if let Some(info) = event.test() {
                    lock(&state).results.add(TestResult::from_info(info, status));
                }
            });
        }

        source.listen(EventKind::End, {
            let state = state.clone();
            move |event| {
                if let RunEvent::End { stats } = event {
                    lock(&state).end = Some(stats.clone());
                }
            }
        });

        let title = context
            .options
            .lookup("title")
            .unwrap_or(DEFAULT_TITLE)
            .to_string();

        Self {
            state,
            output: context.output,
            title,
        }
    }

    /// Render the summary block for `failures` reported failures
    pub fn render(&self, failures: usize) -> String {
        let state = lock(&self.state);
        let stats = tally(&state.results, state.end.as_ref().unwrap_or(&RunStats::default()));
        let verdict = if failures == 0 { "PASSED" } else { "FAILED" };

        let mut block = String::new();
        block.push_str(&format!("{}\n", self.title));
        block.push_str(&format!("  tests:    {}\n", stats.tests));
        block.push_str(&format!("  passes:   {}\n", stats.passes));
        block.push_str(&format!("  pending:  {}\n", stats.pending));
        block.push_str(&format!("  failures: {}\n", failures));
        block.push_str(&format!("  duration: {}ms\n", stats.duration_ms));
        block.push_str(&format!("  result:   {}\n", verdict));
        block
    }
}

impl Reporter for SummaryReporter {
    fn has_done(&self) -> bool {
        true
    }

    fn done(&self, failures: usize, done: DoneSignal) {
        debug!("Writing summary for {} failure(s)", failures);
        self.output.print(&self.render(failures));
        if let Err(e) = (&self.output).flush() {
            warn!("Failed to flush summary: {}", e);
        }
        done.finish();
    }
}

fn lock(state: &Mutex<SummaryState>) -> MutexGuard<'_, SummaryState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
