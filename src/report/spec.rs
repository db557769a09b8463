// Spec reporter - hierarchical console output

use super::{Palette, Reporter, tally, write_epilogue};
use crate::events::{EventKind, EventSource, RunEvent};
use crate::multi::{Output, ReporterContext};
use crate::state::{TestResult, TestResults, TestStatus};
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Default)]
struct SpecState {
    depth: usize,
    results: TestResults,
}

/// Prints suites as an indented tree with one line per test, then an epilogue
pub struct SpecReporter {
    state: Arc<Mutex<SpecState>>,
}

pub fn create(source: &dyn EventSource, context: ReporterContext) -> Arc<dyn Reporter> {
    Arc::new(SpecReporter::new(source, context))
}

impl SpecReporter {
    pub fn new(source: &dyn EventSource, context: ReporterContext) -> Self {
        let state = Arc::new(Mutex::new(SpecState::default()));
        let palette = Palette::from_context(&context);
        let out = context.output;

        source.listen(EventKind::Start, {
            let out = out.clone();
            move |_| out.println("")
        });

        source.listen(EventKind::SuiteBegin, {
            let (out, state) = (out.clone(), state.clone());
            move |event| {
                let RunEvent::SuiteBegin { title, depth } = event else {
                    return;
                };
                lock(&state).depth = *depth;
                if *depth > 0 {
                    out.println(&format!("{}{}", indent(*depth), title));
                }
            }
        });

        source.listen(EventKind::SuiteEnd, {
            let (out, state) = (out.clone(), state.clone());
            move |event| {
                let RunEvent::SuiteEnd { depth, .. } = event else {
                    return;
                };
                lock(&state).depth = depth.saturating_sub(1);
                if *depth == 1 {
                    out.println("");
                }
            }
        });

        source.listen(EventKind::Pass, {
            let (out, state, palette) = (out.clone(), state.clone(), palette.clone());
            move |event| {
                let Some(info) = event.test() else { return };
                let mut state = lock(&state);
                let mut line = format!(
                    "{}  {} {}",
                    indent(state.depth),
                    palette.pass("✓"),
                    palette.dim(&info.title)
                );
                if let Some(ms) = info.duration_ms {
                    line.push_str(&palette.dim(&format!(" ({}ms)", ms)));
                }
                out.println(&line);
                state.results.add(TestResult::from_info(info, TestStatus::Pass));
            }
        });

        source.listen(EventKind::Fail, {
            let (out, state, palette) = (out.clone(), state.clone(), palette.clone());
            move |event| {
                let Some(info) = event.test() else { return };
                let mut state = lock(&state);
                let number = state.results.failed() + 1;
                out.println(&format!(
                    "{}  {}",
                    indent(state.depth),
                    palette.fail(&format!("{}) {}", number, info.title))
                ));
                state.results.add(TestResult::from_info(info, TestStatus::Fail));
            }
        });

        source.listen(EventKind::Pending, {
            let (out, state, palette) = (out.clone(), state.clone(), palette.clone());
            move |event| {
                let Some(info) = event.test() else { return };
                let mut state = lock(&state);
                out.println(&format!(
                    "{}  {}",
                    indent(state.depth),
                    palette.pending(&format!("- {}", info.title))
                ));
                state
                    .results
                    .add(TestResult::from_info(info, TestStatus::Pending));
            }
        });

        source.listen(EventKind::End, {
            let state = state.clone();
            move |event| epilogue(&out, &palette, &lock(&state).results, event)
        });

        Self { state }
    }

    /// Results seen so far
    pub fn results(&self) -> TestResults {
        lock(&self.state).results.clone()
    }
}

impl Reporter for SpecReporter {}

fn epilogue(out: &Output, palette: &Palette, results: &TestResults, event: &RunEvent) {
    let RunEvent::End { stats } = event else {
        return;
    };
    let failures: Vec<TestResult> = results.with_status(TestStatus::Fail).cloned().collect();
    write_epilogue(out, palette, &tally(results, stats), &failures);
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

fn lock(state: &Mutex<SpecState>) -> std::sync::MutexGuard<'_, SpecState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
