// Dot reporter - one character per test

use super::{Palette, Reporter, tally, write_epilogue};
use crate::events::{EventKind, EventSource, RunEvent};
use crate::multi::ReporterContext;
use crate::state::{TestResult, TestResults, TestStatus};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Dots per line before wrapping
const LINE_WIDTH: usize = 80;

#[derive(Default)]
struct DotState {
    column: usize,
    results: TestResults,
}

/// Prints `.`, `F` or `,` per test, wrapping at [`LINE_WIDTH`]
pub struct DotReporter;

pub fn create(source: &dyn EventSource, context: ReporterContext) -> Arc<dyn Reporter> {
    DotReporter::subscribe(source, context);
    Arc::new(DotReporter)
}

impl DotReporter {
    pub fn subscribe(source: &dyn EventSource, context: ReporterContext) {
        let state = Arc::new(Mutex::new(DotState::default()));
        let palette = Palette::from_context(&context);
        let out = context.output;

        source.listen(EventKind::Start, {
            let out = out.clone();
            move |_| out.print("\n  ")
        });

        for (kind, status) in [
            (EventKind::Pass, TestStatus::Pass),
            (EventKind::Fail, TestStatus::Fail),
            (EventKind::Pending, TestStatus::Pending),
        ] {
            let (out, state, palette) = (out.clone(), state.clone(), palette.clone());
            source.listen(kind, move |event| {
                let Some(info) = event.test() else { return };
                let mut state = lock(&state);
                if state.column > 0 && state.column % LINE_WIDTH == 0 {
                    out.print("\n  ");
                }
                state.column += 1;

                let mark = match status {
                    TestStatus::Pass => palette.dim("."),
                    TestStatus::Fail => palette.fail("F"),
                    TestStatus::Pending => palette.pending(","),
                };
                out.print(&mark);
                state.results.add(TestResult::from_info(info, status));
            });
        }

        source.listen(EventKind::End, move |event| {
            let RunEvent::End { stats } = event else {
                return;
            };
            let state = lock(&state);
            let failures: Vec<TestResult> = state
                .results
                .with_status(TestStatus::Fail)
                .cloned()
                .collect();
            out.println("");
            write_epilogue(&out, &palette, &tally(&state.results, stats), &failures);
        });
    }
}

impl Reporter for DotReporter {}

fn lock(state: &Mutex<DotState>) -> MutexGuard<'_, DotState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
