// JSON reporter - one document with every result, written at the end of the run

use super::{Reporter, tally};
use crate::events::{EventKind, EventSource, RunEvent};
use crate::multi::ReporterContext;
use crate::state::{TestResult, TestResults, TestStatus};
use serde_json::json;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::warn;

/// JSON reporter
pub struct JsonReporter {
    results: Arc<Mutex<TestResults>>,
}

pub fn create(source: &dyn EventSource, context: ReporterContext) -> Arc<dyn Reporter> {
    Arc::new(JsonReporter::new(source, context))
}

impl JsonReporter {
    pub fn new(source: &dyn EventSource, context: ReporterContext) -> Self {
        let results = Arc::new(Mutex::new(TestResults::new()));

        for (kind, status) in [
            (EventKind::Pass, TestStatus::Pass),
            (EventKind::Fail, TestStatus::Fail),
            (EventKind::Pending, TestStatus::Pending),
        ] {
            let results = results.clone();
            source.listen(kind, move |event| {
                if let Some(info) = event.test() {
                    lock(&results).add(TestResult::from_info(info, status));
                }
            });
        }

        let out = context.output;
        let collected = results.clone();
        source.listen(EventKind::End, move |event| {
            let RunEvent::End { stats } = event else {
                return;
            };
            let results = lock(&collected);
            let of = |status| results.with_status(status).collect::<Vec<_>>();
            let document = json!({
                "stats": tally(&results, stats),
                "tests": results.all(),
                "pending": of(TestStatus::Pending),
                "failures": of(TestStatus::Fail),
                "passes": of(TestStatus::Pass),
            });

            match serde_json::to_string_pretty(&document) {
                Ok(text) => out.println(&text),
                Err(e) => warn!("Failed to serialize test results to JSON: {}", e),
            }
        });

        Self { results }
    }

    pub fn results(&self) -> TestResults {
        lock(&self.results).clone()
    }
}

impl Reporter for JsonReporter {}

fn lock(results: &Mutex<TestResults>) -> std::sync::MutexGuard<'_, TestResults> {
    results.lock().unwrap_or_else(PoisonError::into_inner)
}
