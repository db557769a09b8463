// JUnit reporter - outputs test results in JUnit XML format

use super::{Reporter, tally};
use crate::events::{EventKind, EventSource, RunEvent};
use crate::multi::{Output, ReporterContext};
use crate::state::{RunStats, TestResult, TestResults, TestStatus};
use std::sync::{Arc, Mutex, PoisonError};

/// Suite name used when no `suite_name` option is given
pub const DEFAULT_SUITE_NAME: &str = "multireport";

/// JUnit reporter
pub struct JunitReporter {
    results: Arc<Mutex<TestResults>>,
}

pub fn create(source: &dyn EventSource, context: ReporterContext) -> Arc<dyn Reporter> {
    Arc::new(JunitReporter::new(source, context))
}

impl JunitReporter {
    pub fn new(source: &dyn EventSource, context: ReporterContext) -> Self {
        let results = Arc::new(Mutex::new(TestResults::new()));
        let suite_name = context
            .options
            .lookup("suite_name")
            .unwrap_or(DEFAULT_SUITE_NAME)
            .to_string();

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
            if let RunEvent::End { stats } = event {
                write_report(&out, &suite_name, &lock(&collected), stats);
            }
        });

        Self { results }
    }

    pub fn results(&self) -> TestResults {
        lock(&self.results).clone()
    }
}

impl Reporter for JunitReporter {}

fn write_report(out: &Output, suite_name: &str, results: &TestResults, end: &RunStats) {
    out.print(&render(suite_name, results, end));
}

/// Render the XML document for a finished run
pub fn render(suite_name: &str, results: &TestResults, end: &RunStats) -> String {
    let stats = tally(results, end);
    let name = escape(suite_name);
    let time = seconds(Some(stats.duration_ms));

    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!(
        "<testsuites name=\"{}\" time=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"0\" skipped=\"{}\">\n",
        name,
        time,
        results.total(),
        stats.failures,
        stats.pending
    ));
    xml.push_str(&format!(
        "  <testsuite name=\"{}\" time=\"{}\" tests=\"{}\" failures=\"{}\" errors=\"0\" skipped=\"{}\">\n",
        name,
        time,
        results.total(),
        stats.failures,
        stats.pending
    ));

    for result in results.all() {
        xml.push_str(&format!(
            "    <testcase name=\"{}\" classname=\"{}\" time=\"{}\"",
            escape(&result.title),
            escape(&classname(result, suite_name)),
            seconds(result.duration_ms)
        ));

        match result.status {
            TestStatus::Pass => xml.push_str(" />\n"),
            TestStatus::Fail => {
                let msg = escape(result.error_message.as_deref().unwrap_or("Test failed"));
                xml.push_str(">\n");
                xml.push_str(&format!(
                    "      <failure message=\"{}\" type=\"AssertionError\">{}</failure>\n",
                    msg, msg
                ));
                xml.push_str("    </testcase>\n");
            }
            TestStatus::Pending => {
                xml.push_str(">\n");
                xml.push_str("      <skipped />\n");
                xml.push_str("    </testcase>\n");
            }
        }
    }

    xml.push_str("  </testsuite>\n");
    xml.push_str("</testsuites>\n");
    xml
}

/// Suite path of a test: its full title without the trailing own title
fn classname(result: &TestResult, fallback: &str) -> String {
    result
        .full_title
        .strip_suffix(&result.title)
        .map(str::trim_end)
        .filter(|prefix| !prefix.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

fn seconds(duration_ms: Option<u64>) -> String {
    format!("{:.3}", duration_ms.unwrap_or(0) as f64 / 1000.0)
}

/// Escape the five XML special characters
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn lock(results: &Mutex<TestResults>) -> std::sync::MutexGuard<'_, TestResults> {
    results.lock().unwrap_or_else(PoisonError::into_inner)
}
