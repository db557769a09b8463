// Tests for the built-in reporters - public API only

use multireport::events::{Runner, RunEvent, TestInfo, read_events};
use multireport::multi::{
    CaptureBuffer, OptionMap, OutputRedirector, ReporterContext, ReporterOptions,
    ReporterRegistry,
};
use multireport::report::junit::{escape, render};
use multireport::report::{JunitReporter, Reporter, SummaryReporter};
use multireport::state::{RunStats, TestResult, TestResults};
use std::io::Cursor;

fn context(own: Option<&OptionMap>) -> (ReporterContext, CaptureBuffer) {
    let out = CaptureBuffer::new();
    let redirector = OutputRedirector::with_writers(out.clone(), CaptureBuffer::new());
    (
        ReporterContext::new(&redirector, ReporterOptions::merged(&OptionMap::new(), own)),
        out,
    )
}

fn mixed_run() -> Vec<RunEvent> {
    vec![
        RunEvent::Start { total: 3 },
        RunEvent::SuiteBegin {
            title: "parser".into(),
            depth: 1,
        },
        RunEvent::Pass(TestInfo::new("parser reads <tags>", "reads <tags>").with_duration(5)),
        RunEvent::Fail(
            TestInfo::new("parser rejects", "rejects").with_error("expected \"a\" & got 'b'"),
        ),
        RunEvent::Pending(TestInfo::new("parser later", "later")),
        RunEvent::SuiteEnd {
            title: "parser".into(),
            depth: 1,
        },
        RunEvent::End {
            stats: RunStats::default(),
        },
    ]
}

#[test]
fn test_junit_escapes_titles_and_messages() {
    // Arrange
    let mut own = OptionMap::new();
    own.insert("suite_name".into(), "unit & e2e".into());
    let (context, out) = context(Some(&own));
    let runner = Runner::new();
    let reporter = JunitReporter::new(&runner, context);

    // Act
    runner.replay(&mixed_run());

    // Assert
    let xml = out.contents();
    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("<testsuites name=\"unit &amp; e2e\""));
    assert!(xml.contains("name=\"reads &lt;tags&gt;\" classname=\"parser\""));
    assert!(xml.contains("message=\"expected &quot;a&quot; &amp; got &apos;b&apos;\""));
    assert!(xml.contains("tests=\"3\" failures=\"1\" errors=\"0\" skipped=\"1\""));
    assert_eq!(reporter.results().total(), 3);
}

#[test]
fn test_junit_render_without_results() {
    // Act
    let xml = render("empty", &TestResults::new(), &RunStats::default());

    // Assert
    assert!(xml.contains("tests=\"0\" failures=\"0\""));
    assert!(xml.ends_with("</testsuites>\n"));
    assert_eq!(escape("plain"), "plain");
}

#[test]
fn test_json_stream_output_replays_to_same_events() {
    // Arrange
    let registry = ReporterRegistry::new();
    let constructor = registry.resolve("json-stream").unwrap();
    let (context, out) = context(None);
    let runner = Runner::new();
    let _reporter = constructor(&runner, context);
    let events = mixed_run();

    // Act
    runner.replay(&events);
    let replayed = read_events(Cursor::new(out.contents())).unwrap();

    // Assert
    assert_eq!(replayed, events);
}

#[test]
fn test_only_summary_has_a_done_hook() {
    // Arrange
    let registry = ReporterRegistry::new();
    let runner = Runner::new();

    // Act
    let with_hooks: Vec<&str> = registry
        .names()
        .into_iter()
        .filter(|(name, _)| {
            let (context, _) = context(None);
            registry.resolve(name).unwrap()(&runner, context).has_done()
        })
        .map(|(name, _)| name)
        .collect();

    // Assert
    assert_eq!(with_hooks, vec!["summary"]);
}

#[test]
fn test_summary_verdict_follows_failures() {
    // Arrange
    let (context, _) = context(None);
    let runner = Runner::new();
    let reporter = SummaryReporter::new(&runner, context);
    runner.emit(&RunEvent::Pass(TestInfo::new("a", "a")));

    // Act
    let passed = reporter.render(0);
    let failed = reporter.render(2);

    // Assert
    assert!(passed.starts_with("Test summary\n"));
    assert!(passed.contains("result:   PASSED"));
    assert!(failed.contains("failures: 2"));
    assert!(failed.contains("result:   FAILED"));
}

#[test]
fn test_result_helpers() {
    // Arrange
    let mut results = TestResults::new();

    // Act
    results.add(TestResult::pass("ok", 3));
    results.add(TestResult::pending("later"));

    // Assert
    assert!(results.all_passed());
    assert_eq!(results.pending(), 1);
}
