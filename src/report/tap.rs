// TAP reporter - Test Anything Protocol, version 13

use super::Reporter;
use crate::events::{EventKind, EventSource, RunEvent};
use crate::multi::ReporterContext;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
struct Counters {
    number: AtomicUsize,
    passes: AtomicUsize,
    failures: AtomicUsize,
    pending: AtomicUsize,
}

impl Counters {
    fn next(&self, bucket: &AtomicUsize) -> usize {
        bucket.fetch_add(1, Ordering::SeqCst);
        self.number.fetch_add(1, Ordering::SeqCst) + 1
    }
}

pub struct TapReporter;

pub fn create(source: &dyn EventSource, context: ReporterContext) -> Arc<dyn Reporter> {
    TapReporter::subscribe(source, context);
    Arc::new(TapReporter)
}

impl TapReporter {
    pub fn subscribe(source: &dyn EventSource, context: ReporterContext) {
        let counters = Arc::new(Counters::default());
        let out = context.output;
        let planned = source.total();

        source.listen(EventKind::Start, {
            let out = out.clone();
            move |event| {
                let total = match event {
                    RunEvent::Start { total } if *total > 0 => *total,
                    _ => planned,
                };
                out.println("TAP version 13");
                out.println(&format!("1..{}", total));
            }
        });

        source.listen(EventKind::Pass, {
            let (out, counters) = (out.clone(), counters.clone());
            move |event| {
                let Some(info) = event.test() else { return };
                let n = counters.next(&counters.passes);
                out.println(&format!("ok {} {}", n, sanitize(&info.full_title)));
            }
        });

        source.listen(EventKind::Fail, {
            let (out, counters) = (out.clone(), counters.clone());
            move |event| {
                let Some(info) = event.test() else { return };
                let n = counters.next(&counters.failures);
                out.println(&format!("not ok {} {}", n, sanitize(&info.full_title)));
                if let Some(error) = &info.error {
                    out.println("  ---");
                    out.println("  message: |-");
                    for line in error.lines() {
                        out.println(&format!("    {}", line));
                    }
                    out.println("  ...");
                }
            }
        });

        source.listen(EventKind::Pending, {
            let (out, counters) = (out.clone(), counters.clone());
            move |event| {
                let Some(info) = event.test() else { return };
                let n = counters.next(&counters.pending);
                out.println(&format!("ok {} {} # SKIP -", n, sanitize(&info.full_title)));
            }
        });

        source.listen(EventKind::End, move |_| {
            out.println(&format!("# tests {}", counters.number.load(Ordering::SeqCst)));
            out.println(&format!("# pass {}", counters.passes.load(Ordering::SeqCst)));
            out.println(&format!("# fail {}", counters.failures.load(Ordering::SeqCst)));
            out.println(&format!("# pending {}", counters.pending.load(Ordering::SeqCst)));
        });
    }
}

impl Reporter for TapReporter {}

/// `#` starts a directive in TAP, so it must not appear in a description
fn sanitize(title: &str) -> String {
    title.replace('#', "")
}
