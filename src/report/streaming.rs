// JSON stream reporter - one event per line, as it happens

use super::Reporter;
use crate::events::{EventKind, EventSource, write_event};
use crate::multi::ReporterContext;
use std::sync::Arc;
use tracing::warn;

/// Writes every event in the event-log line format, so its output can be
/// replayed through `multireport run`.
pub struct JsonStreamReporter;

pub fn create(source: &dyn EventSource, context: ReporterContext) -> Arc<dyn Reporter> {
    JsonStreamReporter::subscribe(source, context);
    Arc::new(JsonStreamReporter)
}

impl JsonStreamReporter {
    pub fn subscribe(source: &dyn EventSource, context: ReporterContext) {
        for kind in EventKind::ALL {
            let out = context.output.clone();
            source.listen(kind, move |event| {
                let mut writer = &out;
                if let Err(e) = write_event(&mut writer, event) {
                    warn!("Failed to stream '{}' event: {}", event.kind(), e);
                }
            });
        }
    }
}

impl Reporter for JsonStreamReporter {}
