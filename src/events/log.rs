// Event log - JSON lines, one event object per line

use super::RunEvent;
use crate::error::{MultiError, Result};
use std::io::{self, BufRead, Write};

/// Parse a recorded event log. Blank lines are skipped.
pub fn read_events<R: BufRead>(reader: R) -> Result<Vec<RunEvent>> {
    let mut events = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| MultiError::io("<event log>", e))?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event = serde_json::from_str(line).map_err(|e| {
            MultiError::configuration(format!("event log line {}: {}", index + 1, e))
        })?;
        events.push(event);
    }

    Ok(events)
}

/// Write one event as a single JSON line
pub fn write_event<W: Write + ?Sized>(writer: &mut W, event: &RunEvent) -> io::Result<()> {
    let line = serde_json::to_string(event).map_err(io::Error::other)?;
    writeln!(writer, "{}", line)
}
