// Run statistics

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Running counters of one test run, as tracked by the run source
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStats {
    #[serde(default)]
    pub suites: usize,
    #[serde(default)]
    pub tests: usize,
    #[serde(default)]
    pub passes: usize,
    #[serde(default)]
    pub pending: usize,
    #[serde(default)]
    pub failures: usize,
    /// Unix millis at `start`, 0 if the run has not started
    #[serde(default)]
    pub start_time: i64,
    /// Unix millis at `end`, 0 while the run is in progress
    #[serde(default)]
    pub end_time: i64,
    #[serde(default)]
    pub duration_ms: u64,
}

impl RunStats {
    /// Mark the start of the run
    pub fn begin(&mut self) {
        self.start_time = Utc::now().timestamp_millis();
    }

    /// Mark the end of the run and compute the duration
    pub fn finish(&mut self) {
        self.end_time = Utc::now().timestamp_millis();
        if self.start_time > 0 {
            self.duration_ms = (self.end_time - self.start_time).max(0) as u64;
        }
    }

    /// Exit code a test runner would use for these stats
    pub fn exit_code(&self) -> i32 {
        self.failures.min(255) as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_is_clamped() {
        let stats = RunStats {
            failures: 300,
            ..Default::default()
        };
        assert_eq!(stats.exit_code(), 255);
    }

    #[test]
    fn test_finish_computes_duration() {
        let mut stats = RunStats::default();
        stats.begin();
        stats.finish();
        assert!(stats.end_time >= stats.start_time);
    }
}
