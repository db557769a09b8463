// Run events - the lifecycle vocabulary shared by run sources and reporters

pub mod log;
pub mod runner;

pub use log::{read_events, write_event};
pub use runner::Runner;

use crate::state::RunStats;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Name of a lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Start,
    SuiteBegin,
    SuiteEnd,
    TestBegin,
    Pass,
    Fail,
    Pending,
    TestEnd,
    End,
}

impl EventKind {
    pub const ALL: [EventKind; 9] = [
        EventKind::Start,
        EventKind::SuiteBegin,
        EventKind::SuiteEnd,
        EventKind::TestBegin,
        EventKind::Pass,
        EventKind::Fail,
        EventKind::Pending,
        EventKind::TestEnd,
        EventKind::End,
    ];

    /// Wire name of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::SuiteBegin => "suite",
            Self::SuiteEnd => "suite end",
            Self::TestBegin => "test",
            Self::Pass => "pass",
            Self::Fail => "fail",
            Self::Pending => "pending",
            Self::TestEnd => "test end",
            Self::End => "end",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| format!("unknown event '{}'", s))
    }
}

/// Payload carried by test-level events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestInfo {
    pub title: String,
    #[serde(default)]
    pub full_title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl TestInfo {
    pub fn new(full_title: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            full_title: full_title.into(),
            ..Default::default()
        }
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }
}

/// One lifecycle event of a test run.
///
/// Serialized as a single JSON object tagged by `event`, which is also the
/// line format of a recorded event log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum RunEvent {
    #[serde(rename = "start")]
    Start {
        #[serde(default)]
        total: usize,
    },

    #[serde(rename = "suite")]
    SuiteBegin {
        title: String,
        #[serde(default)]
        depth: usize,
    },

    #[serde(rename = "suite end")]
    SuiteEnd {
        title: String,
        #[serde(default)]
        depth: usize,
    },

    #[serde(rename = "test")]
    TestBegin(TestInfo),

    #[serde(rename = "pass")]
    Pass(TestInfo),

    #[serde(rename = "fail")]
    Fail(TestInfo),

    #[serde(rename = "pending")]
    Pending(TestInfo),

    #[serde(rename = "test end")]
    TestEnd(TestInfo),

    #[serde(rename = "end")]
    End {
        #[serde(default)]
        stats: RunStats,
    },
}

impl RunEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Start { .. } => EventKind::Start,
            Self::SuiteBegin { .. } => EventKind::SuiteBegin,
            Self::SuiteEnd { .. } => EventKind::SuiteEnd,
            Self::TestBegin(_) => EventKind::TestBegin,
            Self::Pass(_) => EventKind::Pass,
            Self::Fail(_) => EventKind::Fail,
            Self::Pending(_) => EventKind::Pending,
            Self::TestEnd(_) => EventKind::TestEnd,
            Self::End { .. } => EventKind::End,
        }
    }

    /// Test payload, for test-level events
    pub fn test(&self) -> Option<&TestInfo> {
        match self {
            Self::TestBegin(info)
            | Self::Pass(info)
            | Self::Fail(info)
            | Self::Pending(info)
            | Self::TestEnd(info) => Some(info),
            _ => None,
        }
    }
}

/// Callback registered for one event kind
pub type Listener = Arc<dyn Fn(&RunEvent) + Send + Sync>;

/// Anything a reporter can subscribe to: the true run source or a per-reporter shim
pub trait EventSource: Send + Sync {
    /// Register a listener for one event kind
    fn on(&self, kind: EventKind, listener: Listener);

    /// Number of tests the run is expected to execute
    fn total(&self) -> usize;

    /// Snapshot of the run's counters
    fn stats(&self) -> RunStats;
}

impl dyn EventSource + '_ {
    /// Register a closure as a listener
    pub fn listen<F>(&self, kind: EventKind, listener: F)
    where
        F: Fn(&RunEvent) + Send + Sync + 'static,
    {
        self.on(kind, Arc::new(listener));
    }
}
