// Test result structures

use crate::events::TestInfo;
use crate::state::TestStatus;
use serde::Serialize;

/// Outcome of one test, as collected by the aggregating reporters
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestResult {
    pub title: String,
    pub full_title: String,
    pub status: TestStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
}

impl TestResult {
    /// Build a result from the payload of a `pass`, `fail` or `pending` event
    pub fn from_info(info: &TestInfo, status: TestStatus) -> Self {
        Self {
            title: info.title.clone(),
            full_title: info.full_title.clone(),
            status,
            duration_ms: info.duration_ms,
            error_message: info.error.clone(),
            file: info.file.clone(),
        }
    }

    /// Create a pass result
    pub fn pass(title: impl Into<String>, duration_ms: u64) -> Self {
        let title = title.into();
        Self {
            full_title: title.clone(),
            title,
            status: TestStatus::Pass,
            duration_ms: Some(duration_ms),
            error_message: None,
            file: None,
        }
    }

    /// Create a fail result
    pub fn fail(title: impl Into<String>, error_message: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            full_title: title.clone(),
            title,
            status: TestStatus::Fail,
            duration_ms: None,
            error_message: Some(error_message.into()),
            file: None,
        }
    }

    /// Create a pending result
    pub fn pending(title: impl Into<String>) -> Self {
        let title = title.into();
        Self {
            full_title: title.clone(),
            title,
            status: TestStatus::Pending,
            duration_ms: None,
            error_message: None,
            file: None,
        }
    }
}
