// State module - results collected over one run

pub mod metrics;
pub mod result;

pub use metrics::RunStats;
pub use result::TestResult;

use serde::Serialize;

/// Test results storage
#[derive(Debug, Clone, Default, Serialize)]
pub struct TestResults {
    passed: usize,
    failed: usize,
    pending: usize,
    results: Vec<TestResult>,
}

impl TestResults {
    /// Create new test results
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a test result
    pub fn add(&mut self, result: TestResult) {
        match result.status {
            TestStatus::Pass => self.passed += 1,
            TestStatus::Fail => self.failed += 1,
            TestStatus::Pending => self.pending += 1,
        }
        self.results.push(result);
    }

    /// Get total tests
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Get passed tests
    pub fn passed(&self) -> usize {
        self.passed
    }

    /// Get failed tests
    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Get pending tests
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Get all results
    pub fn all(&self) -> &[TestResult] {
        &self.results
    }

    /// Results with the given status, in arrival order
    pub fn with_status(&self, status: TestStatus) -> impl Iterator<Item = &TestResult> {
        self.results.iter().filter(move |r| r.status == status)
    }

    /// Check if all tests passed
    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}

/// Test status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestStatus {
    Pass,
    Fail,
    Pending,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_by_status() {
        let mut results = TestResults::new();
        results.add(TestResult::pass("a", 1));
        results.add(TestResult::fail("b", "nope"));
        results.add(TestResult::pending("c"));
        results.add(TestResult::pass("d", 2));

        assert_eq!(results.total(), 4);
        assert_eq!(results.passed(), 2);
        assert_eq!(results.failed(), 1);
        assert_eq!(results.pending(), 1);
        assert!(!results.all_passed());
        assert_eq!(results.with_status(TestStatus::Pass).count(), 2);
    }
}
