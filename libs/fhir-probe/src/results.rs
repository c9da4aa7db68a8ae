//! Pass/fail/skip bookkeeping for scenario checks

use colored::Colorize;

/// Outcome counters for one scenario (or several, once merged).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestResults {
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// `(check name, reason)` of every failure, in order.
    pub failures: Vec<(String, String)>,
}

impl TestResults {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_pass(&mut self, name: &str) {
        self.passed += 1;
        println!("{} {name}", "✓".green());
    }

    pub fn add_fail(&mut self, name: &str, reason: impl Into<String>) {
        let reason = reason.into();
        self.failed += 1;
        println!("{} {name}: {reason}", "✗".red());
        tracing::debug!(check = name, reason = %reason, "check failed");
        self.failures.push((name.to_string(), reason));
    }

    pub fn add_skip(&mut self, name: &str, reason: impl AsRef<str>) {
        self.skipped += 1;
        println!("{} {name}: {}", "⊘".yellow(), reason.as_ref());
    }

    /// Fold another result set into this one.
    pub fn merge(&mut self, other: TestResults) {
        self.passed += other.passed;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.failures.extend(other.failures);
    }

    pub fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }

    /// Print the summary block; returns true when nothing failed.
    pub fn print_summary(&self) -> bool {
        println!("\n{}", "Test Summary".bold());
        println!("{}", "=".repeat(60));
        println!("Passed:  {}", self.passed.to_string().green());
        println!("Failed:  {}", self.failed.to_string().red());
        println!("Skipped: {}", self.skipped.to_string().yellow());
        println!("Total:   {}", self.total());

        if !self.failures.is_empty() {
            println!("\n{}", "Failed Tests:".red());
            for (name, reason) in &self.failures {
                println!("  - {name}: {reason}");
            }
        }

        self.all_passed()
    }
}

impl FromIterator<TestResults> for TestResults {
    fn from_iter<T: IntoIterator<Item = TestResults>>(iter: T) -> Self {
        let mut total = TestResults::new();
        for results in iter {
            total.merge(results);
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_outcomes() {
        let mut results = TestResults::new();
        results.add_pass("Create organization");
        results.add_skip("Search by phone", "known limitation");
        results.add_fail("Update organization", "Status 409");

        assert_eq!(results.passed, 1);
        assert_eq!(results.skipped, 1);
        assert_eq!(results.failed, 1);
        assert_eq!(results.total(), 3);
        assert_eq!(
            results.failures,
            vec![("Update organization".to_string(), "Status 409".to_string())]
        );
        assert!(!results.all_passed());
    }

    #[test]
    fn test_aggregate_preserves_failure_order() {
        let mut first = TestResults::new();
        first.add_pass("a");
        first.add_fail("b", "first");
        let mut second = TestResults::new();
        second.add_fail("c", "second");
        second.add_skip("d", "later");

        let total: TestResults = vec![first, second].into_iter().collect();
        assert_eq!(total.passed, 1);
        assert_eq!(total.failed, 2);
        assert_eq!(total.skipped, 1);
        assert_eq!(total.failures[0].0, "b");
        assert_eq!(total.failures[1].0, "c");
    }

    #[test]
    fn test_summary_reports_success() {
        let mut results = TestResults::new();
        results.add_pass("only check");
        assert!(results.print_summary());
    }
}
