//! Scenario output

use console::{style, Term};
use talent_probe::{Scenario, ScenarioOutcome, ScenarioResult, SuiteReport};

/// Prints one line per scenario and a summary
#[derive(Debug)]
pub struct Reporter {
    term: Term,
    /// Whether to use colors
    pub use_color: bool,
    /// Quiet mode
    pub quiet: bool,
}

impl Default for Reporter {
    fn default() -> Self {
        Self::new(true, false)
    }
}

impl Reporter {
    /// Create a reporter writing to stdout
    #[must_use]
    pub fn new(use_color: bool, quiet: bool) -> Self {
        Self {
            term: Term::stdout(),
            use_color,
            quiet,
        }
    }

    fn tag(&self, outcome: &ScenarioOutcome) -> String {
        match (outcome, self.use_color) {
            (ScenarioOutcome::Passed, true) => style("✓").green().bold().to_string(),
            (ScenarioOutcome::Failed(_), true) => style("✗").red().bold().to_string(),
            (ScenarioOutcome::Skipped(_), true) => style("-").yellow().to_string(),
            (ScenarioOutcome::Passed, false) => "PASS".to_string(),
            (ScenarioOutcome::Failed(_), false) => "FAIL".to_string(),
            (ScenarioOutcome::Skipped(_), false) => "SKIP".to_string(),
        }
    }

    /// Render a result line
    #[must_use]
    pub fn line(&self, result: &ScenarioResult) -> String {
        let tag = self.tag(&result.outcome);
        let millis = result.duration.as_millis();
        match &result.outcome {
            ScenarioOutcome::Passed => format!("{tag} {} ({millis}ms)", result.name),
            ScenarioOutcome::Failed(reason) => {
                format!("{tag} {} ({millis}ms)\n    {reason}", result.name)
            }
            ScenarioOutcome::Skipped(reason) => format!("{tag} {} [{reason}]", result.name),
        }
    }

    /// Render the summary line
    #[must_use]
    pub fn summary_line(&self, report: &SuiteReport) -> String {
        let passed = format!("{} passed", report.passed_count());
        let failed = format!("{} failed", report.failed_count());
        let skipped = format!("{} skipped", report.skipped_count());
        let secs = report.duration.as_secs_f64();
        if self.use_color {
            format!(
                "{}, {}, {} in {secs:.2}s",
                style(passed).green(),
                if report.failed_count() > 0 {
                    style(failed).red().bold()
                } else {
                    style(failed).dim()
                },
                style(skipped).yellow()
            )
        } else {
            format!("{passed}, {failed}, {skipped} in {secs:.2}s")
        }
    }

    /// Print every result, then the summary
    pub fn report(&self, report: &SuiteReport) {
        for result in &report.results {
            if self.quiet && !result.outcome.is_failed() {
                continue;
            }
            let _ = self.term.write_line(&self.line(result));
        }
        let _ = self.term.write_line("");
        let _ = self.term.write_line(&self.summary_line(report));
    }

    /// Print the catalog
    pub fn list(&self, scenarios: &[Box<dyn Scenario>]) {
        for (i, scenario) in scenarios.iter().enumerate() {
            let line = match scenario.disabled() {
                Some(reason) if self.use_color => format!(
                    "{:>2}. {} {}",
                    i + 1,
                    scenario.name(),
                    style(format!("(disabled: {reason})")).dim()
                ),
                Some(reason) => format!("{:>2}. {} (disabled: {reason})", i + 1, scenario.name()),
                None => format!("{:>2}. {}", i + 1, scenario.name()),
            };
            let _ = self.term.write_line(&line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn result(name: &str, outcome: ScenarioOutcome) -> ScenarioResult {
        ScenarioResult {
            name: name.to_string(),
            outcome,
            duration: Duration::from_millis(12),
        }
    }

    #[test]
    fn test_plain_lines() {
        let reporter = Reporter::new(false, false);
        assert_eq!(
            reporter.line(&result("a", ScenarioOutcome::Passed)),
            "PASS a (12ms)"
        );
        assert_eq!(
            reporter.line(&result("b", ScenarioOutcome::Skipped("no seed".into()))),
            "SKIP b [no seed]"
        );
        let failed = reporter.line(&result("c", ScenarioOutcome::Failed("boom".into())));
        assert!(failed.starts_with("FAIL c"));
        assert!(failed.ends_with("    boom"));
    }

    #[test]
    fn test_plain_summary() {
        let reporter = Reporter::new(false, false);
        let report = SuiteReport {
            results: vec![
                result("a", ScenarioOutcome::Passed),
                result("b", ScenarioOutcome::Skipped("x".into())),
            ],
            duration: Duration::from_millis(1500),
        };
        assert_eq!(
            reporter.summary_line(&report),
            "1 passed, 0 failed, 1 skipped in 1.50s"
        );
    }
}
