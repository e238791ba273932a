//! Scenario runner.
//!
//! Each scenario gets a fresh browser session, runs under a scenario-level
//! timeout, and ends as passed, failed or skipped. Unmet seed preconditions
//! are skips, never failures. The session is closed whatever the outcome.

use crate::config::HarnessConfig;
use crate::driver::SessionFactory;
use crate::result::{ProbeError, ProbeResult};
use crate::session::Session;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// How a scenario ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioOutcome {
    /// Every assertion held
    Passed,
    /// An assertion or driver call failed
    Failed(String),
    /// Not run or not runnable against this environment
    Skipped(String),
}

impl ScenarioOutcome {
    /// Map a scenario body's result
    #[must_use]
    pub fn from_result(result: &ProbeResult<()>) -> Self {
        match result {
            Ok(()) => Self::Passed,
            Err(ProbeError::PreconditionUnmet { reason }) => Self::Skipped(reason.clone()),
            Err(err) => Self::Failed(err.to_string()),
        }
    }

    /// Check if passed
    #[must_use]
    pub const fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Check if failed
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    /// Check if skipped
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }
}

impl fmt::Display for ScenarioOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passed => write!(f, "passed"),
            Self::Failed(reason) => write!(f, "failed: {reason}"),
            Self::Skipped(reason) => write!(f, "skipped: {reason}"),
        }
    }
}

/// One end-to-end scenario
#[async_trait]
pub trait Scenario: Send + Sync {
    /// Human-readable name
    fn name(&self) -> &'static str;

    /// Why the scenario is switched off, if it is
    fn disabled(&self) -> Option<&'static str> {
        None
    }

    /// Scenario body
    async fn run(&self, session: &Session) -> ProbeResult<()>;
}

/// Result of one scenario
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario name
    pub name: String,
    /// Outcome
    pub outcome: ScenarioOutcome,
    /// Wall time including session setup and teardown
    pub duration: Duration,
}

/// Results of a suite run
#[derive(Debug, Clone, Default)]
pub struct SuiteReport {
    /// Individual results in run order
    pub results: Vec<ScenarioResult>,
    /// Total duration
    pub duration: Duration,
}

impl SuiteReport {
    /// No scenario failed
    #[must_use]
    pub fn all_passed(&self) -> bool {
        !self.results.iter().any(|r| r.outcome.is_failed())
    }

    /// Count passed scenarios
    #[must_use]
    pub fn passed_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_passed()).count()
    }

    /// Count failed scenarios
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_failed()).count()
    }

    /// Count skipped scenarios
    #[must_use]
    pub fn skipped_count(&self) -> usize {
        self.results.iter().filter(|r| r.outcome.is_skipped()).count()
    }

    /// Get total scenario count
    #[must_use]
    pub fn total(&self) -> usize {
        self.results.len()
    }

    /// Get failed scenarios
    #[must_use]
    pub fn failures(&self) -> Vec<&ScenarioResult> {
        self.results
            .iter()
            .filter(|r| r.outcome.is_failed())
            .collect()
    }

    /// Look up a result by name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ScenarioResult> {
        self.results.iter().find(|r| r.name == name)
    }
}

/// Runs scenarios in isolated sessions
pub struct ScenarioRunner {
    factory: Arc<dyn SessionFactory>,
    config: Arc<HarnessConfig>,
    filter: Option<String>,
}

impl fmt::Debug for ScenarioRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScenarioRunner")
            .field("factory", &self.factory.label())
            .field("filter", &self.filter)
            .finish_non_exhaustive()
    }
}

impl ScenarioRunner {
    /// Create a runner
    #[must_use]
    pub fn new(factory: Arc<dyn SessionFactory>, config: HarnessConfig) -> Self {
        Self {
            factory,
            config: Arc::new(config),
            filter: None,
        }
    }

    /// Only run scenarios whose name contains `pattern` (case-insensitive)
    #[must_use]
    pub fn with_filter(mut self, pattern: impl Into<String>) -> Self {
        self.filter = Some(pattern.into().to_lowercase());
        self
    }

    /// Whether the filter selects a scenario
    #[must_use]
    pub fn selects(&self, name: &str) -> bool {
        self.filter
            .as_deref()
            .map_or(true, |f| name.to_lowercase().contains(f))
    }

    /// Run every selected scenario, one after another
    pub async fn run_all(&self, scenarios: &[Box<dyn Scenario>]) -> SuiteReport {
        let start = Instant::now();
        let mut results = Vec::new();
        for scenario in scenarios.iter().filter(|s| self.selects(s.name())) {
            results.push(self.run_one(scenario.as_ref()).await);
        }
        SuiteReport {
            results,
            duration: start.elapsed(),
        }
    }

    /// Run one scenario in its own session
    pub async fn run_one(&self, scenario: &dyn Scenario) -> ScenarioResult {
        let start = Instant::now();
        let name = scenario.name();

        let outcome = if let Some(reason) = scenario.disabled() {
            ScenarioOutcome::Skipped(reason.to_string())
        } else {
            info!(scenario = name, sessions = self.factory.label(), "scenario started");
            self.execute(scenario).await
        };

        match &outcome {
            ScenarioOutcome::Failed(reason) => warn!(scenario = name, %reason, "scenario failed"),
            other => info!(scenario = name, outcome = %other, "scenario finished"),
        }
        ScenarioResult {
            name: name.to_string(),
            outcome,
            duration: start.elapsed(),
        }
    }

    async fn execute(&self, scenario: &dyn Scenario) -> ScenarioOutcome {
        let driver = match self.factory.open(Arc::clone(&self.config)).await {
            Ok(driver) => driver,
            Err(err) => return ScenarioOutcome::Failed(err.to_string()),
        };
        let session = Session::new(driver, Arc::clone(&self.config));

        let bound = self.config.timeouts.scenario();
        let result = match tokio::time::timeout(bound, scenario.run(&session)).await {
            Ok(result) => result,
            Err(_) => Err(ProbeError::Timeout {
                what: format!("scenario {:?}", scenario.name()),
                ms: u64::try_from(bound.as_millis()).unwrap_or(u64::MAX),
            }),
        };

        if let Err(err) = session.close().await {
            warn!(scenario = scenario.name(), %err, "closing session failed");
        }
        ScenarioOutcome::from_result(&result)
    }
}
