//! Suite execution

use crate::commands::{DriverArg, RunArgs};
use crate::error::{CliError, CliResult};
use crate::output::Reporter;
use std::sync::Arc;
use talent_probe::mock::{MockApp, MockSessions};
use talent_probe::{
    catalog, ChromiumSessions, HarnessConfig, ScenarioRunner, SessionFactory, SuiteReport,
};
use tracing::info;

/// Harness configuration: file (or defaults), then flag and environment overrides
pub fn build_config(args: &RunArgs) -> CliResult<HarnessConfig> {
    let mut config = match &args.config {
        Some(path) => HarnessConfig::from_yaml_file(path)?,
        None => HarnessConfig::default(),
    };
    if let Some(url) = &args.base_url {
        config = config.with_base_url(url.clone());
    }
    if let Some(id) = args.position_id {
        config = config.with_position_id(id);
    }
    if args.headed {
        config = config.with_headless(false);
    }
    if let Some(path) = &args.chromium_path {
        config = config.with_chromium_path(path.clone());
    }
    if args.no_sandbox {
        config = config.with_no_sandbox();
    }
    config.validate()?;
    Ok(config)
}

fn sessions(driver: DriverArg) -> Arc<dyn SessionFactory> {
    match driver {
        DriverArg::Chromium => Arc::new(ChromiumSessions::new()),
        DriverArg::Mock => Arc::new(MockSessions::new(MockApp::seeded())),
    }
}

/// Runs the catalog and prints the outcome
#[derive(Debug)]
pub struct SuiteRunner {
    reporter: Reporter,
}

impl SuiteRunner {
    /// Create a runner printing through `reporter`
    #[must_use]
    pub const fn new(reporter: Reporter) -> Self {
        Self { reporter }
    }

    /// Run the selected scenarios; an error when any of them failed
    pub async fn run(&self, args: &RunArgs) -> CliResult<SuiteReport> {
        let mut config = build_config(args)?;
        if args.driver == DriverArg::Mock {
            config = HarnessConfig::fast().with_position_id(config.seed.position_id);
        }
        info!(base_url = %config.base_url, driver = ?args.driver, "running scenarios");

        let mut runner = ScenarioRunner::new(sessions(args.driver), config);
        if let Some(filter) = &args.filter {
            runner = runner.with_filter(filter.clone());
        }
        let scenarios = catalog();
        if !scenarios.iter().any(|s| runner.selects(s.name())) {
            return Err(CliError::config(format!(
                "no scenario matches filter {:?}",
                args.filter.as_deref().unwrap_or_default()
            )));
        }

        let report = runner.run_all(&scenarios).await;
        self.reporter.report(&report);
        if report.all_passed() {
            Ok(report)
        } else {
            Err(CliError::ScenariosFailed {
                failed: report.failed_count(),
                total: report.total(),
            })
        }
    }

    /// Print the catalog
    pub fn list(&self) {
        self.reporter.list(&catalog());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url: http://staging.test\nseed:\n  position_id: 4").unwrap();
        let args = RunArgs {
            config: Some(file.path().to_path_buf()),
            position_id: Some(9),
            headed: true,
            ..RunArgs::default()
        };
        let config = build_config(&args).unwrap();
        assert_eq!(config.base_url, "http://staging.test");
        assert_eq!(config.seed.position_id, 9);
        assert!(!config.browser.headless);
    }

    #[test]
    fn test_missing_file_is_error() {
        let args = RunArgs {
            config: Some("/nonexistent/talent-probe.yaml".into()),
            ..RunArgs::default()
        };
        assert!(build_config(&args).is_err());
    }

    #[tokio::test]
    async fn test_mock_suite_passes() {
        let runner = SuiteRunner::new(Reporter::new(false, true));
        let args = RunArgs {
            driver: DriverArg::Mock,
            ..RunArgs::default()
        };
        let report = runner.run(&args).await.unwrap();
        assert_eq!(report.passed_count(), 7);
        assert_eq!(report.skipped_count(), 3);
    }

    #[tokio::test]
    async fn test_unmatched_filter_is_config_error() {
        let runner = SuiteRunner::new(Reporter::new(false, true));
        let args = RunArgs {
            driver: DriverArg::Mock,
            filter: Some("nothing like this".into()),
            ..RunArgs::default()
        };
        assert!(matches!(
            runner.run(&args).await,
            Err(CliError::Config { .. })
        ));
    }
}
