//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// talent-probe: end-to-end checks for the recruitment pipeline kanban
#[derive(Parser, Debug)]
#[command(name = "talent-probe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (only failures and the summary)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the scenario suite
    Run(RunArgs),

    /// List the scenarios without running them
    List,
}

/// Arguments for the run command
#[derive(Parser, Debug, Default)]
pub struct RunArgs {
    /// Only run scenarios whose name contains this text
    #[arg(short, long)]
    pub filter: Option<String>,

    /// YAML configuration file
    #[arg(short, long, env = "TALENT_PROBE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Application base URL
    #[arg(long, env = "TALENT_PROBE_BASE_URL")]
    pub base_url: Option<String>,

    /// Position exercised by the kanban scenarios
    #[arg(long, env = "TALENT_PROBE_POSITION_ID")]
    pub position_id: Option<u64>,

    /// Show the browser window
    #[arg(long)]
    pub headed: bool,

    /// Chromium executable
    #[arg(long, env = "TALENT_PROBE_CHROMIUM")]
    pub chromium_path: Option<String>,

    /// Disable the Chromium sandbox (containers)
    #[arg(long)]
    pub no_sandbox: bool,

    /// Browser sessions to run against
    #[arg(long, default_value = "chromium", env = "TALENT_PROBE_DRIVER")]
    pub driver: DriverArg,
}

/// Session backend
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DriverArg {
    /// A fresh Chromium per scenario
    #[default]
    Chromium,
    /// The in-memory seeded board; self-check without a browser
    Mock,
}

/// Color output argument
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl ColorArg {
    /// Whether output should be colored
    #[must_use]
    pub fn should_color(self) -> bool {
        match self {
            Self::Always => true,
            Self::Never => false,
            Self::Auto => console::colors_enabled(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_run_flags() {
        let cli = Cli::try_parse_from([
            "talent-probe",
            "-v",
            "run",
            "--filter",
            "drag",
            "--base-url",
            "http://localhost:4000",
            "--headed",
            "--no-sandbox",
            "--driver",
            "mock",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 1);
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.filter.as_deref(), Some("drag"));
        assert_eq!(args.base_url.as_deref(), Some("http://localhost:4000"));
        assert!(args.headed);
        assert!(args.no_sandbox);
        assert_eq!(args.driver, DriverArg::Mock);
    }

    #[test]
    fn test_list_takes_no_args() {
        let cli = Cli::try_parse_from(["talent-probe", "list"]).unwrap();
        assert!(matches!(cli.command, Commands::List));
        assert!(Cli::try_parse_from(["talent-probe", "list", "--headed"]).is_err());
    }

    #[test]
    fn test_color_choice() {
        assert!(ColorArg::Always.should_color());
        assert!(!ColorArg::Never.should_color());
    }
}
