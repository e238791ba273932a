//! talent-probe: run the recruitment kanban scenarios
//!
//! ```bash
//! talent-probe run                              # against http://localhost:3000
//! talent-probe run --filter drag --headed       # watch the drag scenario
//! talent-probe run --driver mock                # self-check, no browser
//! talent-probe list
//! ```

use clap::Parser;
use std::process::ExitCode;
use talent_probe_cli::{init_tracing, Cli, CliResult, Commands, Reporter, SuiteRunner};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let use_color = cli.color.should_color();
    console::set_colors_enabled(use_color);
    let runner = SuiteRunner::new(Reporter::new(use_color, cli.quiet));

    match cli.command {
        Commands::Run(args) => {
            let rt = tokio::runtime::Builder::new_multi_thread()
                .enable_all()
                .build()?;
            rt.block_on(runner.run(&args)).map(|_| ())
        }
        Commands::List => {
            runner.list();
            Ok(())
        }
    }
}
