use std::process::ExitCode;

use clap::Parser;
use dcc_tabular::{CliArgs, LoggingConfig, RunConfig, init_logging};

fn main() -> ExitCode {
    let logging = LoggingConfig::from_env();
    if let Err(error) = init_logging(&logging) {
        eprintln!("warning: {error}");
    }

    let cli = CliArgs::parse();
    let config = match RunConfig::from_args(cli) {
        Ok(config) => config,
        Err(error) => {
            eprintln!("error: {error:#}");
            return ExitCode::from(2);
        }
    };

    match dcc_tabular::run(&config) {
        Ok(summary) => {
            if config.json {
                println!("{}", summary.to_json());
            } else {
                print!("{}", summary.render_text());
            }
            if summary.has_defects() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            }
        }
        Err(error) => {
            eprintln!("error: {error}");
            ExitCode::from(2)
        }
    }
}
