use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use trpc_swift::cli::{CommandLineInterface, Summary};

fn init_tracing(quiet: bool) {
    let fallback = if quiet { "error" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(command_line_interface: &CommandLineInterface) -> anyhow::Result<Summary> {
    let summary = command_line_interface
        .run()
        .context("failed to generate the Swift client")?;
    Ok(summary)
}

fn main() -> ExitCode {
    let command_line_interface = CommandLineInterface::load();
    init_tracing(command_line_interface.is_quiet());

    let started = Instant::now();
    match run(&command_line_interface) {
        Ok(summary) => {
            if !summary.quiet {
                let skipped = match summary.skipped {
                    0 => String::new(),
                    n => format!(" ({n} skipped, see warnings)").yellow().to_string(),
                };
                eprintln!(
                    "{} {} in {:.2?}{skipped}",
                    "Generated".green().bold(),
                    summary.out_file.display(),
                    started.elapsed()
                );
            }
            ExitCode::SUCCESS
        }
        Err(error) => {
            eprintln!("{} {error:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
