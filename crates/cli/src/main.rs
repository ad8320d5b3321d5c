// redline CLI entry point.

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod commands;
mod config;
mod exit_code;
mod output;

#[derive(Parser)]
#[command(name = "redline", about = "Tracked-change editing for structured manuscripts")]
struct Cli {
    #[command(subcommand)]
    command: commands::Command,
}

fn main() -> std::process::ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match commands::run(cli.command) {
        Ok(()) => exit_code::ExitCode::Success.into(),
        Err(error) => {
            output::print_error(
                output::OutputFormat::detect(false),
                "COMMAND_FAILED",
                &format!("{error:#}"),
            );
            exit_code::ExitCode::from_error(&error).into()
        }
    }
}
