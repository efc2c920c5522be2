use clap::error::ErrorKind;
use clap::Parser;
use jars_deps::cli::{run, JarsDepsCli};
use jars_deps::AnalysisConfig;
use std::process::ExitCode;
use tracing::info;

fn main() -> ExitCode {
    let cli = match JarsDepsCli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version requests are not usage errors.
            let code = match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
            let _ = e.print();
            return code;
        }
    };

    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_writer(std::io::stderr)
        .init();

    info!("Starting jars-deps v{}", env!("CARGO_PKG_VERSION"));

    let stdout = std::io::stdout();
    match run(&cli.directory, &AnalysisConfig::default(), &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::FAILURE
        }
    }
}
