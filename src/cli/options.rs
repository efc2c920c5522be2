use clap::Parser;
use std::path::PathBuf;

/// Command line interface of the jar pool dependency auditor
#[derive(Parser, Debug)]
#[command(name = "jars-deps")]
#[command(about = "Prints the dependencies of the jars in a directory on each other")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct JarsDepsCli {
    /// Directory containing the jar files of the pool
    pub directory: PathBuf,
}
