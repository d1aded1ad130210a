//! C compiler interposer. The build tool invokes this in place of `cc`; it
//! records the compilation, runs the real compiler, and exits with the real
//! compiler's exit code.

use anyhow::{Context, Result};
use std::process::ExitStatus;

use compdb_core::interpose::{self, CompilerFlavor, InterposeConfig};

fn run() -> Result<ExitStatus> {
    let config = InterposeConfig::from_env(CompilerFlavor::C)?;
    let argv: Vec<String> = std::env::args().collect();
    let directory = std::env::current_dir().context("Failed to resolve working directory")?;
    Ok(interpose::interpose(&config, &argv, &directory)?)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    match run() {
        Ok(status) => std::process::exit(interpose::exit_code(status)),
        Err(err) => {
            eprintln!("compdb-cc: {err:#}");
            std::process::exit(1);
        }
    }
}
