use anyhow::{Context, Result};
use clap::Parser;
use std::env;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};

use compdb_core::interpose::{self, COMPILER_PATH_VAR, DATABASE_PATH_VAR};
use compdb_core::store;

/// Record a compilation database while an opaque build tool runs.
///
/// Initializes an empty compile_commands.json in the current directory,
/// points the build tool's CC/CXX at compiler interposers, runs the build
/// tool, and exits with the build tool's own exit code.
#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    RUST_LOG=debug    Enable debug logging")]
struct Launch {
    /// Path to the real C compiler (default: xcrun -toolchain XcodeDefault -find clang)
    #[arg(long = "compiler")]
    compiler: Option<PathBuf>,

    /// Build tool to run (e.g. xcodebuild)
    tool: String,

    /// Arguments forwarded to the build tool unchanged
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn main() -> Result<()> {
    // Initialize tracing based on RUST_LOG env var
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let launch = Launch::parse();

    let working_dir = env::current_dir().context("Failed to resolve working directory")?;
    let database_path = store::init_database(&working_dir)
        .context("Failed to initialize the compilation database")?;
    info!("recording compilations to {}", database_path.display());

    let compiler = match launch.compiler {
        Some(path) => path,
        None => find_clang().context("Failed to locate clang via xcrun")?,
    };
    debug!("real compiler: {}", compiler.display());

    let interposer_dir = interposer_dir().context("Failed to locate interposer binaries")?;
    let env = build_environment(&compiler, &database_path, &interposer_dir);
    for (key, value) in &env {
        debug!("{key}={}", value.display());
    }

    let status = Command::new(&launch.tool)
        .args(&launch.args)
        .envs(env)
        .status()
        .with_context(|| format!("Failed to execute build tool: {}", launch.tool))?;

    std::process::exit(interpose::exit_code(status));
}

/// The six-variable channel handed to the build tool. CC/CXX divert its
/// compiles to the interposers; setting CC also makes some build tools link
/// with it, so LD/LDPLUSPLUS point back at the real compilers.
fn build_environment(
    compiler: &Path,
    database_path: &Path,
    interposer_dir: &Path,
) -> Vec<(&'static str, PathBuf)> {
    let compiler_cpp = PathBuf::from(format!("{}++", compiler.display()));
    vec![
        ("CC", interposer_dir.join("compdb-cc")),
        ("CXX", interposer_dir.join("compdb-cxx")),
        ("LD", compiler.to_path_buf()),
        ("LDPLUSPLUS", compiler_cpp),
        (COMPILER_PATH_VAR, compiler.to_path_buf()),
        (DATABASE_PATH_VAR, database_path.to_path_buf()),
    ]
}

/// The interposer binaries are installed alongside the launcher.
fn interposer_dir() -> Result<PathBuf> {
    let exe = env::current_exe().context("Failed to resolve own executable path")?;
    let dir = exe
        .parent()
        .context("Executable path has no parent directory")?;
    Ok(dir.to_path_buf())
}

/// Ask the Xcode toolchain where the real clang lives.
fn find_clang() -> Result<PathBuf> {
    let output = Command::new("xcrun")
        .args(["-toolchain", "XcodeDefault", "-find", "clang"])
        .output()
        .context("Failed to run xcrun")?;
    if !output.status.success() {
        anyhow::bail!("xcrun -find clang failed with {}", output.status);
    }
    let path = String::from_utf8(output.stdout).context("xcrun output is not UTF-8")?;
    Ok(PathBuf::from(path.trim_end_matches('\n')))
}
