//! Standing in for the real compiler.
//!
//! An interposer process receives the build tool's compiler invocation
//! verbatim, derives and stores a compilation record, then runs the real
//! compiler with the same arguments and hands its exit status back. From the
//! build tool's perspective nothing happened except the compile.

use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tracing::debug;

use crate::error::{Error, Result};
use crate::record::CompilationRecord;
use crate::store;

/// Environment variable naming the resolved real-compiler path.
pub const COMPILER_PATH_VAR: &str = "COMPILATION_DB_CLANG_PATH";

/// Environment variable naming the compilation database path.
pub const DATABASE_PATH_VAR: &str = "COMPILATION_DB_DATABASE_PATH";

/// Which compiler an interposer stands in for. The environment channel
/// carries one compiler path; the C++ compiler is its `++` sibling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompilerFlavor {
    C,
    Cpp,
}

impl CompilerFlavor {
    /// Resolve the configured compiler path for this flavor.
    pub fn resolve(&self, compiler_path: &str) -> PathBuf {
        match self {
            CompilerFlavor::C => PathBuf::from(compiler_path),
            CompilerFlavor::Cpp => PathBuf::from(format!("{compiler_path}++")),
        }
    }
}

/// What an interposer cannot derive from its own argument vector: where the
/// real compiler lives and where the database document lives.
///
/// Built explicitly rather than read ambiently, so the interposer logic is
/// testable without touching the process environment; the binaries construct
/// it once via [`InterposeConfig::from_env`].
#[derive(Debug, Clone)]
pub struct InterposeConfig {
    /// Resolved executable path of the real compiler for this flavor.
    pub compiler_path: PathBuf,
    /// Path of the shared compilation database document.
    pub database_path: PathBuf,
}

impl InterposeConfig {
    /// Read the environment channel the launcher set up.
    pub fn from_env(flavor: CompilerFlavor) -> Result<Self> {
        let compiler = std::env::var(COMPILER_PATH_VAR)
            .map_err(|_| Error::MissingEnvVar(COMPILER_PATH_VAR))?;
        let database = std::env::var(DATABASE_PATH_VAR)
            .map_err(|_| Error::MissingEnvVar(DATABASE_PATH_VAR))?;
        Ok(Self {
            compiler_path: flavor.resolve(&compiler),
            database_path: PathBuf::from(database),
        })
    }
}

/// Run one interposed compile: substitute the real compiler for argument 0,
/// record the invocation, then execute the real compiler.
///
/// The record is committed strictly before the compiler is spawned, so a
/// build interrupted mid-compilation still reflects the attempt. Any fatal
/// condition while recording aborts before the compiler runs. The returned
/// status is the real compiler's, untouched.
pub fn interpose(
    config: &InterposeConfig,
    argv: &[String],
    directory: &Path,
) -> Result<ExitStatus> {
    let mut argv = argv.to_vec();
    match argv.first_mut() {
        Some(first) => *first = config.compiler_path.to_string_lossy().into_owned(),
        None => return Err(Error::EmptyArgv),
    }

    match CompilationRecord::from_argv(&argv, directory)? {
        Some(record) => store::append_record(&config.database_path, &record)?,
        None => debug!("null-device compile, nothing to record"),
    }

    // Stdio is inherited; the build tool talks to the compiler directly.
    let status = Command::new(&argv[0])
        .args(&argv[1..])
        .current_dir(directory)
        .status()?;
    Ok(status)
}

/// Map an exit status to the code the build tool should see. A normal exit
/// passes through unchanged; a signal death becomes `128 + signal`, the
/// shell convention, since no exit code exists to propagate.
pub fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}
