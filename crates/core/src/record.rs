//! Deriving a compilation record from a compiler invocation.

use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};
use crate::shell;

/// Flag whose following token names the single file being compiled. Build
/// tools that drive one compile per source file pass it on every invocation.
const SOURCE_FLAG: &str = "-c";

/// Compile target used for syntax-only probe invocations; such compiles
/// produce no artifact and are not recorded.
const NULL_DEVICE: &str = "/dev/null";

/// One entry of the compilation database: how a single file was compiled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationRecord {
    /// Absolute working directory the compiler ran in.
    pub directory: PathBuf,
    /// The full invocation, shell-escaped so that POSIX tokenization of it
    /// reproduces the original argument vector exactly.
    pub command: String,
    /// The compiled file, relative to `directory` when it lies under it,
    /// absolute otherwise.
    pub file: PathBuf,
}

impl CompilationRecord {
    /// Derive a record from a compiler argument vector and the working
    /// directory it ran in.
    ///
    /// Returns `Ok(None)` for null-device compiles, which are syntax-only
    /// probes. A vector without a usable `-c <file>` pair is a contract
    /// violation by the build tool and fails rather than producing a record
    /// with an unknown file.
    pub fn from_argv(argv: &[String], directory: &Path) -> Result<Option<Self>> {
        let file = find_source_file(argv)?;
        let file = normalize(Path::new(&file));
        if file == Path::new(NULL_DEVICE) {
            return Ok(None);
        }
        let file = relativize(file, directory);
        let command = shell::join_quoted(argv)?;
        Ok(Some(Self {
            directory: directory.to_path_buf(),
            command,
            file,
        }))
    }
}

/// Locate the operand of the first `-c` flag.
fn find_source_file(argv: &[String]) -> Result<String> {
    for (i, arg) in argv.iter().enumerate() {
        if arg == SOURCE_FLAG {
            return match argv.get(i + 1) {
                Some(file) => Ok(file.clone()),
                None => Err(Error::DanglingSourceFlag(argv.to_vec())),
            };
        }
    }
    Err(Error::MissingSourceFlag(argv.to_vec()))
}

/// Lexically collapse `.`, empty, and `..` segments, without touching the
/// filesystem. `..` at the start of a relative path is kept; `/..` is the
/// root itself.
fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match parts.last() {
                Some(Component::Normal(_)) => {
                    parts.pop();
                }
                Some(Component::RootDir) => {}
                _ => parts.push(component),
            },
            _ => parts.push(component),
        }
    }
    if parts.is_empty() {
        return PathBuf::from(".");
    }
    parts.iter().map(|c| c.as_os_str()).collect()
}

/// Rewrite an absolute path relative to `directory` when it lies under it.
/// Containment is component-wise; a path under a sibling directory whose
/// name happens to share a byte prefix stays absolute.
fn relativize(path: PathBuf, directory: &Path) -> PathBuf {
    if path.is_absolute() {
        if let Ok(relative) = path.strip_prefix(directory) {
            return relative.to_path_buf();
        }
    }
    path
}
