use std::io;
use std::path::PathBuf;

/// Errors that can occur while capturing or storing compilation records
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no `-c <file>` flag in compiler arguments: {0:?}")]
    MissingSourceFlag(Vec<String>),

    #[error("`-c` is the last compiler argument, no file follows it: {0:?}")]
    DanglingSourceFlag(Vec<String>),

    #[error("argument {0:?} cannot be shell-quoted")]
    UnquotableArgument(String),

    #[error("quoted command does not re-tokenize to the original arguments: {0}")]
    RoundTripMismatch(String),

    #[error("compilation database already exists at {}", .0.display())]
    DatabaseExists(PathBuf),

    #[error("required environment variable {0} is not set")]
    MissingEnvVar(&'static str),

    #[error("empty compiler argument vector")]
    EmptyArgv,

    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Result type alias for compdb operations
pub type Result<T> = std::result::Result<T, Error>;
