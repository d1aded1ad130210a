//! compdb-core - compilation-record capture and storage
//!
//! This crate provides the pieces an interposed compiler process needs to
//! reconstruct a compilation database as a side effect of a build:
//! - Derive a `compile_commands.json` record from a compiler argument vector
//! - Append records to the shared document safely across racing processes
//! - Stand in for the real compiler and propagate its exit status

pub mod error;
pub mod interpose;
pub mod record;
pub mod shell;
pub mod store;

// Re-export commonly used types
pub use error::{Error, Result};
pub use interpose::{CompilerFlavor, InterposeConfig};
pub use record::CompilationRecord;
pub use store::{CompilationDatabase, DB_FILENAME};
