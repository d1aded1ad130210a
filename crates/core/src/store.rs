//! The shared on-disk compilation database.
//!
//! The database is a single pretty-printed JSON array that many interposer
//! processes append to while the build tool runs them in parallel. Every
//! append takes an exclusive advisory lock on the document itself and holds
//! it across the whole read-parse-append-rewrite-fsync cycle, so readers and
//! racing writers only ever observe complete documents.

use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{Error, Result};
use crate::record::CompilationRecord;

/// File name of the database document, fixed by the format consumers expect.
pub const DB_FILENAME: &str = "compile_commands.json";

/// The persisted document: records in append order among racing writers.
pub type CompilationDatabase = Vec<CompilationRecord>;

/// Create an empty database in `directory` and return its path.
///
/// Anything already present at that path, a dangling symlink included, is a
/// fatal configuration error: silently merging with or overwriting data from
/// an earlier build would contaminate every downstream consumer.
pub fn init_database(directory: &Path) -> Result<PathBuf> {
    let path = directory.join(DB_FILENAME);
    if path.symlink_metadata().is_ok() {
        return Err(Error::DatabaseExists(path));
    }
    let empty: CompilationDatabase = Vec::new();
    std::fs::write(&path, serde_json::to_string_pretty(&empty)?)?;
    debug!("initialized compilation database at {}", path.display());
    Ok(path)
}

/// Append one record to the database at `path`.
///
/// Blocks until the exclusive lock on the document is available; the build
/// tool's own scheduling bounds how many processes can be waiting. The lock
/// is released when the handle drops, on error paths included.
pub fn append_record(path: &Path, record: &CompilationRecord) -> Result<()> {
    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    file.lock_exclusive()?;
    let outcome = append_locked(&mut file, record);
    // Closing the handle would release the advisory lock anyway; unlocking
    // here keeps the critical section explicit.
    let _ = fs2::FileExt::unlock(&file);
    if outcome.is_ok() {
        debug!(
            "appended record for {} to {}",
            record.file.display(),
            path.display()
        );
    }
    outcome
}

/// The critical section: read, parse, append, rewrite from the start, and
/// force the result to durable storage. No partial or streaming writes; a
/// reader must never observe invalid JSON.
fn append_locked(file: &mut File, record: &CompilationRecord) -> Result<()> {
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    let mut records: CompilationDatabase = serde_json::from_str(&contents)?;
    records.push(record.clone());
    file.seek(SeekFrom::Start(0))?;
    file.set_len(0)?;
    file.write_all(serde_json::to_string_pretty(&records)?.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

/// Read the full database back. For consumers and tests; the document is
/// read-only once the build has finished.
pub fn read_records(path: &Path) -> Result<CompilationDatabase> {
    let contents = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}
