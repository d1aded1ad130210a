//! Shell escaping for recorded compiler commands.
//!
//! The `command` field of a record must tokenize back to the original
//! argument vector under POSIX `sh` quoting rules. That property is what
//! lets downstream tools re-split the command safely, so it is verified on
//! every call rather than trusted.

use std::borrow::Cow;

use crate::error::{Error, Result};

/// Shell-escape every argument and join them with single spaces.
///
/// Fails if an argument cannot be represented (embedded NUL) or if the
/// joined string does not re-tokenize to `argv` element-for-element. A
/// command a consumer cannot re-split is worse than no command at all, so
/// neither failure is recoverable.
pub fn join_quoted(argv: &[String]) -> Result<String> {
    let mut quoted: Vec<Cow<'_, str>> = Vec::with_capacity(argv.len());
    for arg in argv {
        let escaped =
            shlex::try_quote(arg).map_err(|_| Error::UnquotableArgument(arg.clone()))?;
        quoted.push(escaped);
    }
    let command = quoted.join(" ");
    verify_round_trip(argv, &command)?;
    Ok(command)
}

/// Check that POSIX tokenization of `command` reproduces `argv` exactly.
fn verify_round_trip(argv: &[String], command: &str) -> Result<()> {
    let reparsed = shlex::split(command).unwrap_or_default();
    if reparsed.as_slice() != argv {
        return Err(Error::RoundTripMismatch(command.to_string()));
    }
    Ok(())
}
