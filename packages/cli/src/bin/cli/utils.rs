// ABOUTME: Argument parsers shared by autograder subcommands
// ABOUTME: Resolves directory arguments to absolute paths at parse time

use std::path::PathBuf;

/// Accept only an existing directory, returned as an absolute path
pub fn fully_qualified_dir(value: &str) -> Result<PathBuf, String> {
    let path = PathBuf::from(value);
    let absolute = path
        .canonicalize()
        .map_err(|e| format!("{} is not a valid directory: {}", value, e))?;

    if !absolute.is_dir() {
        return Err(format!("{} is not a directory", value));
    }

    Ok(absolute)
}
