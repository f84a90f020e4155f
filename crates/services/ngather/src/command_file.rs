//! Command files and the transfer manifest.
//!
//! Both are plain text, one entry per line. Lines whose first character is
//! the comment marker are dropped, as are blank lines. Trailing whitespace is
//! stripped from the entries that are kept.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::debug;

use crate::prelude::*;

/// Command file name to its commands, in file order.
pub type CommandSet = BTreeMap<String, Vec<String>>;

/// Extract the entries of a command list.
pub fn parse_lines(contents: &str, comment_marker: char) -> Vec<String> {
    contents
        .lines()
        .filter(|line| !line.starts_with(comment_marker))
        .map(str::trim_end)
        .filter(|line| !line.trim_start().is_empty())
        .map(String::from)
        .collect()
}

/// Read a single command list, e.g. the transfer manifest.
pub fn read_file(path: &Path, comment_marker: char) -> Result<Vec<String>> {
    let contents = std::fs::read_to_string(path).map_err(|source| Error::ReadInput {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_lines(&contents, comment_marker))
}

/// Read every command file in `dir`, keyed by file name.
///
/// Sub-directories are ignored. Any unreadable file fails the whole load.
pub fn read_dir(dir: &Path, comment_marker: char) -> Result<CommandSet> {
    let read_error = |source: std::io::Error| Error::ReadInput {
        path: dir.to_path_buf(),
        source,
    };

    let mut commands = CommandSet::new();
    for entry in std::fs::read_dir(dir).map_err(read_error)? {
        let entry = entry.map_err(read_error)?;
        if !entry.file_type().map_err(read_error)?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let lines = read_file(&entry.path(), comment_marker)?;
        debug!("Loaded {} commands from {}", lines.len(), name);
        commands.insert(name, lines);
    }
    Ok(commands)
}
