use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::helper::library::{LibraryRecord, LibraryTable};

#[derive(Error, Debug)]
pub enum CountLogError {
    #[error("Failed to read count log {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Count log {0} is empty")]
    EmptyLog(String),
    #[error("Count log {path} has an odd number of lines ({lines}), expected library/count pairs")]
    OddLineCount { path: String, lines: usize },
    #[error("Invalid read count '{value}' at line {line} of {path}")]
    InvalidCount {
        path: String,
        line: usize,
        value: String,
    },
    #[error("Missing library name at line {line} of {path}")]
    MissingLibraryName { path: String, line: usize },
    #[error("Experimental log lists {experimental} libraries but spike-in log lists {spike_in}")]
    EntryCountMismatch {
        experimental: usize,
        spike_in: usize,
    },
    #[error("Library name mismatch at entry {index}: '{experimental}' vs '{spike_in}'")]
    NameMismatch {
        index: usize,
        experimental: String,
        spike_in: String,
    },
    #[error("Expected {expected} libraries, found {found}")]
    UnexpectedLibraryCount { expected: usize, found: usize },
}

/// One library/count pair from a `samtools view -c` loop log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountEntry {
    pub library: String,
    pub count: u64,
}

#[derive(Debug, Clone)]
pub struct CountLog {
    pub path: String,
    pub line_count: usize,
    pub entries: Vec<CountEntry>,
}

pub fn read_count_log(path: &Path) -> Result<CountLog, CountLogError> {
    let path_str = path.display().to_string();
    let content = fs::read_to_string(path).map_err(|source| CountLogError::Io {
        path: path_str.clone(),
        source,
    })?;
    parse_count_log(&content, &path_str)
}

/// Parses alternating lines of library name and read count.
/// Blank lines at the end of the file are ignored.
pub fn parse_count_log(content: &str, path: &str) -> Result<CountLog, CountLogError> {
    let mut lines: Vec<&str> = content
        .lines()
        .map(|l| l.trim_end_matches(['\r', '\n']))
        .collect();

    while lines.last().is_some_and(|l| l.trim().is_empty()) {
        lines.pop();
    }

    if lines.is_empty() {
        return Err(CountLogError::EmptyLog(path.to_string()));
    }

    if lines.len() % 2 != 0 {
        return Err(CountLogError::OddLineCount {
            path: path.to_string(),
            lines: lines.len(),
        });
    }

    let mut entries = Vec::with_capacity(lines.len() / 2);

    for (i, pair) in lines.chunks(2).enumerate() {
        let name_line = i * 2 + 1;
        let library = pair[0].trim();
        if library.is_empty() {
            return Err(CountLogError::MissingLibraryName {
                path: path.to_string(),
                line: name_line,
            });
        }

        let value = pair[1].trim();
        let count = value
            .parse::<u64>()
            .map_err(|_| CountLogError::InvalidCount {
                path: path.to_string(),
                line: name_line + 1,
                value: value.to_string(),
            })?;

        entries.push(CountEntry {
            library: library.to_string(),
            count,
        });
    }

    Ok(CountLog {
        path: path.to_string(),
        line_count: lines.len(),
        entries,
    })
}

/// Pairs the experimental and spike-in logs entry by entry. Library names are
/// taken from the experimental log; differing names are returned as warnings
/// unless `strict_names` is set.
pub fn pair_counts(
    experimental: &CountLog,
    spike_in: &CountLog,
    strict_names: bool,
) -> Result<(LibraryTable, Vec<String>), CountLogError> {
    if experimental.entries.len() != spike_in.entries.len() {
        return Err(CountLogError::EntryCountMismatch {
            experimental: experimental.entries.len(),
            spike_in: spike_in.entries.len(),
        });
    }

    let mut warnings = Vec::new();
    let mut table = LibraryTable::new();

    for (index, (exp, spike)) in experimental
        .entries
        .iter()
        .zip(&spike_in.entries)
        .enumerate()
    {
        if exp.library != spike.library {
            if strict_names {
                return Err(CountLogError::NameMismatch {
                    index,
                    experimental: exp.library.clone(),
                    spike_in: spike.library.clone(),
                });
            }
            warnings.push(format!(
                "Library name differs between logs at entry {}: '{}' vs '{}', using '{}'",
                index, exp.library, spike.library, exp.library
            ));
        }
        table.push(LibraryRecord::new(&exp.library, exp.count, spike.count));
    }

    Ok((table, warnings))
}

pub fn check_library_count(
    table: &LibraryTable,
    expected: Option<usize>,
) -> Result<(), CountLogError> {
    match expected {
        Some(expected) if expected != table.len() => Err(CountLogError::UnexpectedLibraryCount {
            expected,
            found: table.len(),
        }),
        _ => Ok(()),
    }
}
