//! Line source: turns a file, reader, or string into numbered, trimmed lines.
//!
//! A byte-order mark is stripped from the very first line only. Blank and comment
//! lines are kept here (so numbering matches the file) and skipped by the parser.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::error::{DefError, Result};

const BOM: char = '\u{FEFF}';

/// One trimmed input line with its 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    pub number: usize,
    pub text: String,
}

impl SourceLine {
    /// Empty lines and `#` comments carry no definition.
    pub fn is_ignorable(&self) -> bool {
        self.text.is_empty() || self.text.starts_with('#')
    }
}

fn normalize(number: usize, raw: &str) -> SourceLine {
    let raw = if number == 1 {
        raw.strip_prefix(BOM).unwrap_or(raw)
    } else {
        raw
    };
    SourceLine {
        number,
        text: raw.trim().to_string(),
    }
}

pub fn lines_from_str(source: &str) -> Vec<SourceLine> {
    source
        .lines()
        .enumerate()
        .map(|(i, raw)| normalize(i + 1, raw))
        .collect()
}

pub fn read_lines<R: BufRead>(reader: R) -> Result<Vec<SourceLine>> {
    let mut out = Vec::new();
    for (i, raw) in reader.lines().enumerate() {
        out.push(normalize(i + 1, &raw?));
    }
    Ok(out)
}

pub fn read_file_lines(path: &Path) -> Result<Vec<SourceLine>> {
    let file = File::open(path).map_err(|source| DefError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_lines(BufReader::new(file)).map_err(|e| match e {
        DefError::Read(source) => DefError::Io {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })
}
