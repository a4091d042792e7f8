use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::error::FileError;

/// True unless the path definitively does not exist
pub fn file_exists(path: impl AsRef<Path>) -> bool {
    match fs::metadata(path) {
        Ok(_) => true,
        Err(e) => e.kind() != std::io::ErrorKind::NotFound,
    }
}

/// Create a directory and all missing parents
pub fn ensure_dir(dir: impl AsRef<Path>) -> Result<(), FileError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|e| FileError::io(dir, e))
}

pub fn read_json<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T, FileError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| FileError::io(path, e))?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| FileError::json(path, e))
}

/// Pretty-print `value` to `path`, replacing any previous content
pub fn write_json<T: Serialize>(path: impl AsRef<Path>, value: &T) -> Result<(), FileError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }

    let mut data = serde_json::to_vec_pretty(value).map_err(|e| FileError::json(path, e))?;
    data.push(b'\n');
    fs::write(path, data).map_err(|e| FileError::io(path, e))
}

/// Comma-separated glob patterns matched against a file's base name
///
/// Supports `*`, `?`, bracket classes (`[a-z]`, `[!0-9]`, `[^0-9]`) and `\` escapes.
#[derive(Debug, Clone)]
pub struct FilePatterns {
    raw: String,
    compiled: Vec<Regex>,
}

impl FilePatterns {
    pub fn parse(raw: &str) -> Result<Self, FileError> {
        let compiled = raw
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .map(glob_to_regex)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            raw: raw.to_string(),
            compiled,
        })
    }

    pub fn matches(&self, file_name: &str) -> bool {
        self.compiled.iter().any(|re| re.is_match(file_name))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

fn glob_to_regex(pattern: &str) -> Result<Regex, FileError> {
    let bad = || FileError::Pattern(pattern.to_string());
    let mut re = String::from("^");
    let mut chars = pattern.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => re.push_str("[^/]*"),
            '?' => re.push_str("[^/]"),
            '\\' => {
                let escaped = chars.next().ok_or_else(bad)?;
                re.push_str(&regex::escape(&escaped.to_string()));
            }
            '[' => {
                re.push('[');
                if matches!(chars.peek(), Some('!') | Some('^')) {
                    chars.next();
                    re.push('^');
                }

                let mut closed = false;
                let mut empty = true;
                while let Some(cc) = chars.next() {
                    match cc {
                        ']' => {
                            closed = true;
                            break;
                        }
                        '\\' => {
                            let escaped = chars.next().ok_or_else(bad)?;
                            re.push_str(&regex::escape(&escaped.to_string()));
                        }
                        // Range operator, kept as-is
                        '-' if !empty => re.push('-'),
                        other => re.push_str(&regex::escape(&other.to_string())),
                    }
                    empty = false;
                }
                if !closed || empty {
                    return Err(bad());
                }
                re.push(']');
            }
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');

    Regex::new(&re).map_err(|_| bad())
}

/// Recursively list files under `dir` whose base name matches any of `patterns`
///
/// Entries are visited in file-name order so results are deterministic.
pub fn find_files(dir: impl AsRef<Path>, patterns: &FilePatterns) -> Result<Vec<PathBuf>, FileError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir.as_ref()).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_dir() {
            continue;
        }
        if patterns.matches(&entry.file_name().to_string_lossy()) {
            files.push(entry.into_path());
        }
    }

    Ok(files)
}
