//! Input discovery.
//!
//! Command-line inputs may be files, directories or glob patterns.
//! Directories are walked recursively for `.py` files; every visited path is
//! checked against the exclusion patterns, and each real directory is entered
//! once so symlink cycles terminate.

use anyhow::{Context, Result};
use glob::Pattern;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Glob exclusion patterns.
#[derive(Debug, Default)]
pub struct PathFilter {
    patterns: Vec<Pattern>,
}

impl PathFilter {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| Pattern::new(p).with_context(|| format!("invalid exclude pattern: {p}")))
            .collect::<Result<_>>()?;
        Ok(Self { patterns })
    }

    /// Add the patterns listed in a pattern file.
    pub fn extend_from_file(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read exclude file {}", path.display()))?;
        let extra = Self::new(&parse_pattern_file(&text))
            .with_context(|| format!("in exclude file {}", path.display()))?;
        self.patterns.extend(extra.patterns);
        Ok(())
    }

    /// The whole path or its file name matches a pattern.
    pub fn matches(&self, path: &Path) -> bool {
        let name = path.file_name().map(Path::new);
        self.patterns
            .iter()
            .any(|p| p.matches_path(path) || name.is_some_and(|n| p.matches_path(n)))
    }
}

/// One pattern per line; `#` starts a comment.
pub fn parse_pattern_file(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| line.split('#').next().unwrap_or("").trim())
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Expand inputs into the sorted list of files to analyse.
pub fn collect(inputs: &[String], filter: &PathFilter) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let mut visited = HashSet::new();
    for input in inputs {
        let path = Path::new(input);
        if path.is_file() {
            if filter.matches(path) {
                debug!(path = %path.display(), "excluded");
            } else {
                files.push(path.to_path_buf());
            }
            continue;
        }
        if path.is_dir() {
            walk(path, filter, &mut visited, &mut files)?;
            continue;
        }
        let matches: Vec<PathBuf> = glob::glob(input)
            .with_context(|| format!("invalid glob pattern: {input}"))?
            .filter_map(|r| r.ok())
            .collect();
        if matches.is_empty() {
            warn!("no files matched: {input}");
        }
        for path in matches {
            if filter.matches(&path) {
                debug!(path = %path.display(), "excluded");
            } else if path.is_dir() {
                walk(&path, filter, &mut visited, &mut files)?;
            } else if path.is_file() {
                files.push(path);
            }
        }
    }
    files.sort();
    files.dedup();
    Ok(files)
}

fn walk(
    dir: &Path,
    filter: &PathFilter,
    visited: &mut HashSet<PathBuf>,
    files: &mut Vec<PathBuf>,
) -> Result<()> {
    let real = fs::canonicalize(dir)
        .with_context(|| format!("failed to resolve {}", dir.display()))?;
    if !visited.insert(real) {
        debug!(path = %dir.display(), "already visited");
        return Ok(());
    }
    let mut entries: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory: {}", dir.display()))?
        .flatten()
        .map(|entry| entry.path())
        .collect();
    entries.sort();
    for path in entries {
        if filter.matches(&path) {
            debug!(path = %path.display(), "excluded");
        } else if path.is_dir() {
            walk(&path, filter, visited, files)?;
        } else if is_python(&path) {
            files.push(path);
        }
    }
    Ok(())
}

fn is_python(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "py")
}
