//! Batch runner: read, normalize and analyse every input file.
//!
//! Files are independent, so they are analysed in parallel; results come back
//! in input order. A failing file is logged and reported, never fatal.

use crate::hash::{self, HashStore, Level};
use crate::normalize::normalize;
use anyhow::{Context, Result};
use lintworm_syntax::{analyze, Coverage, GrammarSet, Record, ScanOptions};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

#[derive(Debug, Clone)]
pub struct Settings {
    pub max_depth: usize,
    pub timeout: Option<Duration>,
    /// Leave out the descendants of documented spans.
    pub collapse: bool,
    pub level: Level,
}

#[derive(Debug)]
pub enum Status {
    Analysed {
        hash: String,
        coverage: Coverage,
        records: Vec<Record>,
    },
    /// Unchanged since the last run and documented to the requested level.
    Unchanged,
    Failed(String),
}

#[derive(Debug)]
pub struct FileResult {
    /// Path as written in reports and the hash store.
    pub label: String,
    pub status: Status,
}

pub fn run(
    files: &[PathBuf],
    grammars: &GrammarSet,
    store: Option<&HashStore>,
    settings: &Settings,
) -> Vec<FileResult> {
    files
        .par_iter()
        .map(|path| {
            let label = path.to_string_lossy().into_owned();
            let status = match analyse_file(path, &label, grammars, store, settings) {
                Ok(status) => status,
                Err(err) => {
                    warn!(path = %label, "{err:#}");
                    Status::Failed(format!("{err:#}"))
                }
            };
            FileResult { label, status }
        })
        .collect()
}

fn analyse_file(
    path: &Path,
    label: &str,
    grammars: &GrammarSet,
    store: Option<&HashStore>,
    settings: &Settings,
) -> Result<Status> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let hash = hash::digest(&bytes);
    if store.is_some_and(|s| s.is_current(label, &hash, settings.level)) {
        debug!(path = %label, "unchanged, skipping");
        return Ok(Status::Unchanged);
    }

    let text = String::from_utf8(bytes)
        .with_context(|| format!("{} is not valid UTF-8", path.display()))?;
    let source = normalize(&text);
    let options = ScanOptions {
        max_depth: settings.max_depth,
        deadline: settings.timeout.map(|t| Instant::now() + t),
    };
    let analysis = analyze(label, &source, grammars, &options)
        .with_context(|| format!("failed to analyse {}", path.display()))?;

    for warning in &analysis.warnings {
        warn!(path = %label, "{warning}");
    }
    let coverage = analysis.coverage();
    debug!(path = %label, documented = coverage.is_complete, "analysed");
    Ok(Status::Analysed {
        hash,
        coverage,
        records: analysis.records(settings.collapse),
    })
}

/// Counts over one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub analysed: usize,
    pub unchanged: usize,
    pub failed: usize,
    pub incomplete: usize,
}

impl Summary {
    pub fn of(results: &[FileResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            match &result.status {
                Status::Analysed { coverage, .. } => {
                    summary.analysed += 1;
                    if !coverage.is_complete {
                        summary.incomplete += 1;
                    }
                }
                Status::Unchanged => summary.unchanged += 1,
                Status::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }
}
