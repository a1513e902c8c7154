//! Docstring coverage analysis for Python sources.
//!
//! [`analyze`] scans one tab-normalized file into a span tree, extracts what
//! every class, function and method declares, and checks each leading
//! docstring against a [`GrammarSet`]. The result can be flattened into
//! report [`Record`]s.

pub mod error;
pub mod extract;
pub mod grammar;
pub mod report;
mod rules;
pub mod scanner;
pub mod span;
pub mod verify;

pub use error::{ConfigError, ScanError};
pub use extract::DefinitionInfo;
pub use grammar::{Grammar, GrammarConfig, GrammarSet, Template};
pub use report::{Column, Record, Value, STANDARD_COLUMNS};
pub use scanner::ScanOptions;
pub use span::{Span, SpanKind};
pub use verify::{Coverage, DocFindings, Outline};

use serde::Serialize;
use std::fmt;

/// A non-fatal finding attached to an analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Warning {
    /// A delimited span ran to end of text.
    UnterminatedSpan {
        kind: SpanKind,
        start: usize,
        line: usize,
    },
}

impl Warning {
    pub fn offset(&self) -> usize {
        match self {
            Warning::UnterminatedSpan { start, .. } => *start,
        }
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnterminatedSpan { kind, line, .. } => {
                write!(f, "unterminated {kind} at line {line}")
            }
        }
    }
}

/// Everything known about one analysed file.
#[derive(Debug, Clone)]
pub struct Analysis<'a> {
    pub path: String,
    pub tree: Span<'a>,
    pub outline: Outline,
    pub warnings: Vec<Warning>,
}

impl Analysis<'_> {
    /// Report records in preorder. With `collapse`, the descendants of
    /// complete spans are left out.
    pub fn records(&self, collapse: bool) -> Vec<Record> {
        report::assemble(
            &self.path,
            self.tree.text,
            &self.outline,
            &self.warnings,
            collapse,
        )
    }

    /// Aggregate flags of the whole file.
    pub fn coverage(&self) -> Coverage {
        self.outline.coverage
    }
}

/// Scan, extract and verify one file. `path` is a label only.
pub fn analyze<'a>(
    path: &str,
    source: &'a str,
    grammars: &GrammarSet,
    options: &ScanOptions,
) -> Result<Analysis<'a>, ScanError> {
    let tree = scanner::scan(source, options)?;
    let lines = report::LineIndex::new(source);
    let warnings = std::iter::once(&tree)
        .chain(tree.descendants())
        .filter(|s| s.unterminated)
        .map(|s| Warning::UnterminatedSpan {
            kind: s.kind,
            start: s.start,
            line: lines.line(s.start),
        })
        .collect();
    let outline = Outline::build(&tree, file_name(path).to_string(), grammars);
    Ok(Analysis {
        path: path.to_string(),
        tree,
        outline,
        warnings,
    })
}

/// Last component of a `/` or `\` separated path.
pub(crate) fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
