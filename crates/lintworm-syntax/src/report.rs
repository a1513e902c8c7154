//! Report records.
//!
//! One [`Record`] per file, class, function and method, in preorder. Columns
//! keep the names of the historical CSV report so existing reports can be
//! merged.

use crate::span::SpanKind;
use crate::verify::Outline;
use crate::Warning;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Flat view of one verified span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub path: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub start: usize,
    pub end: usize,
    pub start_line: usize,
    pub end_line: usize,
    pub inputs: Vec<String>,
    pub found_inputs: Vec<String>,
    pub missing_inputs: Vec<String>,
    pub returns: usize,
    pub found_returns: usize,
    pub yields: usize,
    pub found_yields: usize,
    pub raises: Vec<String>,
    pub found_raises: Vec<String>,
    pub missing_raises: Vec<String>,
    pub parameters: Vec<String>,
    pub found_parameters: Vec<String>,
    pub missing_parameters: Vec<String>,
    pub basic_comments: bool,
    pub multiline_comments: bool,
    pub formatted_multiline: bool,
    pub documented: bool,
    pub warnings: Vec<String>,
}

/// A single cell of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value<'r> {
    Text(&'r str),
    List(&'r [String]),
    Count(usize),
    Flag(bool),
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) => f.write_str(s),
            Value::List(items) => f.write_str(&items.join(":")),
            Value::Count(n) => write!(f, "{n}"),
            Value::Flag(true) => f.write_str("True"),
            Value::Flag(false) => f.write_str("False"),
        }
    }
}

/// A materializable report column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    Path,
    Name,
    Type,
    StartChar,
    EndChar,
    StartLine,
    EndLine,
    Inputs,
    FoundInputs,
    MissingInputs,
    Returns,
    FoundReturns,
    Yields,
    FoundYields,
    Raises,
    FoundRaises,
    MissingRaises,
    Parameters,
    FoundParameters,
    MissingParameters,
    BasicComments,
    MultilineComments,
    FormattedMultiline,
    Documented,
    Warnings,
}

/// Default column selection.
pub const STANDARD_COLUMNS: &[Column] = &[
    Column::Path,
    Column::Name,
    Column::Type,
    Column::MissingInputs,
    Column::Returns,
    Column::FoundReturns,
    Column::Yields,
    Column::FoundYields,
    Column::MissingRaises,
    Column::MissingParameters,
    Column::BasicComments,
    Column::MultilineComments,
    Column::FormattedMultiline,
    Column::Documented,
];

impl Column {
    pub const ALL: &'static [Column] = &[
        Column::Path,
        Column::Name,
        Column::Type,
        Column::StartChar,
        Column::EndChar,
        Column::StartLine,
        Column::EndLine,
        Column::Inputs,
        Column::FoundInputs,
        Column::MissingInputs,
        Column::Returns,
        Column::FoundReturns,
        Column::Yields,
        Column::FoundYields,
        Column::Raises,
        Column::FoundRaises,
        Column::MissingRaises,
        Column::Parameters,
        Column::FoundParameters,
        Column::MissingParameters,
        Column::BasicComments,
        Column::MultilineComments,
        Column::FormattedMultiline,
        Column::Documented,
        Column::Warnings,
    ];

    /// Header text in CSV reports.
    pub fn header(self) -> &'static str {
        match self {
            Column::Path => "path",
            Column::Name => "name",
            Column::Type => "type",
            Column::StartChar => "start char",
            Column::EndChar => "end char",
            Column::StartLine => "start line",
            Column::EndLine => "end line",
            Column::Inputs => "inputs",
            Column::FoundInputs => "found inputs",
            Column::MissingInputs => "missing inputs",
            Column::Returns => "returns",
            Column::FoundReturns => "found returns",
            Column::Yields => "yields",
            Column::FoundYields => "found yields",
            Column::Raises => "raises",
            Column::FoundRaises => "found raises",
            Column::MissingRaises => "missing raises",
            Column::Parameters => "parameters",
            Column::FoundParameters => "found parameters",
            Column::MissingParameters => "missing parameters",
            Column::BasicComments => "basic comments",
            Column::MultilineComments => "multiline comments",
            Column::FormattedMultiline => "formatted multiline",
            Column::Documented => "documented",
            Column::Warnings => "warnings",
        }
    }
}

impl FromStr for Column {
    type Err = String;

    /// Accepts the header text or its kebab/snake spelling.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().replace(['-', '_'], " ");
        Column::ALL
            .iter()
            .copied()
            .find(|c| c.header().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| format!("unknown column `{s}`"))
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.header())
    }
}

impl Record {
    /// The file row of a file that could not be analysed. Every flag is false
    /// and `reason` is its only warning.
    pub fn unanalysed(path: &str, reason: String) -> Self {
        Self {
            path: path.to_string(),
            name: crate::file_name(path).to_string(),
            kind: SpanKind::File.tag(),
            start: 0,
            end: 0,
            start_line: 0,
            end_line: 0,
            inputs: Vec::new(),
            found_inputs: Vec::new(),
            missing_inputs: Vec::new(),
            returns: 0,
            found_returns: 0,
            yields: 0,
            found_yields: 0,
            raises: Vec::new(),
            found_raises: Vec::new(),
            missing_raises: Vec::new(),
            parameters: Vec::new(),
            found_parameters: Vec::new(),
            missing_parameters: Vec::new(),
            basic_comments: false,
            multiline_comments: false,
            formatted_multiline: false,
            documented: false,
            warnings: vec![reason],
        }
    }

    pub fn value(&self, column: Column) -> Value<'_> {
        match column {
            Column::Path => Value::Text(&self.path),
            Column::Name => Value::Text(&self.name),
            Column::Type => Value::Text(self.kind),
            Column::StartChar => Value::Count(self.start),
            Column::EndChar => Value::Count(self.end),
            Column::StartLine => Value::Count(self.start_line),
            Column::EndLine => Value::Count(self.end_line),
            Column::Inputs => Value::List(&self.inputs),
            Column::FoundInputs => Value::List(&self.found_inputs),
            Column::MissingInputs => Value::List(&self.missing_inputs),
            Column::Returns => Value::Count(self.returns),
            Column::FoundReturns => Value::Count(self.found_returns),
            Column::Yields => Value::Count(self.yields),
            Column::FoundYields => Value::Count(self.found_yields),
            Column::Raises => Value::List(&self.raises),
            Column::FoundRaises => Value::List(&self.found_raises),
            Column::MissingRaises => Value::List(&self.missing_raises),
            Column::Parameters => Value::List(&self.parameters),
            Column::FoundParameters => Value::List(&self.found_parameters),
            Column::MissingParameters => Value::List(&self.missing_parameters),
            Column::BasicComments => Value::Flag(self.basic_comments),
            Column::MultilineComments => Value::Flag(self.multiline_comments),
            Column::FormattedMultiline => Value::Flag(self.formatted_multiline),
            Column::Documented => Value::Flag(self.documented),
            Column::Warnings => Value::List(&self.warnings),
        }
    }
}

// -- Assembly ---------------------------------------------------------------

/// Byte offset to 1-based line lookup.
pub(crate) struct LineIndex {
    newlines: Vec<usize>,
}

impl LineIndex {
    pub(crate) fn new(source: &str) -> Self {
        Self {
            newlines: source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| i)
                .collect(),
        }
    }

    pub(crate) fn line(&self, offset: usize) -> usize {
        self.newlines.partition_point(|&nl| nl < offset) + 1
    }
}

pub(crate) fn assemble(
    path: &str,
    source: &str,
    outline: &Outline,
    warnings: &[Warning],
    collapse: bool,
) -> Vec<Record> {
    let lines = LineIndex::new(source);
    let mut out = Vec::new();
    visit(path, &lines, outline, warnings, collapse, &mut out);
    out
}

fn visit(
    path: &str,
    lines: &LineIndex,
    node: &Outline,
    warnings: &[Warning],
    collapse: bool,
    out: &mut Vec<Record>,
) {
    out.push(record(path, lines, node, warnings));
    if collapse && node.coverage.is_complete {
        return;
    }
    for child in &node.children {
        visit(path, lines, child, warnings, collapse, out);
    }
}

fn record(path: &str, lines: &LineIndex, node: &Outline, warnings: &[Warning]) -> Record {
    let info = &node.info;
    let found = &node.findings;
    let inputs = sorted(info.declared_inputs.iter());
    let found_inputs = sorted(found.found_inputs.iter());
    let raises = sorted(info.raised_names.iter());
    let found_raises = sorted(found.found_raised_names.iter());
    let parameters = sorted(info.declared_class_attributes.iter());
    // a class documents its attributes through the parameter fields
    let found_parameters = if node.kind == SpanKind::Class {
        found_inputs.clone()
    } else {
        Vec::new()
    };
    Record {
        path: path.to_string(),
        name: node.name.clone(),
        kind: node.kind.tag(),
        start: node.start,
        end: node.end,
        start_line: lines.line(node.start),
        end_line: lines.line(node.end.saturating_sub(1).max(node.start)),
        missing_inputs: missing(&inputs, &found_inputs),
        missing_raises: missing(&raises, &found_raises),
        missing_parameters: missing(&parameters, &found_parameters),
        inputs,
        found_inputs,
        returns: info.return_count,
        found_returns: found.found_return_count,
        yields: info.yield_count,
        found_yields: found.found_yield_count,
        raises,
        found_raises,
        parameters,
        found_parameters,
        basic_comments: node.coverage.has_basic_comment,
        multiline_comments: node.coverage.has_multiline_comment,
        formatted_multiline: node.coverage.docstring_matches_grammar,
        documented: node.coverage.is_complete,
        warnings: warnings
            .iter()
            .filter(|w| w.offset() >= node.start && w.offset() < node.end)
            .map(ToString::to_string)
            .collect(),
    }
}

fn sorted<'i>(items: impl Iterator<Item = &'i String>) -> Vec<String> {
    items.cloned().collect::<BTreeSet<_>>().into_iter().collect()
}

fn missing(declared: &[String], found: &[String]) -> Vec<String> {
    declared
        .iter()
        .filter(|d| !found.contains(d))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_names_parse() {
        assert_eq!("missing inputs".parse::<Column>(), Ok(Column::MissingInputs));
        assert_eq!("missing-inputs".parse::<Column>(), Ok(Column::MissingInputs));
        assert_eq!("Start_Line".parse::<Column>(), Ok(Column::StartLine));
        assert!("nope".parse::<Column>().is_err());
    }

    #[test]
    fn every_column_round_trips_its_header() {
        for column in Column::ALL {
            assert_eq!(column.header().parse::<Column>(), Ok(*column));
        }
    }

    #[test]
    fn unanalysed_file_row() {
        let record = Record::unanalysed("pkg/deep.py", "nesting too deep".to_string());
        assert_eq!(record.name, "deep.py");
        assert_eq!(record.kind, "file");
        assert!(!record.documented);
        assert_eq!(record.value(Column::Warnings).to_string(), "nesting too deep");
    }

    #[test]
    fn line_lookup() {
        let lines = LineIndex::new("a\nbc\n\nd");
        assert_eq!(lines.line(0), 1);
        assert_eq!(lines.line(1), 1);
        assert_eq!(lines.line(2), 2);
        assert_eq!(lines.line(5), 3);
        assert_eq!(lines.line(6), 4);
    }

    #[test]
    fn value_rendering() {
        let items = vec!["a".to_string(), "b".to_string()];
        assert_eq!(Value::List(&items).to_string(), "a:b");
        assert_eq!(Value::List(&[]).to_string(), "");
        assert_eq!(Value::Flag(true).to_string(), "True");
        assert_eq!(Value::Count(3).to_string(), "3");
    }
}
