//! Docstring verification and bottom-up coverage aggregation.
//!
//! [`Outline::build`] folds a sealed span tree into the tree of reportable
//! spans (the file and its definitions). Every node is computed once from its
//! span and its already-built children.

use crate::extract::DefinitionInfo;
use crate::grammar::GrammarSet;
use crate::span::{Span, SpanKind};
use serde::Serialize;

/// What a definition's docstring documents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocFindings {
    pub found_inputs: Vec<String>,
    pub found_return_count: usize,
    pub found_yield_count: usize,
    pub found_raised_names: Vec<String>,
    pub matched_grammar: bool,
    pub is_complete: bool,
}

impl DocFindings {
    pub fn verify(span: &Span<'_>, info: &DefinitionInfo, grammars: &GrammarSet) -> Self {
        let Some(grammar) = grammars.for_kind(span.kind) else {
            return Self::default();
        };
        let Some(doc) = docstring(span) else {
            return Self::default();
        };
        if !grammar.matches(doc.text) {
            return Self::default();
        }

        let found_inputs: Vec<String> = grammar
            .parameters(doc.text)
            .into_iter()
            .map(str::to_string)
            .collect();
        let found_raised_names: Vec<String> = grammar
            .raises(doc.text)
            .into_iter()
            .map(str::to_string)
            .collect();
        let found_return_count = grammar.return_count(doc.text);
        let found_yield_count = grammar.yield_count(doc.text);

        let inputs_documented = if span.kind == SpanKind::Class {
            info.declared_class_attributes
                .iter()
                .all(|name| found_inputs.contains(name))
        } else {
            info.declared_inputs
                .iter()
                .all(|name| found_inputs.contains(name))
        };
        let is_complete = inputs_documented
            && found_return_count == info.return_count
            && found_yield_count == info.yield_count
            && info
                .raised_names
                .iter()
                .all(|name| found_raised_names.contains(name));

        Self {
            found_inputs,
            found_return_count,
            found_yield_count,
            found_raised_names,
            matched_grammar: true,
            is_complete,
        }
    }
}

/// The docstring of a definition: the first child after the header colon,
/// with only whitespace and comments before it.
pub fn docstring<'s, 'a>(span: &'s Span<'a>) -> Option<&'s Span<'a>> {
    let mut from = header_end(span)?;
    for child in &span.children {
        if child.start < from {
            continue;
        }
        if !span.slice(from, child.start).trim().is_empty() {
            return None;
        }
        match child.kind {
            SpanKind::Comment => from = child.end,
            kind if kind.is_docstring() => return Some(child),
            _ => return None,
        }
    }
    None
}

/// Absolute offset just past the first colon not covered by a child.
fn header_end(span: &Span<'_>) -> Option<usize> {
    let mut from = span.start;
    for child in &span.children {
        if let Some(i) = span.slice(from, child.start).find(':') {
            return Some(from + i + 1);
        }
        from = child.end;
    }
    span.slice(from, span.end).find(':').map(|i| from + i + 1)
}

/// The four aggregate coverage flags of a reportable span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Coverage {
    pub has_basic_comment: bool,
    pub has_multiline_comment: bool,
    pub docstring_matches_grammar: bool,
    pub is_complete: bool,
}

impl Coverage {
    fn of(span: &Span<'_>, findings: &DocFindings, children: &[Outline]) -> Self {
        let has_basic_comment = span
            .descendants()
            .any(|s| s.kind == SpanKind::Comment || s.kind.is_docstring());
        let has_docstring = span.children.iter().any(|s| s.kind.is_docstring());
        let nested_complete = children.iter().all(|c| c.coverage.is_complete);

        if span.kind != SpanKind::File {
            return Self {
                has_basic_comment,
                has_multiline_comment: has_docstring,
                docstring_matches_grammar: findings.matched_grammar,
                is_complete: findings.is_complete && nested_complete,
            };
        }
        if children.is_empty() {
            return Self {
                has_basic_comment: true,
                has_multiline_comment: true,
                docstring_matches_grammar: true,
                is_complete: true,
            };
        }
        Self {
            has_basic_comment,
            has_multiline_comment: has_docstring
                || children.iter().all(|c| c.coverage.has_multiline_comment),
            docstring_matches_grammar: children
                .iter()
                .all(|c| c.coverage.docstring_matches_grammar),
            is_complete: nested_complete,
        }
    }
}

/// A verified reportable span.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outline {
    pub kind: SpanKind,
    pub name: String,
    pub start: usize,
    pub end: usize,
    pub info: DefinitionInfo,
    pub findings: DocFindings,
    pub coverage: Coverage,
    /// Some span inside ran to end of text unclosed.
    pub tainted: bool,
    pub children: Vec<Outline>,
}

impl Outline {
    /// Verify `span` and every definition nested in it. `name` labels the
    /// root; definitions are named from their text.
    pub fn build(span: &Span<'_>, name: String, grammars: &GrammarSet) -> Self {
        let children: Vec<Outline> = nested_definitions(span)
            .into_iter()
            .map(|d| Outline::build(d, d.name().to_string(), grammars))
            .collect();
        let tainted = span.unterminated || span.descendants().any(|s| s.unterminated);
        let info = DefinitionInfo::extract(span);
        let findings = if tainted {
            DocFindings::default()
        } else {
            DocFindings::verify(span, &info, grammars)
        };
        let coverage = Coverage::of(span, &findings, &children);
        Self {
            kind: span.kind,
            name,
            start: span.start,
            end: span.end,
            info,
            findings,
            coverage,
            tainted,
            children,
        }
    }

    /// This node and every nested node, preorder.
    pub fn walk(&self) -> Vec<&Outline> {
        let mut out = vec![self];
        for child in &self.children {
            out.extend(child.walk());
        }
        out
    }
}

/// Closest definitions below `span`, looking through decorators and any other
/// structural span.
fn nested_definitions<'s, 'a>(span: &'s Span<'a>) -> Vec<&'s Span<'a>> {
    let mut out = Vec::new();
    for child in &span.children {
        if child.kind.is_definition() {
            out.push(child);
        } else {
            out.extend(nested_definitions(child));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{scan, ScanOptions};

    fn outline(source: &str) -> Outline {
        let file = scan(source, &ScanOptions::default()).unwrap();
        let grammars = GrammarSet::standard().unwrap();
        Outline::build(&file, "sample.py".to_string(), &grammars)
    }

    #[test]
    fn docstring_follows_header_and_comments() {
        let source = "def f(a: str = \"x:y\"):  # note\n    \"\"\"Doc.\"\"\"\n";
        let file = scan(source, &ScanOptions::default()).unwrap();
        let doc = docstring(&file.children[0]).unwrap();
        assert_eq!(doc.text, "\"\"\"Doc.\"\"\"");
    }

    #[test]
    fn docstring_after_comment_lines() {
        let source = "def f(a=(1, 2)):\n    # one\n    # two\n    '''Doc.'''\n    return a\n";
        let file = scan(source, &ScanOptions::default()).unwrap();
        let doc = docstring(&file.children[0]).unwrap();
        assert_eq!(doc.text, "'''Doc.'''");
    }

    #[test]
    fn docstring_must_come_first() {
        let source = "def f():\n    x = 1\n    \"\"\"Late.\"\"\"\n";
        let file = scan(source, &ScanOptions::default()).unwrap();
        assert!(docstring(&file.children[0]).is_none());
    }

    #[test]
    fn undocumented_function() {
        let outline = outline("def f(a):\n    return a\n");
        let f = &outline.children[0];
        assert_eq!(f.name, "f");
        assert!(!f.coverage.has_basic_comment);
        assert!(!f.findings.matched_grammar);
        assert!(!f.coverage.is_complete);
        assert!(!outline.coverage.is_complete);
    }

    #[test]
    fn file_without_definitions_is_documented() {
        let outline = outline("x = 1\n");
        assert_eq!(
            outline.coverage,
            Coverage {
                has_basic_comment: true,
                has_multiline_comment: true,
                docstring_matches_grammar: true,
                is_complete: true,
            }
        );
    }

    #[test]
    fn nested_incomplete_definition_spoils_parent() {
        let source = "def outer():\n    \"\"\"\n    Outer.\n    \"\"\"\n    def inner(a):\n        pass\n";
        let outline = outline(source);
        let outer = &outline.children[0];
        assert!(outer.findings.is_complete);
        assert!(!outer.children[0].coverage.is_complete);
        assert!(!outer.coverage.is_complete);
    }

    #[test]
    fn class_attributes_must_be_documented() {
        let documented = "class A:\n    \"\"\"\n    Holder.\n\n    :param value: stored\n    \"\"\"\n\n    def __init__(self, value):\n        \"\"\"\n        Build.\n\n        :param value: stored\n        \"\"\"\n        self.value = value\n";
        let outline = outline(documented);
        assert!(outline.coverage.is_complete);

        let missing = documented.replace("    :param value: stored\n    \"\"\"\n\n", "    \"\"\"\n\n");
        let outline = self::outline(&missing);
        let class = &outline.children[0];
        assert!(class.findings.matched_grammar);
        assert!(!class.findings.is_complete);
        assert!(class.children[0].findings.is_complete);
    }

    #[test]
    fn unterminated_span_taints_definition() {
        let source = "def f():\n    \"\"\"\n    Doc.\n    \"\"\"\n    x = (1,\n";
        let outline = outline(source);
        let f = &outline.children[0];
        assert!(f.tainted);
        assert_eq!(f.findings, DocFindings::default());
        assert!(!outline.coverage.is_complete);
    }

    #[test]
    fn walk_is_preorder() {
        let source = "class A:\n    def a(self):\n        pass\n\ndef b():\n    pass\n";
        let outline = outline(source);
        let names: Vec<_> = outline.walk().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["sample.py", "A", "a", "b"]);
    }
}
