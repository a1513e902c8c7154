//! Character-level dispatcher that builds the span tree.
//!
//! Each span scans its own slice of the source: at every position it asks the
//! rule table whether a legal child opens there, then whether its own end
//! matcher fires, and otherwise steps forward one character, tracking the
//! indentation of the current line.

use crate::error::ScanError;
use crate::rules::{self, End};
use crate::span::{Span, SpanKind};
use std::time::Instant;

/// Resource limits for a single scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub max_depth: usize,
    pub deadline: Option<Instant>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_depth: 256,
            deadline: None,
        }
    }
}

/// Scan a whole file into a sealed span tree.
pub fn scan<'a>(source: &'a str, options: &ScanOptions) -> Result<Span<'a>, ScanError> {
    let scanner = Scanner { source, options };
    let (file, _) = scanner.span(SpanKind::File, 0, 0, 0)?;
    Ok(file)
}

struct Scanner<'a, 'o> {
    source: &'a str,
    options: &'o ScanOptions,
}

impl<'a> Scanner<'a, '_> {
    /// Scan one span opening at absolute offset `start`. Returns the sealed
    /// span and the number of bytes the parent should skip.
    fn span(
        &self,
        kind: SpanKind,
        start: usize,
        indent: usize,
        depth: usize,
    ) -> Result<(Span<'a>, usize), ScanError> {
        if depth > self.options.max_depth {
            return Err(ScanError::DepthExceeded {
                limit: self.options.max_depth,
                offset: start,
            });
        }
        self.check_deadline(start)?;

        let rule = rules::rule(kind);
        let text = &self.source[start..];
        let mut children: Vec<Span<'a>> = Vec::new();
        let mut line_indent = indent;
        let mut cursor = rule.opener.min(text.len());
        // end of the last child, relative to `text`
        let mut covered = 0;

        while cursor < text.len() {
            if cursor < covered {
                cursor = covered;
                continue;
            }

            if let Some(child_kind) = rules::dispatch(rule, text, cursor) {
                let child_kind = refine(kind, text, child_kind);
                let (child, consumed) =
                    self.span(child_kind, start + cursor, line_indent, depth + 1)?;
                covered = child.end - start;
                cursor += consumed.max(1);
                let definition = child.kind.is_definition();
                children.push(child);
                if definition && matches!(rule.end, End::Decorated) {
                    let end = cursor.max(covered);
                    return Ok((self.seal(kind, start, end, indent, children, false), end));
                }
                continue;
            }

            if rule.end.closes(text, cursor, indent) {
                let end = (cursor + rule.trailing).min(text.len()).max(covered);
                let consumed = cursor.saturating_add_signed(rule.resume);
                return Ok((self.seal(kind, start, end, indent, children, false), consumed));
            }

            let bytes = text.as_bytes();
            if bytes[cursor] == b'\n' {
                self.check_deadline(start + cursor)?;
                let spaces = bytes[cursor + 1..]
                    .iter()
                    .take_while(|&&b| b == b' ')
                    .count();
                line_indent = spaces;
                cursor += 1 + spaces;
            } else {
                cursor += text[cursor..].chars().next().map_or(1, char::len_utf8);
            }
        }

        let end = text.len();
        Ok((
            self.seal(kind, start, end, indent, children, rule.must_close),
            end,
        ))
    }

    fn seal(
        &self,
        kind: SpanKind,
        start: usize,
        end: usize,
        indent: usize,
        children: Vec<Span<'a>>,
        unterminated: bool,
    ) -> Span<'a> {
        Span {
            kind,
            text: &self.source[start..start + end],
            start,
            end: start + end,
            indent,
            unterminated,
            children,
        }
    }

    fn check_deadline(&self, offset: usize) -> Result<(), ScanError> {
        match self.options.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Err(ScanError::DeadlineExceeded { offset })
            }
            _ => Ok(()),
        }
    }
}

/// Kind decisions that depend on the enclosing span.
fn refine(parent: SpanKind, parent_text: &str, child: SpanKind) -> SpanKind {
    if parent == SpanKind::Decorator
        && child == SpanKind::Method
        && parent_text.starts_with("@classmethod")
    {
        SpanKind::ClassMethod
    } else {
        child
    }
}
