//! Span tree produced by the scanner.
//!
//! A [`Span`] borrows its text from the analysed source and owns its children.
//! Children are stored in source order and never overlap; a parent's text
//! always covers every child's text.

use serde::Serialize;
use std::fmt;

/// Every region type the scanner can recognize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpanKind {
    File,
    Class,
    Function,
    Method,
    ClassMethod,
    Bracket,
    StraightBracket,
    CurvedBracket,
    SingleString,
    DoubleString,
    FormattedSingleString,
    FormattedDoubleString,
    SingleDocstring,
    DoubleDocstring,
    Comment,
    SelfAttribute,
    ClassAttribute,
    Return,
    Raise,
    Yield,
    Decorator,
    DecoratorArgument,
}

impl SpanKind {
    /// Class, function, method or classmethod.
    pub fn is_definition(self) -> bool {
        matches!(
            self,
            SpanKind::Class | SpanKind::Function | SpanKind::Method | SpanKind::ClassMethod
        )
    }

    /// Definitions that take a parameter list.
    pub fn is_callable(self) -> bool {
        matches!(
            self,
            SpanKind::Function | SpanKind::Method | SpanKind::ClassMethod
        )
    }

    /// Kinds that get their own report record.
    pub fn is_reportable(self) -> bool {
        self == SpanKind::File || self.is_definition()
    }

    pub fn is_docstring(self) -> bool {
        matches!(self, SpanKind::SingleDocstring | SpanKind::DoubleDocstring)
    }

    /// Short tag used in reports and diagnostics.
    pub fn tag(self) -> &'static str {
        match self {
            SpanKind::File => "file",
            SpanKind::Class => "class",
            SpanKind::Function => "function",
            SpanKind::Method => "method",
            SpanKind::ClassMethod => "classmethod",
            SpanKind::Bracket => "bracket",
            SpanKind::StraightBracket => "straight bracket",
            SpanKind::CurvedBracket => "curved bracket",
            SpanKind::SingleString => "single string",
            SpanKind::DoubleString => "double string",
            SpanKind::FormattedSingleString => "formatted single string",
            SpanKind::FormattedDoubleString => "formatted double string",
            SpanKind::SingleDocstring => "single multiline string",
            SpanKind::DoubleDocstring => "double multiline string",
            SpanKind::Comment => "comment",
            SpanKind::SelfAttribute => "self attribute",
            SpanKind::ClassAttribute => "class attribute",
            SpanKind::Return => "return",
            SpanKind::Raise => "raise",
            SpanKind::Yield => "yield",
            SpanKind::Decorator => "decorator",
            SpanKind::DecoratorArgument => "decorator argument",
        }
    }
}

impl fmt::Display for SpanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// A sealed region of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span<'a> {
    pub kind: SpanKind,
    /// The span's own slice of the source.
    pub text: &'a str,
    /// Absolute byte offset of the first byte.
    pub start: usize,
    /// Absolute byte offset one past the last byte.
    pub end: usize,
    /// Indentation of the line the span opened on.
    pub indent: usize,
    /// The span ran to end of text without finding its closing delimiter.
    pub unterminated: bool,
    pub children: Vec<Span<'a>>,
}

impl<'a> Span<'a> {
    /// Name derived from the span's text. Empty for kinds that carry none.
    pub fn name(&self) -> &'a str {
        let text = self.text;
        match self.kind {
            SpanKind::Class => {
                let rest = text.strip_prefix("class").unwrap_or(text);
                rest.split(['(', ':', '\n']).next().unwrap_or("").trim()
            }
            SpanKind::Function | SpanKind::Method | SpanKind::ClassMethod => {
                let rest = text.strip_prefix("def").unwrap_or(text);
                rest.split(['(', ':', '\n']).next().unwrap_or("").trim()
            }
            SpanKind::Decorator | SpanKind::DecoratorArgument => {
                let rest = text.strip_prefix('@').unwrap_or(text);
                leading_word(rest, |c| c.is_alphanumeric() || c == '_' || c == '.')
            }
            SpanKind::SelfAttribute => text
                .split_once('.')
                .map(|(_, attr)| leading_word(attr, |c| c.is_alphanumeric() || c == '_'))
                .unwrap_or(""),
            SpanKind::ClassAttribute => text.trim(),
            SpanKind::Raise => {
                let rest = text.strip_prefix("raise").unwrap_or(text).trim_start();
                leading_word(rest, |c| c.is_alphanumeric() || c == '_' || c == '.')
            }
            SpanKind::Return => "return",
            SpanKind::Yield => "yield",
            _ => "",
        }
    }

    /// Text of this span with every child's slice cut out.
    pub fn own_text(&self) -> String {
        let mut out = String::with_capacity(self.text.len());
        let mut last = self.start;
        for child in &self.children {
            out.push_str(&self.text[last - self.start..child.start - self.start]);
            last = child.end;
        }
        out.push_str(&self.text[last - self.start..]);
        out
    }

    /// Text between two absolute offsets inside this span.
    pub fn slice(&self, from: usize, to: usize) -> &'a str {
        &self.text[from - self.start..to - self.start]
    }

    /// Every span below this one, preorder.
    pub fn descendants(&self) -> Descendants<'_, 'a> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }
}

/// Preorder iterator over a span's descendants.
pub struct Descendants<'s, 'a> {
    stack: Vec<&'s Span<'a>>,
}

impl<'s, 'a> Iterator for Descendants<'s, 'a> {
    type Item = &'s Span<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let span = self.stack.pop()?;
        self.stack.extend(span.children.iter().rev());
        Some(span)
    }
}

fn leading_word(text: &str, accept: impl Fn(char) -> bool) -> &str {
    let end = text
        .char_indices()
        .find(|&(_, c)| !accept(c))
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    &text[..end]
}
