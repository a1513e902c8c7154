//! Documentation grammar.
//!
//! A [`Template`] is the declarative form: one whole-docstring pattern plus a
//! start/end fragment pair per documented field. [`Grammar::compile`] turns it
//! into matchers; the parameter and raise matchers capture the documented name
//! between their fragments.

use crate::error::ConfigError;
use crate::span::SpanKind;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Capture group holding a documented name.
const NAME: &str = "name";

/// Rest of an entry's first line plus its continuation lines (any line whose
/// first non-space character is not a colon).
const ENTRY_TAIL: &str = r"[^\n]*\n(?:[ ]*[^\s:][^\n]*\n)*";

/// Patterns for one definition kind. Omitted fields fall back to the standard
/// template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Template {
    pub main: String,
    pub parameter_start: String,
    pub parameter_end: String,
    pub return_start: String,
    pub return_end: String,
    pub yield_start: String,
    pub yield_end: String,
    pub raise_start: String,
    pub raise_end: String,
}

impl Template {
    /// Sphinx-style fields after a free-form summary:
    ///
    /// ```text
    /// """
    /// Summary
    ///
    /// :param name: {type} explanation
    /// :return: {type} explanation
    /// :yield: {type} explanation
    /// :raise: ErrorName explanation
    /// """
    /// ```
    pub fn standard() -> Self {
        let section = |head: &str| format!(r"(?:(?:[ ]*\n)*[ ]*{head}{ENTRY_TAIL})*");
        let main = [
            r#"[ ]*(?:"""|''')[^\n]*\n(?:[ ]*\n|[ ]*[^\s:][^\n]*\n)*"#.to_string(),
            section(r":param[ ]+\w+:"),
            section(r":returns?:"),
            section(r":yields?:"),
            section(r":raises?:[ ]+[\w.]+"),
            r#"(?:[ ]*\n)*[ ]*(?:"""|''')"#.to_string(),
        ]
        .concat();
        Self {
            main: format!(r#"{main}|[ ]*(?:"""|''')[^\n:]*(?:"""|''')"#),
            parameter_start: r":param[ ]+".to_string(),
            parameter_end: format!(":{ENTRY_TAIL}"),
            return_start: r":returns?:".to_string(),
            return_end: ENTRY_TAIL.to_string(),
            yield_start: r":yields?:".to_string(),
            yield_end: ENTRY_TAIL.to_string(),
            raise_start: r":raises?:[ ]+".to_string(),
            raise_end: ENTRY_TAIL.to_string(),
        }
    }
}

impl Default for Template {
    fn default() -> Self {
        Self::standard()
    }
}

/// Templates for every definition kind, as read from a grammar file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GrammarConfig {
    pub class: Template,
    pub function: Template,
    pub method: Template,
}

/// Compiled matchers for one definition kind.
#[derive(Debug, Clone)]
pub struct Grammar {
    whole: Regex,
    parameter: Regex,
    returns: Regex,
    yields: Regex,
    raises: Regex,
}

impl Grammar {
    pub fn compile(kind: &'static str, template: &Template) -> Result<Self, ConfigError> {
        let fields = [
            ("main", &template.main),
            ("parameter_start", &template.parameter_start),
            ("parameter_end", &template.parameter_end),
            ("return_start", &template.return_start),
            ("return_end", &template.return_end),
            ("yield_start", &template.yield_start),
            ("yield_end", &template.yield_end),
            ("raise_start", &template.raise_start),
            ("raise_end", &template.raise_end),
        ];
        for (field, pattern) in fields {
            build(kind, field, pattern)?;
        }

        Ok(Self {
            whole: build(kind, "main", &format!(r"\A(?:{})\z", template.main))?,
            parameter: build(
                kind,
                "parameter",
                &named(&template.parameter_start, r"\w+", &template.parameter_end),
            )?,
            returns: build(
                kind,
                "return",
                &format!("(?:{})(?:{})", template.return_start, template.return_end),
            )?,
            yields: build(
                kind,
                "yield",
                &format!("(?:{})(?:{})", template.yield_start, template.yield_end),
            )?,
            raises: build(
                kind,
                "raise",
                &named(&template.raise_start, r"[\w.]+", &template.raise_end),
            )?,
        })
    }

    /// The docstring matches the whole template.
    pub fn matches(&self, docstring: &str) -> bool {
        self.whole.is_match(docstring)
    }

    /// Documented parameter names, in order of appearance.
    pub fn parameters<'d>(&self, docstring: &'d str) -> Vec<&'d str> {
        names(&self.parameter, docstring)
    }

    pub fn return_count(&self, docstring: &str) -> usize {
        self.returns.find_iter(docstring).count()
    }

    pub fn yield_count(&self, docstring: &str) -> usize {
        self.yields.find_iter(docstring).count()
    }

    /// Documented error names, in order of appearance.
    pub fn raises<'d>(&self, docstring: &'d str) -> Vec<&'d str> {
        names(&self.raises, docstring)
    }
}

fn named(start: &str, name: &str, end: &str) -> String {
    format!("(?:{start})(?P<{NAME}>{name})(?:{end})")
}

fn names<'d>(regex: &Regex, text: &'d str) -> Vec<&'d str> {
    regex
        .captures_iter(text)
        .filter_map(|caps| caps.name(NAME))
        .map(|m| m.as_str())
        .collect()
}

fn build(kind: &'static str, field: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
        kind,
        field,
        source: Box::new(source),
    })
}

/// Compiled grammars for classes, functions and methods.
#[derive(Debug, Clone)]
pub struct GrammarSet {
    pub class: Grammar,
    pub function: Grammar,
    pub method: Grammar,
}

impl GrammarSet {
    pub fn compile(config: &GrammarConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            class: Grammar::compile("class", &config.class)?,
            function: Grammar::compile("function", &config.function)?,
            method: Grammar::compile("method", &config.method)?,
        })
    }

    pub fn standard() -> Result<Self, ConfigError> {
        Self::compile(&GrammarConfig::default())
    }

    /// Grammar for a definition kind; classmethods share the method grammar.
    pub fn for_kind(&self, kind: SpanKind) -> Option<&Grammar> {
        match kind {
            SpanKind::Class => Some(&self.class),
            SpanKind::Function => Some(&self.function),
            SpanKind::Method | SpanKind::ClassMethod => Some(&self.method),
            _ => None,
        }
    }
}
