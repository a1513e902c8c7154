//! Signature and statement extraction for sealed definitions.

use crate::span::{Span, SpanKind};
use serde::Serialize;
use std::collections::BTreeSet;

/// What a definition declares: its inputs, statements and attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DefinitionInfo {
    /// Parameter names in signature order.
    pub declared_inputs: Vec<String>,
    pub return_count: usize,
    pub yield_count: usize,
    pub raised_names: Vec<String>,
    /// Classes only.
    pub declared_class_attributes: BTreeSet<String>,
}

impl DefinitionInfo {
    pub fn extract(span: &Span<'_>) -> Self {
        match span.kind {
            SpanKind::Class => Self {
                declared_class_attributes: class_attributes(span),
                ..Self::default()
            },
            kind if kind.is_callable() => Self {
                declared_inputs: parameters(span),
                return_count: count(span, SpanKind::Return),
                yield_count: count(span, SpanKind::Yield),
                raised_names: span
                    .children
                    .iter()
                    .filter(|c| c.kind == SpanKind::Raise)
                    .map(|c| c.name())
                    .filter(|name| !name.is_empty())
                    .map(str::to_string)
                    .collect(),
                ..Self::default()
            },
            _ => Self::default(),
        }
    }
}

fn count(span: &Span<'_>, kind: SpanKind) -> usize {
    span.children.iter().filter(|c| c.kind == kind).count()
}

// -- Parameters -------------------------------------------------------------

/// Parameter names of a callable, without `*args`, `**kwargs`, the `/`
/// marker and the implicit receiver.
pub fn parameters(span: &Span<'_>) -> Vec<String> {
    let Some(list) = span.children.iter().find(|c| c.kind == SpanKind::Bracket) else {
        return Vec::new();
    };
    let own = list.own_text();
    let inner = own.strip_prefix('(').unwrap_or(&own);
    let inner = inner.strip_suffix(')').unwrap_or(inner);
    let receiver = match span.kind {
        SpanKind::Method => Some("self"),
        SpanKind::ClassMethod => Some("cls"),
        _ => None,
    };
    inner
        .split(',')
        .filter_map(parameter_name)
        .filter(|name| Some(name.as_str()) != receiver)
        .collect()
}

fn parameter_name(item: &str) -> Option<String> {
    let item = item.trim();
    let item = &item[..unescaped_equals(item).unwrap_or(item.len())];
    let item = item.split(':').next().unwrap_or(item).trim();
    if item.is_empty() || item.contains('*') || item == "/" {
        None
    } else {
        Some(item.to_string())
    }
}

fn unescaped_equals(item: &str) -> Option<usize> {
    let mut prev = None;
    for (i, c) in item.char_indices() {
        if c == '=' && prev != Some('\\') {
            return Some(i);
        }
        prev = Some(c);
    }
    None
}

// -- Class attributes -------------------------------------------------------

fn class_attributes(class: &Span<'_>) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    collect_self_attributes(class, &mut names);
    names.extend(
        class
            .children
            .iter()
            .filter(|c| c.kind == SpanKind::ClassAttribute)
            .map(|c| c.name().to_string()),
    );

    for method in class.children.iter().flat_map(plain_methods) {
        names.remove(method);
    }

    for decorator in class.children.iter().filter(|c| is_decorator(c, "property")) {
        names.extend(
            decorator
                .children
                .iter()
                .filter(|c| c.kind.is_definition())
                .map(|c| c.name().to_string()),
        );
    }
    names.retain(|name| !name.is_empty());
    names
}

/// Attribute names reached through `self.` anywhere in the class body,
/// except inside nested classes.
fn collect_self_attributes(span: &Span<'_>, names: &mut BTreeSet<String>) {
    for child in &span.children {
        match child.kind {
            SpanKind::SelfAttribute => {
                names.insert(child.name().to_string());
            }
            SpanKind::Class => {}
            _ => collect_self_attributes(child, names),
        }
    }
}

/// Undecorated and `@classmethod` methods directly under a class.
fn plain_methods<'s>(child: &'s Span<'_>) -> Vec<&'s str> {
    match child.kind {
        SpanKind::Method => vec![child.name()],
        SpanKind::Decorator if is_decorator(child, "classmethod") => child
            .children
            .iter()
            .filter(|c| c.kind.is_callable())
            .map(|c| c.name())
            .collect(),
        _ => Vec::new(),
    }
}

fn is_decorator(span: &Span<'_>, name: &str) -> bool {
    span.kind == SpanKind::Decorator && span.name() == name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{scan, ScanOptions};

    fn first_definition<'s, 'a>(file: &'s Span<'a>) -> &'s Span<'a> {
        file.descendants()
            .find(|s| s.kind.is_definition())
            .unwrap()
    }

    fn info(source: &str) -> DefinitionInfo {
        let file = scan(source, &ScanOptions::default()).unwrap();
        DefinitionInfo::extract(first_definition(&file))
    }

    #[test]
    fn star_arguments_and_defaults_are_dropped() {
        let info = info("def f(a, b=1, *args, **kwargs):\n    pass\n");
        assert_eq!(info.declared_inputs, vec!["a", "b"]);
    }

    #[test]
    fn annotations_and_markers() {
        let info = info("def f(a: int, /, b: Dict[str, int] = {}, *, c=\"x,y\"):\n    pass\n");
        assert_eq!(info.declared_inputs, vec!["a", "b", "c"]);
    }

    #[test]
    fn multiline_signature_with_comment() {
        let source = "def f(inp1, inp2=\"([{\",  # a, b\n      inp3=max(0, 100)):\n    pass\n";
        assert_eq!(info(source).declared_inputs, vec!["inp1", "inp2", "inp3"]);
    }

    #[test]
    fn receiver_is_filtered() {
        let source = "class A:\n    def m(self, x):\n        pass\n";
        let file = scan(source, &ScanOptions::default()).unwrap();
        let method = &file.children[0].children[0];
        assert_eq!(method.kind, SpanKind::Method);
        assert_eq!(DefinitionInfo::extract(method).declared_inputs, vec!["x"]);

        let source = "class A:\n    @classmethod\n    def m(cls, y):\n        pass\n";
        let file = scan(source, &ScanOptions::default()).unwrap();
        let method = &file.children[0].children[0].children[0];
        assert_eq!(method.kind, SpanKind::ClassMethod);
        assert_eq!(DefinitionInfo::extract(method).declared_inputs, vec!["y"]);
    }

    #[test]
    fn statements_are_counted() {
        let source = "def f(a):\n    if a:\n        raise ValueError('a')\n    if not a:\n        raise errors.Custom\n    yield 1\n    return a\n    return\n";
        let info = info(source);
        assert_eq!(info.return_count, 1);
        assert_eq!(info.yield_count, 1);
        assert_eq!(info.raised_names, vec!["ValueError", "errors.Custom"]);
    }

    #[test]
    fn nested_function_statements_stay_nested() {
        let source = "def outer():\n    def inner():\n        return 1\n    return inner\n";
        let info = info(source);
        assert_eq!(info.return_count, 1);
    }

    #[test]
    fn class_attribute_sources() {
        let source = "class A:\n    limit = 3\n\n    def __init__(self):\n        self.items = []\n        self.run()\n\n    @property\n    def size(self):\n        return len(self.items)\n\n    def run(self):\n        pass\n";
        let info = info(source);
        let names: Vec<_> = info.declared_class_attributes.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["items", "limit", "size"]);
    }

    #[test]
    fn annotated_class_attributes() {
        let source = "class Point:\n    x: int = 0\n    y: Dict[str, int] = {}\n    label: str\n";
        let names: Vec<_> = info(source).declared_class_attributes.into_iter().collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn lambda_defaults_are_not_attributes() {
        let source = "class Sorter:\n    key = lambda s, a=1: a\n";
        let names: Vec<_> = info(source).declared_class_attributes.into_iter().collect();
        assert_eq!(names, vec!["key"]);
    }

    #[test]
    fn nested_class_attributes_are_not_collected() {
        let source = "class A:\n    class B:\n        def __init__(self):\n            self.inner = 1\n    def __init__(self):\n        self.outer = 2\n";
        let info = info(source);
        let names: Vec<_> = info.declared_class_attributes.iter().map(String::as_str).collect();
        assert_eq!(names, vec!["outer"]);
    }
}
