//! Span rule table.
//!
//! One row per [`SpanKind`], in dispatch priority order. A row opens a span at
//! the cursor when its three context windows agree: the character before the
//! cursor, the character at the cursor, and the text after it. Each row also
//! fixes how the span closes and which kinds may open inside it.

use crate::span::SpanKind;
use regex::Regex;
use std::sync::LazyLock;

/// How a span decides it has reached its end.
#[derive(Debug)]
pub(crate) enum End {
    /// Runs to end of text.
    Eof,
    /// Closes where `pattern` matches the text at the cursor. With `unescaped`
    /// the cursor must not follow an odd run of backslashes.
    Pattern { pattern: Regex, unescaped: bool },
    /// Closes at a newline followed by no more spaces than the opening
    /// indentation and then a character other than newline, `#` or space.
    Dedent,
    /// Closes right after the decorated definition seals. Until then it
    /// behaves like `Dedent`, except that lines starting with `def`, `async`
    /// or another decorator keep it open.
    Decorated,
}

impl End {
    pub(crate) fn closes(&self, text: &str, cursor: usize, indent: usize) -> bool {
        match self {
            End::Eof => false,
            End::Pattern {
                pattern,
                unescaped,
            } => {
                if *unescaped && escaped(text, cursor) {
                    return false;
                }
                pattern.is_match(&text[cursor..])
            }
            End::Dedent => dedents(text, cursor, indent, &[]),
            End::Decorated => dedents(text, cursor, indent, &[b'd', b'a', b'@']),
        }
    }
}

/// An odd run of backslashes precedes `cursor`.
fn escaped(text: &str, cursor: usize) -> bool {
    let run = text.as_bytes()[..cursor]
        .iter()
        .rev()
        .take_while(|&&b| b == b'\\')
        .count();
    run % 2 == 1
}

fn dedents(text: &str, cursor: usize, indent: usize, exempt: &[u8]) -> bool {
    let bytes = text.as_bytes();
    if bytes[cursor] != b'\n' {
        return false;
    }
    let spaces = bytes[cursor + 1..]
        .iter()
        .take_while(|&&b| b == b' ')
        .count();
    if spaces > indent {
        return false;
    }
    match bytes.get(cursor + 1 + spaces) {
        Some(b'\n' | b'#' | b' ') | None => false,
        Some(b) => !exempt.contains(b),
    }
}

/// A compiled row of the table.
#[derive(Debug)]
pub(crate) struct Rule {
    pub kind: SpanKind,
    before: Regex,
    current: Regex,
    lookahead: Regex,
    pub end: End,
    /// Bytes of the opening delimiter, skipped before scanning starts.
    pub opener: usize,
    /// Bytes past the end match that still belong to the span.
    pub trailing: usize,
    /// Bytes past the end match at which the parent resumes.
    pub resume: isize,
    /// Running into end of text marks the span unterminated.
    pub must_close: bool,
    /// Opens only on the first token of a line.
    line_head: bool,
    pub children: &'static [SpanKind],
}

impl Rule {
    fn opens(&self, before: &str, current: &str, rest: &str) -> bool {
        self.current.is_match(current) && self.before.is_match(before) && self.lookahead.is_match(rest)
    }
}

// -- Legal children ---------------------------------------------------------

use SpanKind::*;

const NONE: &[SpanKind] = &[];

const CODE: &[SpanKind] = &[
    Bracket,
    StraightBracket,
    CurvedBracket,
    FormattedSingleString,
    FormattedDoubleString,
    SingleString,
    DoubleString,
    SingleDocstring,
    DoubleDocstring,
    Comment,
    SelfAttribute,
];

const FORMATTED: &[SpanKind] = &[CurvedBracket];

const FILE: &[SpanKind] = &[
    Bracket,
    StraightBracket,
    CurvedBracket,
    FormattedSingleString,
    FormattedDoubleString,
    SingleString,
    DoubleString,
    SingleDocstring,
    DoubleDocstring,
    Comment,
    Function,
    Class,
    DecoratorArgument,
];

const CALLABLE: &[SpanKind] = &[
    Bracket,
    StraightBracket,
    CurvedBracket,
    FormattedSingleString,
    FormattedDoubleString,
    SingleString,
    DoubleString,
    SingleDocstring,
    DoubleDocstring,
    Comment,
    Function,
    Class,
    DecoratorArgument,
    SelfAttribute,
    Return,
    Raise,
    Yield,
];

const CLASS: &[SpanKind] = &[
    Bracket,
    StraightBracket,
    CurvedBracket,
    FormattedSingleString,
    FormattedDoubleString,
    SingleString,
    DoubleString,
    SingleDocstring,
    DoubleDocstring,
    Comment,
    Class,
    Method,
    Decorator,
    DecoratorArgument,
    SelfAttribute,
    ClassAttribute,
];

const DECORATOR: &[SpanKind] = &[Method, Comment, DecoratorArgument];

const DECORATOR_ARGUMENT: &[SpanKind] = &[
    Bracket,
    StraightBracket,
    CurvedBracket,
    FormattedSingleString,
    FormattedDoubleString,
    SingleString,
    DoubleString,
    Comment,
];

const STATEMENT: &[SpanKind] = &[
    Bracket,
    StraightBracket,
    CurvedBracket,
    FormattedSingleString,
    FormattedDoubleString,
    SingleString,
    DoubleString,
    SingleDocstring,
    DoubleDocstring,
    SelfAttribute,
];

// -- Table ------------------------------------------------------------------

const ANY: &str = r"[\s\S]";
const NOTHING: &str = r"[^\s\S]";
const LINE_START: &str = r"[\n ]";

enum EndSpec {
    Eof,
    Pattern(&'static str, bool),
    Dedent,
    Decorated,
}

struct Row {
    kind: SpanKind,
    before: &'static str,
    current: &'static str,
    lookahead: &'static str,
    end: EndSpec,
    opener: usize,
    trailing: usize,
    resume: isize,
    must_close: bool,
    line_head: bool,
    children: &'static [SpanKind],
}

const fn row(
    kind: SpanKind,
    context: [&'static str; 3],
    end: EndSpec,
    opener: usize,
    trailing: usize,
    resume: isize,
    children: &'static [SpanKind],
) -> Row {
    let must_close = matches!(end, EndSpec::Pattern(_, true)) && !matches!(kind, Comment);
    Row {
        kind,
        before: context[0],
        current: context[1],
        lookahead: context[2],
        end,
        opener,
        trailing,
        resume,
        must_close,
        line_head: matches!(kind, ClassAttribute),
        children,
    }
}

#[rustfmt::skip]
const ROWS: &[Row] = &[
    row(Bracket,               [ANY, r"\(", ""], EndSpec::Pattern(r"^\)", true), 1, 1, 1, CODE),
    row(StraightBracket,       [ANY, r"\[", ""], EndSpec::Pattern(r"^\]", true), 1, 1, 1, CODE),
    row(CurvedBracket,         [ANY, r"\{", ""], EndSpec::Pattern(r"^\}", true), 1, 1, 0, CODE),
    row(FormattedSingleString, [r"[fF]", "'", r"^[^']"], EndSpec::Pattern("^'", true), 1, 1, 1, FORMATTED),
    row(FormattedDoubleString, [r"[fF]", "\"", r#"^[^"]"#], EndSpec::Pattern("^\"", true), 1, 1, 1, FORMATTED),
    row(SingleString,          [r"[^\\']", "'", r"^[^']"], EndSpec::Pattern("^'", true), 1, 1, 1, NONE),
    row(DoubleString,          [r#"[^\\"]"#, "\"", r#"^[^"]"#], EndSpec::Pattern("^\"", true), 1, 1, 1, NONE),
    row(SingleDocstring,       [r"[^\\]", "'", "^''"], EndSpec::Pattern("^'''", true), 3, 3, 3, NONE),
    row(DoubleDocstring,       [r"[^\\]", "\"", "^\"\""], EndSpec::Pattern("^\"\"\"", true), 3, 3, 3, NONE),
    row(Comment,               [ANY, "#", ""], EndSpec::Pattern(r"^\n", true), 1, 0, 0, NONE),
    row(Function,              [LINE_START, "d", "^ef[ ]"], EndSpec::Dedent, 1, 0, 0, CALLABLE),
    row(Method,                [LINE_START, "d", "^ef[ ]"], EndSpec::Dedent, 1, 0, -1, CALLABLE),
    row(ClassMethod,           [LINE_START, "d", "^ef[ ]"], EndSpec::Dedent, 1, 0, -1, CALLABLE),
    row(Class,                 [LINE_START, "c", "^lass[ ]"], EndSpec::Dedent, 1, 0, 0, CLASS),
    row(Decorator,             [LINE_START, "@", r"^(?:property|classmethod)[ ]*(?:#|\n|$)"], EndSpec::Decorated, 1, 0, 0, DECORATOR),
    row(DecoratorArgument,     [LINE_START, "@", r"^[A-Za-z_][\w.]*[ ]*[(\n#]"], EndSpec::Pattern(r"^\n", false), 1, 0, 0, DECORATOR_ARGUMENT),
    row(SelfAttribute,         [r"\W", "s", r"^elf\."], EndSpec::Pattern(r"^[^.\w]", false), 1, 0, 0, NONE),
    row(ClassAttribute,        [r"\W", r"\w", r"^\w*[ ]*(?::[^=\n]*)?=(?:[^=]|$)"], EndSpec::Pattern(r"^\W", false), 1, 0, 0, NONE),
    row(Return,                [r"\W", "r", r#"^eturn(?:[ ]+[^ \n#;]|[(\[{'"])"#], EndSpec::Pattern(r"^[\n#;]", false), 1, 0, 0, STATEMENT),
    row(Raise,                 [r"\W", "r", r"^aise(?:[ ]+[^ \n#;]|\()"], EndSpec::Pattern(r"^[\n#;]", false), 1, 0, 0, STATEMENT),
    row(Yield,                 [r"\W", "y", r#"^ield(?:[ ]+[^ \n#;]|[(\[{'"])"#], EndSpec::Pattern(r"^[\n#;]", false), 1, 0, 0, STATEMENT),
    row(File,                  [NOTHING, NOTHING, NOTHING], EndSpec::Eof, 0, 0, 0, FILE),
];

static TABLE: LazyLock<Vec<Rule>> = LazyLock::new(|| ROWS.iter().map(compile).collect());

fn compile(row: &Row) -> Rule {
    let end = match row.end {
        EndSpec::Eof => End::Eof,
        EndSpec::Pattern(pattern, unescaped) => End::Pattern {
            pattern: Regex::new(pattern).unwrap(),
            unescaped,
        },
        EndSpec::Dedent => End::Dedent,
        EndSpec::Decorated => End::Decorated,
    };
    Rule {
        kind: row.kind,
        before: Regex::new(row.before).unwrap(),
        current: Regex::new(row.current).unwrap(),
        lookahead: Regex::new(row.lookahead).unwrap(),
        end,
        opener: row.opener,
        trailing: row.trailing,
        resume: row.resume,
        must_close: row.must_close,
        line_head: row.line_head,
        children: row.children,
    }
}

/// The row governing `kind`.
pub(crate) fn rule(kind: SpanKind) -> &'static Rule {
    TABLE
        .iter()
        .find(|rule| rule.kind == kind)
        .unwrap_or_else(|| unreachable!("every span kind has a row"))
}

/// First child kind legal inside `parent` that opens at `cursor`.
pub(crate) fn dispatch(parent: &Rule, text: &str, cursor: usize) -> Option<SpanKind> {
    let current_char = text[cursor..].chars().next()?;
    let next = cursor + current_char.len_utf8();
    let before = match text[..cursor].chars().next_back() {
        Some(c) => &text[cursor - c.len_utf8()..cursor],
        None => "\n",
    };
    let current = &text[cursor..next];
    let rest = &text[next..];
    let line_head = text[..cursor]
        .bytes()
        .rev()
        .take_while(|&b| b != b'\n')
        .all(|b| b == b' ');
    TABLE
        .iter()
        .filter(|rule| parent.children.contains(&rule.kind))
        .filter(|rule| line_head || !rule.line_head)
        .find(|rule| rule.opens(before, current, rest))
        .map(|rule| rule.kind)
}
