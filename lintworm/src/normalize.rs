//! Source normalization before scanning.
//!
//! The scanner measures indentation in spaces and only knows `\n` line ends,
//! so tabs are expanded to the next 4-column boundary and CRLF becomes LF.

use std::borrow::Cow;

const TAB_WIDTH: usize = 4;

pub fn normalize(text: &str) -> Cow<'_, str> {
    if !text.contains(['\t', '\r']) {
        return Cow::Borrowed(text);
    }
    let unix = text.replace("\r\n", "\n");
    let lines: Vec<String> = unix.split('\n').map(expand_tabs).collect();
    Cow::Owned(lines.join("\n"))
}

/// Expand every tab in one line to spaces up to the next tab stop.
pub fn expand_tabs(line: &str) -> String {
    let mut out = String::with_capacity(line.len());
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let pad = TAB_WIDTH - column % TAB_WIDTH;
            out.extend(std::iter::repeat(' ').take(pad));
            column += pad;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}
