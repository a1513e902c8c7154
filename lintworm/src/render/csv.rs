//! CSV renderer.
//!
//! One header row of column names, one row per record. Fields holding a
//! comma, quote or line break are quoted with inner quotes doubled. Merging
//! keeps the rows of files that were not re-analysed.

use crate::render::Renderer;
use anyhow::Result;
use lintworm_syntax::{Column, Record};
use std::borrow::Cow;
use std::collections::HashSet;
use tracing::warn;

pub struct CsvRenderer;

impl Renderer for CsvRenderer {
    fn render(&self, columns: &[Column], records: &[Record]) -> Result<String> {
        let mut out = String::new();
        push_row(&mut out, columns.iter().map(|c| c.header()));
        for record in records {
            push_record(&mut out, columns, record);
        }
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "csv"
    }

    fn merge(
        &self,
        existing: &str,
        columns: &[Column],
        records: &[Record],
        replaced: &HashSet<String>,
    ) -> Result<String> {
        let rows = parse(existing);
        let Some((header, old_rows)) = rows.split_first() else {
            return self.render(columns, records);
        };
        let same_columns = header
            .iter()
            .map(String::as_str)
            .eq(columns.iter().map(|c| c.header()));
        if !same_columns {
            warn!("existing report has different columns, rewriting it");
            return self.render(columns, records);
        }
        let Some(path_index) = columns.iter().position(|c| *c == Column::Path) else {
            warn!("reports without a path column cannot be merged, rewriting it");
            return self.render(columns, records);
        };

        let mut out = String::new();
        push_row(&mut out, columns.iter().map(|c| c.header()));
        for row in old_rows {
            if !row.get(path_index).is_some_and(|path| replaced.contains(path)) {
                push_row(&mut out, row.iter().map(String::as_str));
            }
        }
        for record in records {
            push_record(&mut out, columns, record);
        }
        Ok(out)
    }
}

fn push_record(out: &mut String, columns: &[Column], record: &Record) {
    let cells: Vec<String> = columns
        .iter()
        .map(|c| record.value(*c).to_string())
        .collect();
    push_row(out, cells.iter().map(String::as_str));
}

fn push_row<'f>(out: &mut String, fields: impl Iterator<Item = &'f str>) {
    for (i, field) in fields.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape(field));
    }
    out.push('\n');
}

fn escape(field: &str) -> Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", field.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(field)
    }
}

/// Split CSV text into rows of unquoted fields.
pub(crate) fn parse(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if quoted {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    field.push('"');
                    chars.next();
                }
                '"' => quoted = false,
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' => quoted = true,
            ',' => row.push(std::mem::take(&mut field)),
            '\r' => {}
            '\n' => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            _ => field.push(c),
        }
    }
    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}
