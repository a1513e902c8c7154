//! Plain-text renderer: one line per record plus a totals line.
//!
//! Columns are ignored; each line names what is missing.

use crate::render::Renderer;
use anyhow::Result;
use lintworm_syntax::{Column, Record};

pub struct TextRenderer;

impl Renderer for TextRenderer {
    fn render(&self, _columns: &[Column], records: &[Record]) -> Result<String> {
        let mut out = String::new();
        for record in records {
            out.push_str(&format!(
                "{}:{}: {} {}: {}\n",
                record.path,
                record.start_line,
                record.kind,
                record.name,
                problems(record)
            ));
        }
        let documented = records.iter().filter(|r| r.documented).count();
        out.push_str(&format!(
            "{} spans, {} documented, {} incomplete\n",
            records.len(),
            documented,
            records.len() - documented
        ));
        Ok(out)
    }

    fn file_extension(&self) -> &str {
        "txt"
    }
}

fn problems(record: &Record) -> String {
    if record.documented {
        return "documented".to_string();
    }
    if !record.warnings.is_empty() {
        return record.warnings.join("; ");
    }
    if record.kind == "file" {
        return "incomplete".to_string();
    }
    if !record.multiline_comments {
        return "no docstring".to_string();
    }
    if !record.formatted_multiline {
        return "docstring does not match the grammar".to_string();
    }

    let mut out = Vec::new();
    if !record.missing_inputs.is_empty() {
        out.push(format!("missing inputs {}", record.missing_inputs.join(", ")));
    }
    if !record.missing_parameters.is_empty() {
        out.push(format!("missing attributes {}", record.missing_parameters.join(", ")));
    }
    if record.returns != record.found_returns {
        out.push(format!("{} of {} returns documented", record.found_returns, record.returns));
    }
    if record.yields != record.found_yields {
        out.push(format!("{} of {} yields documented", record.found_yields, record.yields));
    }
    if !record.missing_raises.is_empty() {
        out.push(format!("missing raises {}", record.missing_raises.join(", ")));
    }
    if out.is_empty() {
        // complete itself, spoiled by a nested definition
        return "nested definitions incomplete".to_string();
    }
    out.join("; ")
}
