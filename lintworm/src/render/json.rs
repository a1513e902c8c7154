//! JSON renderer: an array of objects keyed by column name.

use crate::render::Renderer;
use anyhow::{Context, Result};
use lintworm_syntax::{Column, Record, Value as Cell};
use serde_json::{Map, Value};
use std::collections::HashSet;
use tracing::warn;

pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, columns: &[Column], records: &[Record]) -> Result<String> {
        let objects = records.iter().map(|r| object(columns, r)).collect();
        encode(objects)
    }

    fn file_extension(&self) -> &str {
        "json"
    }

    fn merge(
        &self,
        existing: &str,
        columns: &[Column],
        records: &[Record],
        replaced: &HashSet<String>,
    ) -> Result<String> {
        let Ok(old) = serde_json::from_str::<Vec<Map<String, Value>>>(existing) else {
            warn!("existing report is not a JSON array of records, rewriting it");
            return self.render(columns, records);
        };
        let kept = old.into_iter().filter(|entry| {
            !entry
                .get(Column::Path.header())
                .and_then(Value::as_str)
                .is_some_and(|path| replaced.contains(path))
        });
        let objects = kept
            .chain(records.iter().map(|r| object(columns, r)))
            .collect();
        encode(objects)
    }
}

fn object(columns: &[Column], record: &Record) -> Map<String, Value> {
    columns
        .iter()
        .map(|column| {
            let value = match record.value(*column) {
                Cell::Text(s) => Value::from(s),
                Cell::List(items) => Value::from(items.to_vec()),
                Cell::Count(n) => Value::from(n),
                Cell::Flag(b) => Value::from(b),
            };
            (column.header().to_string(), value)
        })
        .collect()
}

fn encode(objects: Vec<Map<String, Value>>) -> Result<String> {
    let mut out = serde_json::to_string_pretty(&objects).context("failed to encode report")?;
    out.push('\n');
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lintworm_syntax::{analyze, GrammarSet, ScanOptions};

    fn records(path: &str, source: &str) -> Vec<Record> {
        let grammars = GrammarSet::standard().unwrap();
        analyze(path, source, &grammars, &ScanOptions::default())
            .unwrap()
            .records(false)
    }

    #[test]
    fn objects_use_column_names_and_native_types() {
        let columns = [Column::Path, Column::Type, Column::Returns, Column::Inputs, Column::Documented];
        let out = JsonRenderer
            .render(&columns, &records("a.py", "def f(b, a):\n    return a\n"))
            .unwrap();
        let parsed: Vec<Map<String, Value>> = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1]["type"], "function");
        assert_eq!(parsed[1]["returns"], 1);
        assert_eq!(parsed[1]["inputs"], serde_json::json!(["a", "b"]));
        assert_eq!(parsed[1]["documented"], false);
    }

    #[test]
    fn merge_keeps_other_paths() {
        let columns = [Column::Path, Column::Name];
        let first = JsonRenderer.render(&columns, &records("a.py", "x = 1\n")).unwrap();
        let first = JsonRenderer
            .merge(&first, &columns, &records("b.py", "x = 1\n"), &HashSet::new())
            .unwrap();
        let replaced: HashSet<String> = ["a.py".to_string()].into();
        let merged = JsonRenderer
            .merge(&first, &columns, &records("a.py", "y = 2\n"), &replaced)
            .unwrap();
        let parsed: Vec<Map<String, Value>> = serde_json::from_str(&merged).unwrap();
        let paths: Vec<_> = parsed.iter().map(|o| o["path"].as_str().unwrap()).collect();
        assert_eq!(paths, vec!["b.py", "a.py"]);
    }
}
