//! Report rendering: trait-based format dispatch and report files.

pub mod csv;
pub mod json;
pub mod text;

use anyhow::{anyhow, Context, Result};
use lintworm_syntax::{Column, Record, STANDARD_COLUMNS};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

/// Renders report records into one output format.
pub trait Renderer {
    fn render(&self, columns: &[Column], records: &[Record]) -> Result<String>;

    fn file_extension(&self) -> &str;

    /// Fold fresh records into an existing report. Old rows whose path is in
    /// `replaced` are dropped; the default starts over.
    fn merge(
        &self,
        existing: &str,
        columns: &[Column],
        records: &[Record],
        replaced: &HashSet<String>,
    ) -> Result<String> {
        let _ = (existing, replaced);
        self.render(columns, records)
    }
}

/// Create a renderer for the given format name.
pub fn create_renderer(format: &str) -> Result<Box<dyn Renderer>> {
    match format {
        "csv" => Ok(Box::new(csv::CsvRenderer)),
        "json" => Ok(Box::new(json::JsonRenderer)),
        "text" | "txt" => Ok(Box::new(text::TextRenderer)),
        _ => Err(anyhow!("unknown format: {}. Use csv, json, or text", format)),
    }
}

/// Resolve `--columns` values; nothing selects the standard set and `all`
/// selects every column.
pub fn parse_columns(names: &[String]) -> Result<Vec<Column>> {
    match names {
        [] => Ok(STANDARD_COLUMNS.to_vec()),
        [all] if all == "all" => Ok(Column::ALL.to_vec()),
        _ => names
            .iter()
            .map(|name| name.parse::<Column>().map_err(|e| anyhow!(e)))
            .collect(),
    }
}

/// Write records to `target`, merging with a report already there. A
/// directory target gets a fresh time-stamped file name.
pub fn write_report(
    renderer: &dyn Renderer,
    target: &Path,
    columns: &[Column],
    records: &[Record],
    replaced: &HashSet<String>,
) -> Result<PathBuf> {
    let path = if target.is_dir() {
        target.join(report_file_name(renderer.file_extension()))
    } else {
        target.to_path_buf()
    };
    let content = if path.is_file() {
        let existing = fs::read_to_string(&path)
            .with_context(|| format!("failed to read report {}", path.display()))?;
        renderer.merge(&existing, columns, records, replaced)?
    } else {
        renderer.render(columns, records)?
    };
    fs::write(&path, content)
        .with_context(|| format!("failed to write report {}", path.display()))?;
    Ok(path)
}

fn report_file_name(extension: &str) -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    format!(
        "LintwormReport_{:02}_{:02}_{:02}.{extension}",
        now.hour(),
        now.minute(),
        now.second()
    )
}
