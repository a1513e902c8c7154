//! lintworm: docstring coverage reports for Python sources.
//!
//! Analyses every input file, then prints the report to stdout or writes it
//! (merging with an existing report) under `--report`.

mod config;
mod discover;
mod hash;
mod normalize;
mod render;
mod run;

use anyhow::{Context, Result};
use clap::Parser;
use hash::{HashEntry, HashStore, Level};
use lintworm_syntax::Record;
use run::{Settings, Status, Summary};
use std::collections::HashSet;
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "lintworm",
    version,
    about = "Report how well Python definitions are documented"
)]
struct Cli {
    /// Files, directories or glob patterns to analyse
    #[arg(required = true)]
    paths: Vec<String>,

    /// Glob pattern of paths to skip. Can be specified multiple times.
    #[arg(short = 'x', long)]
    exclude: Vec<String>,

    /// File of exclusion patterns, one per line
    #[arg(short = 'X', long)]
    exclude_file: Vec<PathBuf>,

    /// JSON documentation grammar
    #[arg(short = 'g', long)]
    grammar: Option<PathBuf>,

    /// Report file or directory. Existing reports are merged.
    #[arg(short = 'r', long)]
    report: Option<PathBuf>,

    /// Output format: csv (default), json, text
    #[arg(short = 'f', long, default_value = "csv")]
    format: String,

    /// Report columns, comma separated, or `all`
    #[arg(short = 'c', long, value_delimiter = ',')]
    columns: Vec<String>,

    /// Report the spans inside documented definitions too
    #[arg(long)]
    all: bool,

    /// Change detection store
    #[arg(long)]
    hash_file: Option<PathBuf>,

    /// Skip unchanged files documented to at least this level
    #[arg(long, value_enum, default_value_t = Level::Documented)]
    level: Level,

    /// Nesting limit per file
    #[arg(long, default_value_t = 256)]
    max_depth: usize,

    /// Per-file analysis deadline in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Exit with status 1 when a file is incomplete or cannot be analysed
    #[arg(long)]
    check: bool,

    /// Log every file
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match execute(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) {
    let directive = if verbose { "lintworm=debug" } else { "lintworm=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(directive.parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Run the whole batch. `Ok(false)` means `--check` found incomplete or
/// failed files.
fn execute(cli: &Cli) -> Result<bool> {
    let grammars = config::load_grammars(cli.grammar.as_deref())?;

    let mut filter = discover::PathFilter::new(&cli.exclude)?;
    for file in &cli.exclude_file {
        filter.extend_from_file(file)?;
    }
    let files = discover::collect(&cli.paths, &filter)?;

    let renderer = render::create_renderer(&cli.format)?;
    let columns = render::parse_columns(&cli.columns)?;

    let mut store = match &cli.hash_file {
        Some(path) => Some(HashStore::load(path)?),
        None => None,
    };

    let settings = Settings {
        max_depth: cli.max_depth,
        timeout: cli.timeout_ms.map(Duration::from_millis),
        collapse: !cli.all,
        level: cli.level,
    };
    let results = run::run(&files, &grammars, store.as_ref(), &settings);

    let mut records = Vec::new();
    let mut replaced = HashSet::new();
    for result in &results {
        match &result.status {
            Status::Analysed {
                hash,
                coverage,
                records: file_records,
            } => {
                if let Some(store) = store.as_mut() {
                    store.update(result.label.clone(), HashEntry::new(hash.clone(), coverage));
                }
                records.extend(file_records.iter().cloned());
            }
            Status::Failed(reason) => {
                records.push(Record::unanalysed(&result.label, reason.clone()));
            }
            Status::Unchanged => continue,
        }
        replaced.insert(result.label.clone());
    }

    if let (Some(store), Some(path)) = (&store, &cli.hash_file) {
        store.save(path)?;
    }

    match &cli.report {
        Some(target) => {
            let path =
                render::write_report(renderer.as_ref(), target, &columns, &records, &replaced)?;
            info!(report = %path.display(), "report written");
        }
        None => {
            let out = renderer
                .render(&columns, &records)
                .context("failed to render report")?;
            print!("{out}");
        }
    }

    let summary = Summary::of(&results);
    info!(
        analysed = summary.analysed,
        unchanged = summary.unchanged,
        failed = summary.failed,
        incomplete = summary.incomplete,
        "done"
    );
    Ok(!cli.check || (summary.incomplete == 0 && summary.failed == 0))
}
