//! Batch command - map fields in multiple documents.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::Local;
use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, error, warn};

use fieldfill_core::{
    DataRecord, DocumentKind, FieldDetector, MappingResolver, MappingResult, load_document,
};

use super::output::{OutputFormat, format_mapping, strategy_label};
use super::{build_detector, build_resolver, load_config, load_data};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// JSON object with the values to fill in
    #[arg(short, long, required = true)]
    data: PathBuf,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Also generate a summary CSV
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,

    /// Use rule-based matching only
    #[arg(long)]
    no_semantic: bool,
}

/// Result of processing a single file.
struct ProcessResult {
    path: PathBuf,
    mapping: Option<MappingResult>,
    error: Option<String>,
}

/// Per-file JSON output.
#[derive(Serialize)]
struct MappingReport<'a> {
    source: String,
    processed_at: String,
    #[serde(flatten)]
    result: &'a MappingResult,
}

pub fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let data = load_data(&args.data)?;

    // Expand glob pattern, keeping supported documents only
    let files: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| DocumentKind::from_path(p).is_ok())
        .collect();

    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let detector = build_detector(&config, args.no_semantic)?;
    let resolver = build_resolver(&config, args.no_semantic);
    let mut results = Vec::with_capacity(files.len());

    for path in files {
        match process_single_file(&path, &detector, &resolver, &data) {
            Ok(mapping) => {
                if let Some(output_dir) = &args.output_dir {
                    write_output(output_dir, &path, &mapping, args.format)?;
                }
                results.push(ProcessResult {
                    path,
                    mapping: Some(mapping),
                    error: None,
                });
            }
            Err(e) => {
                let error_msg = e.to_string();
                if args.continue_on_error {
                    warn!("Failed to process {}: {}", path.display(), error_msg);
                    results.push(ProcessResult {
                        path,
                        mapping: None,
                        error: Some(error_msg),
                    });
                } else {
                    pb.abandon();
                    error!("Failed to process {}: {}", path.display(), error_msg);
                    anyhow::bail!("Processing failed for {}: {}", path.display(), error_msg);
                }
            }
        }

        pb.inc(1);
    }

    pb.finish_and_clear();

    if args.summary {
        let summary_path = args
            .output_dir
            .as_ref()
            .map(|d| d.join("summary.csv"))
            .unwrap_or_else(|| PathBuf::from("summary.csv"));

        write_summary(&summary_path, &results)?;
        println!(
            "{} Summary written to {}",
            style("✓").green(),
            summary_path.display()
        );
    }

    let failed: Vec<&ProcessResult> = results.iter().filter(|r| r.error.is_some()).collect();

    println!();
    println!(
        "{} Processed {} files in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} successful, {} failed",
        style(results.len() - failed.len()).green(),
        style(failed.len()).red()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed files:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn process_single_file(
    path: &Path,
    detector: &FieldDetector,
    resolver: &MappingResolver,
    data: &DataRecord,
) -> anyhow::Result<MappingResult> {
    let document = load_document(path)?;
    let fields = detector.detect_loaded(&document);
    Ok(resolver.resolve(&fields, data))
}

fn write_output(
    output_dir: &Path,
    source: &Path,
    mapping: &MappingResult,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let output_path = output_dir.join(output_name(source, format));

    let content = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&MappingReport {
            source: source.display().to_string(),
            processed_at: Local::now().to_rfc3339(),
            result: mapping,
        })?,
        other => format_mapping(mapping, other)?,
    };

    fs::write(&output_path, content)?;
    debug!("Wrote output to {}", output_path.display());
    Ok(())
}

/// Output file name for `source`: its full file name plus the format extension.
///
/// Keeping the source extension stops `a.txt` and `a.json` from sharing a report.
fn output_name(source: &Path, format: OutputFormat) -> String {
    let name = source
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    format!("{}.{}", name, format.extension())
}

fn write_summary(path: &Path, results: &[ProcessResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record(["file", "fields", "resolved", "strategy", "error"])?;

    for result in results {
        let filename = result
            .path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("");

        match &result.mapping {
            Some(mapping) => wtr.write_record([
                filename,
                &mapping.len().to_string(),
                &mapping.resolved_count().to_string(),
                strategy_label(mapping.strategy),
                "",
            ])?,
            None => wtr.write_record([
                filename,
                "",
                "",
                "",
                result.error.as_deref().unwrap_or(""),
            ])?,
        }
    }

    wtr.flush()?;
    Ok(())
}
