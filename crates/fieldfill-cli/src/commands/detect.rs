//! Detect command - list fillable fields in a single document.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use fieldfill_core::load_document;

use super::output::{OutputFormat, format_fields};
use super::{build_detector, load_config};

/// Arguments for the detect command.
#[derive(Args)]
pub struct DetectArgs {
    /// Input document (.docx, .pdf, .json structure or .txt)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Do not ask the semantic collaborator to name fields
    #[arg(long)]
    no_semantic: bool,
}

pub fn run(args: DetectArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Detecting fields in {}", args.input.display());

    let document = load_document(&args.input)?;
    let detector = build_detector(&config, args.no_semantic)?;
    let fields = detector.detect_loaded(&document);

    let output = format_fields(&fields, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} {} fields written to {}",
            style("✓").green(),
            fields.len(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
