//! Map command - detect fields and resolve them against a data file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::{debug, info};

use fieldfill_core::load_document;

use super::output::{OutputFormat, format_mapping, strategy_label};
use super::{build_detector, build_resolver, load_config, load_data};

/// Arguments for the map command.
#[derive(Args)]
pub struct MapArgs {
    /// Input document (.docx, .pdf, .json structure or .txt)
    #[arg(required = true)]
    input: PathBuf,

    /// JSON object with the values to fill in
    #[arg(short, long, required = true)]
    data: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Use rule-based matching only
    #[arg(long)]
    no_semantic: bool,
}

pub fn run(args: MapArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    let data = load_data(&args.data)?;
    info!(
        "Mapping {} against {} data keys",
        args.input.display(),
        data.len()
    );

    let document = load_document(&args.input)?;
    let fields = build_detector(&config, args.no_semantic)?.detect_loaded(&document);
    let resolver = build_resolver(&config, args.no_semantic);
    debug!(
        "Resolving {} fields with {}",
        fields.len(),
        if resolver.has_mapper() { "semantic mapping" } else { "rules only" }
    );
    let result = resolver.resolve(&fields, &data);

    let output = format_mapping(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Resolved {} of {} fields ({}), written to {}",
            style("✓").green(),
            result.resolved_count(),
            result.len(),
            strategy_label(result.strategy),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    debug!("Total processing time: {:?}", start.elapsed());

    Ok(())
}
