//! CLI application for fillable-field detection and data mapping.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, config, detect, map, patterns};

/// Find fillable fields in documents and match them to your data
#[derive(Parser)]
#[command(name = "fieldfill")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect fillable fields in a document
    Detect(detect::DetectArgs),

    /// Detect fields and map them to a data file
    Map(map::MapArgs),

    /// Map fields in multiple documents
    Batch(batch::BatchArgs),

    /// List the active field patterns
    Patterns,

    /// Manage configuration
    Config(config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    let config_path = cli.config.as_deref();
    match cli.command {
        Commands::Detect(args) => detect::run(args, config_path),
        Commands::Map(args) => map::run(args, config_path),
        Commands::Batch(args) => batch::run(args, config_path),
        Commands::Patterns => patterns::run(config_path),
        Commands::Config(args) => config::run(args, config_path),
    }
}
