//! Patterns command - list the active field catalog.

use console::style;

use fieldfill_core::PatternKind;

use super::{build_detector, load_config};

pub fn run(config_path: Option<&str>) -> anyhow::Result<()> {
    let config = load_config(config_path)?;
    let detector = build_detector(&config, true)?;

    println!("{}", style("Active field patterns:").bold());
    println!();

    for pattern in detector.catalog() {
        let kind = match pattern.kind() {
            PatternKind::Positional => "positional".to_string(),
            PatternKind::Syntactic => "syntactic".to_string(),
            PatternKind::Marker { field_name } => format!("marker -> {}", field_name),
        };
        println!(
            "  {:<22} {:<28} {}",
            style(pattern.name()).cyan(),
            kind,
            pattern.regex().as_str()
        );
    }

    println!();
    println!("{} patterns", detector.catalog().len());

    Ok(())
}
