//! Rendering of detected fields and mappings.

use console::style;

use fieldfill_core::{DetectedField, FieldLocation, MappingResult, MappingStrategy};

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// CSV output
    Csv,
    /// Plain text summary
    Text,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Csv => "csv",
            Self::Text => "txt",
        }
    }
}

pub fn describe_location(location: &FieldLocation) -> String {
    match location {
        FieldLocation::Text => "text".to_string(),
        FieldLocation::Paragraph { index } => format!("paragraph {}", index),
        FieldLocation::TableCell { table, row, cell } => {
            format!("table {} row {} cell {}", table, row, cell)
        }
        FieldLocation::PdfSpan { page, span, bbox } => format!(
            "page {} span {} [{:.1}, {:.1}, {:.1}, {:.1}]",
            page, span, bbox.x0, bbox.y0, bbox.x1, bbox.y1
        ),
    }
}

pub fn strategy_label(strategy: MappingStrategy) -> &'static str {
    match strategy {
        MappingStrategy::Semantic => "semantic",
        MappingStrategy::RuleBased => "rule_based",
    }
}

pub fn format_fields(fields: &[DetectedField], format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(fields)?),
        OutputFormat::Csv => fields_csv(fields),
        OutputFormat::Text => Ok(fields_text(fields)),
    }
}

pub fn format_mapping(result: &MappingResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Csv => mapping_csv(result),
        OutputFormat::Text => Ok(mapping_text(result)),
    }
}

fn fields_csv(fields: &[DetectedField]) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record([
        "type",
        "field_name",
        "location",
        "start",
        "end",
        "text",
        "context_before",
        "context_after",
    ])?;

    for field in fields {
        wtr.write_record([
            field.field_type.as_str(),
            field.name().unwrap_or(""),
            &describe_location(&field.location),
            &field.start.to_string(),
            &field.end.to_string(),
            &field.text,
            &field.context.before,
            &field.context.after,
        ])?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn fields_text(fields: &[DetectedField]) -> String {
    let mut output = format!("Detected {} fields\n", fields.len());

    for field in fields {
        let name = match field.name() {
            Some(name) => style(name.to_string()).green(),
            None => style("(unnamed)".to_string()).dim(),
        };
        output.push_str(&format!("\n  {} {}\n", style(&field.field_type).cyan(), name));
        output.push_str(&format!(
            "    at:   {} [{}..{}]\n",
            describe_location(&field.location),
            field.start,
            field.end
        ));
        output.push_str(&format!("    text: {}\n", field.text));
    }

    output
}

fn mapping_csv(result: &MappingResult) -> anyhow::Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);

    wtr.write_record(["type", "field_name", "location", "text", "value", "strategy"])?;

    for mapping in result.iter() {
        wtr.write_record([
            mapping.field.field_type.as_str(),
            mapping.field.name().unwrap_or(""),
            &describe_location(&mapping.field.location),
            &mapping.field.text,
            &mapping.value.as_ref().map(|v| v.to_string()).unwrap_or_default(),
            strategy_label(result.strategy),
        ])?;
    }

    Ok(String::from_utf8(wtr.into_inner()?)?)
}

fn mapping_text(result: &MappingResult) -> String {
    let mut output = format!(
        "Resolved {} of {} fields ({})\n",
        result.resolved_count(),
        result.len(),
        strategy_label(result.strategy)
    );

    for mapping in result.iter() {
        let name = mapping.field.name().unwrap_or("(unnamed)");
        let value = match &mapping.value {
            Some(v) => style(v.to_string()).green(),
            None => style("-".to_string()).dim(),
        };
        output.push_str(&format!(
            "  {:<20} {:<18} {} = {}\n",
            name,
            mapping.field.field_type,
            describe_location(&mapping.field.location),
            value
        ));
    }

    output
}
