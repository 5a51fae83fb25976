//! Subcommands and the wiring they share.

pub mod batch;
pub mod config;
pub mod detect;
pub mod map;
pub mod output;
pub mod patterns;

use std::path::Path;

use anyhow::Context;
use tracing::{debug, warn};

use fieldfill_core::models::config::SemanticConfig;
use fieldfill_core::{DataRecord, FieldDetector, FieldFillConfig, MappingResolver, parse_data_record};
use fieldfill_semantic::{LlmCollaborator, OpenAiBackend};

/// Load configuration from `-c`, else the user config file, else defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<FieldFillConfig> {
    if let Some(path) = config_path {
        return FieldFillConfig::from_file(Path::new(path))
            .with_context(|| format!("Failed to read config file {}", path));
    }

    let default_path = config::default_config_path();
    if default_path.exists() {
        debug!("Using config file {}", default_path.display());
        return Ok(FieldFillConfig::from_file(&default_path)?);
    }

    Ok(FieldFillConfig::default())
}

/// Build the detector, attaching the naming collaborator when enabled.
pub fn build_detector(config: &FieldFillConfig, no_semantic: bool) -> anyhow::Result<FieldDetector> {
    let detector = FieldDetector::from_config(&config.detection)?;

    if no_semantic || !config.detection.enhance_names {
        return Ok(detector);
    }

    Ok(match collaborator(&config.semantic) {
        Some(namer) => detector.with_namer(Box::new(namer)),
        None => detector,
    })
}

/// Build the resolver, attaching the mapping collaborator when enabled.
pub fn build_resolver(config: &FieldFillConfig, no_semantic: bool) -> MappingResolver {
    let resolver = MappingResolver::new();
    if no_semantic {
        return resolver;
    }

    match collaborator(&config.semantic) {
        Some(mapper) => resolver.with_mapper(Box::new(mapper)),
        None => resolver,
    }
}

fn collaborator(config: &SemanticConfig) -> Option<LlmCollaborator<OpenAiBackend>> {
    if !config.enabled {
        return None;
    }

    match OpenAiBackend::from_config(config) {
        Ok(backend) => Some(LlmCollaborator::new(backend)),
        Err(e) => {
            warn!("Semantic collaborator disabled: {}", e);
            None
        }
    }
}

/// Read a JSON data dictionary, keeping key order.
pub fn load_data(path: &Path) -> anyhow::Result<DataRecord> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read data file {}", path.display()))?;
    parse_data_record(&json).with_context(|| format!("Data file {} is not a JSON object", path.display()))
}
