//! Two-tier mapping of detected fields to data values.

use tracing::{debug, info, warn};

use super::rules::rule_based_mapping;
use crate::collaborator::{MappingTable, SemanticMapper};
use crate::models::field::{DetectedField, FieldMapping, MappingResult, MappingStrategy};
use crate::models::value::DataRecord;

/// Maps detected fields to entries of a data record.
///
/// A semantic mapper is consulted first when one is attached; if it fails
/// the whole batch is resolved by the local rules instead.
pub struct MappingResolver {
    mapper: Option<Box<dyn SemanticMapper>>,
}

impl MappingResolver {
    /// Create a resolver with rule-based matching only.
    pub fn new() -> Self {
        Self { mapper: None }
    }

    /// Attach a semantic mapper.
    pub fn with_mapper(mut self, mapper: Box<dyn SemanticMapper>) -> Self {
        self.mapper = Some(mapper);
        self
    }

    pub fn has_mapper(&self) -> bool {
        self.mapper.is_some()
    }

    /// Resolve one entry per field, in field order.
    pub fn resolve(&self, fields: &[DetectedField], data: &DataRecord) -> MappingResult {
        let result = match self.semantic_tier(fields, data) {
            Some(result) => result,
            None => rule_based_mapping(fields, data),
        };

        info!(
            "Mapped {} of {} fields ({:?})",
            result.resolved_count(),
            result.len(),
            result.strategy
        );
        result
    }

    fn semantic_tier(&self, fields: &[DetectedField], data: &DataRecord) -> Option<MappingResult> {
        let mapper = self.mapper.as_deref()?;

        let names = distinct_names(fields);
        if names.is_empty() {
            debug!("No named fields; skipping semantic mapping");
            return None;
        }

        let keys: Vec<String> = data.keys().cloned().collect();
        let table = match mapper.map_field_names(&names, &keys) {
            Ok(table) => table,
            Err(e) => {
                warn!("Semantic mapping failed: {}. Falling back to rules", e);
                return None;
            }
        };

        log_unexpected_entries(&table, &names);

        let entries = fields
            .iter()
            .map(|field| {
                let key = field
                    .name()
                    .and_then(|name| table.get(name))
                    .and_then(|key| key.as_deref());
                FieldMapping {
                    field: field.clone(),
                    value: key
                        .and_then(|k| data.get(k))
                        .filter(|value| !value.is_null())
                        .cloned(),
                }
            })
            .collect();

        Some(MappingResult {
            strategy: MappingStrategy::Semantic,
            entries,
        })
    }
}

impl Default for MappingResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Field names in first-seen order, without repeats.
fn distinct_names(fields: &[DetectedField]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for name in fields.iter().filter_map(DetectedField::name) {
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}

fn log_unexpected_entries(table: &MappingTable, names: &[String]) {
    for name in table.keys().filter(|k| !names.contains(k)) {
        debug!("Ignoring mapping for unknown field '{}'", name);
    }

    let mut targets: Vec<&str> = table.values().filter_map(|v| v.as_deref()).collect();
    targets.sort_unstable();
    for pair in targets.windows(2).filter(|w| w[0] == w[1]) {
        debug!("Data key '{}' is targeted by several fields", pair[0]);
    }
}
