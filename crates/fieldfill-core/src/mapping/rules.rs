//! Rule-based field-to-key matching.

use crate::models::field::{DetectedField, FieldMapping, MappingResult, MappingStrategy};
use crate::models::value::{DataRecord, DataValue};

/// Resolve every field against `data` by exact or similar key.
///
/// A key holding `null` leaves its field unresolved.
pub fn rule_based_mapping(fields: &[DetectedField], data: &DataRecord) -> MappingResult {
    let entries = fields
        .iter()
        .map(|field| FieldMapping {
            field: field.clone(),
            value: field
                .name()
                .and_then(|name| lookup(name, data))
                .filter(|value| !value.is_null())
                .cloned(),
        })
        .collect();

    MappingResult {
        strategy: MappingStrategy::RuleBased,
        entries,
    }
}

/// Exact key first, then the first similar key in dictionary order.
pub fn lookup<'d>(field_name: &str, data: &'d DataRecord) -> Option<&'d DataValue> {
    if let Some(value) = data.get(field_name) {
        return Some(value);
    }

    data.iter()
        .find(|(key, _)| fields_similar(field_name, key))
        .map(|(_, value)| value)
}

/// Whether two names match once underscores, hyphens and case are ignored,
/// either being allowed to contain the other.
pub fn fields_similar(a: &str, b: &str) -> bool {
    let a = normalize(a);
    let b = normalize(b);
    a.contains(&b) || b.contains(&a)
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect::<String>()
        .to_lowercase()
}
