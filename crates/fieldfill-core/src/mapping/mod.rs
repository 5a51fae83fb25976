//! Mapping of detected fields to user data.

mod resolver;
pub mod rules;

pub use resolver::MappingResolver;
pub use rules::{fields_similar, rule_based_mapping};
