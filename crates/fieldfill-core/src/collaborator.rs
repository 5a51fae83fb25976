//! Contracts for optional semantic collaborators.
//!
//! Both collaborators are treated as unreliable: every error they return is
//! absorbed by the engine, which then falls back to its own rules.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::CollaboratorError;

/// Field name to data key (or `None` for "no good match").
pub type MappingTable = HashMap<String, Option<String>>;

/// Resolves detected field names to data keys.
pub trait SemanticMapper: Send + Sync {
    /// Map each field name to one of `data_keys`, or to `None`.
    fn map_field_names(
        &self,
        field_names: &[String],
        data_keys: &[String],
    ) -> Result<MappingTable, CollaboratorError>;
}

/// A field the local rules could not name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamingRequest {
    /// Pattern that matched.
    pub field_type: String,
    /// Matched text.
    pub text: String,
    /// Text before the match.
    pub context_before: String,
    /// Text after the match.
    pub context_after: String,
}

/// Proposes names for fields the local rules left unresolved.
pub trait FieldNamer: Send + Sync {
    /// Return one candidate per request, in request order.
    fn infer_field_names(
        &self,
        requests: &[NamingRequest],
    ) -> Result<Vec<Option<String>>, CollaboratorError>;
}
