//! Validates a search request against a model's searchable fields, falling
//! back to the model's default searchable set when the caller names none.
//!
//! Failure policy is return-empty, not hard-error: an empty (trimmed) term,
//! an explicitly named field that's unknown/non-persistent/non-searchable/
//! blocked, or a model with no default searchable fields all resolve to an
//! empty field list, which the caller treats as "no search applied" rather
//! than aborting the request.

use crate::metadata::ModelMetadata;
use crate::parsers::sanitize::is_always_blocked;
use crate::request::SearchSpec;

pub struct SearchEngineValidator;

impl SearchEngineValidator {
    /// Resolves the effective field list: the caller's explicit list,
    /// intersected with the model's searchable fields, or the model's
    /// default searchable fields if the caller named none. An empty
    /// return means no search should be applied.
    #[must_use]
    pub fn resolve_fields(model: &dyn ModelMetadata, search: &SearchSpec) -> Vec<String> {
        if search.term.trim().is_empty() {
            return Vec::new();
        }

        match &search.fields {
            Some(fields) => fields
                .iter()
                .filter(|field| Self::is_searchable(model, field))
                .cloned()
                .collect(),
            None => model.default_searchable_fields(),
        }
    }

    fn is_searchable(model: &dyn ModelMetadata, field: &str) -> bool {
        if is_always_blocked(field) {
            return false;
        }
        model.fields().get(field).is_some_and(|descriptor| {
            descriptor.is_db_field && descriptor.field_type.capability().default_searchable
        })
    }
}
