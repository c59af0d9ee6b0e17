//! Validates that every parsed filter targets a field that exists, is a
//! database field, and supports the requested operator.
//!
//! Failure policy is silent-drop, not hard-error: an entry that references
//! an unknown field, a non-persistent field, an unsupported operator, or a
//! field on the always-blocked list (e.g. `password`) is dropped from the
//! result rather than aborting the request.

use crate::metadata::ModelMetadata;
use crate::parsers::sanitize::is_always_blocked;
use crate::request::FilterEntry;

pub struct FilterCriteriaValidator;

impl FilterCriteriaValidator {
    /// Returns only the filters that target a valid, filterable field with
    /// a supported operator; everything else is dropped silently.
    #[must_use]
    pub fn validate(model: &dyn ModelMetadata, filters: &[FilterEntry]) -> Vec<FilterEntry> {
        filters
            .iter()
            .filter(|entry| Self::is_valid(model, entry))
            .cloned()
            .collect()
    }

    fn is_valid(model: &dyn ModelMetadata, entry: &FilterEntry) -> bool {
        if is_always_blocked(&entry.field) {
            return false;
        }
        let Some(descriptor) = model.fields().get(&entry.field) else {
            return false;
        };
        if !descriptor.is_db_field {
            return false;
        }
        descriptor.field_type.capability().filter_ops.contains(&entry.op)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::metadata::{FieldDescriptor, FieldType};
    use crate::request::FilterValue;
    use std::collections::HashMap;

    struct TestModel(HashMap<String, FieldDescriptor>);

    impl ModelMetadata for TestModel {
        fn display_name(&self) -> &str {
            "Test"
        }
        fn table_name(&self) -> &str {
            "tests"
        }
        fn fields(&self) -> &HashMap<String, FieldDescriptor> {
            &self.0
        }
        fn role_actions(&self) -> &HashMap<String, Vec<String>> {
            unimplemented!()
        }
    }

    fn model_with(field: &str, field_type: FieldType) -> TestModel {
        let mut fields = HashMap::new();
        fields.insert(field.to_owned(), FieldDescriptor::new(field_type));
        TestModel(fields)
    }

    #[test]
    fn unknown_field_is_dropped_silently() {
        let model = model_with("name", FieldType::Text);
        let filters = vec![FilterEntry {
            field: "nope".to_owned(),
            op: crate::metadata::FilterOp::Equals,
            value: FilterValue::None,
        }];
        assert!(FilterCriteriaValidator::validate(&model, &filters).is_empty());
    }

    #[test]
    fn password_field_is_dropped_even_if_present() {
        let model = model_with("password", FieldType::Password);
        let filters = vec![FilterEntry {
            field: "password".to_owned(),
            op: crate::metadata::FilterOp::Equals,
            value: FilterValue::None,
        }];
        assert!(FilterCriteriaValidator::validate(&model, &filters).is_empty());
    }

    #[test]
    fn unsupported_operator_on_type_is_dropped() {
        let model = model_with("age", FieldType::Integer);
        let filters = vec![FilterEntry {
            field: "age".to_owned(),
            op: crate::metadata::FilterOp::Contains,
            value: FilterValue::None,
        }];
        assert!(FilterCriteriaValidator::validate(&model, &filters).is_empty());
    }

    #[test]
    fn valid_filter_passes() {
        let model = model_with("age", FieldType::Integer);
        let filters = vec![FilterEntry {
            field: "age".to_owned(),
            op: crate::metadata::FilterOp::GreaterThan,
            value: FilterValue::Scalar(serde_json::json!(21)),
        }];
        assert_eq!(FilterCriteriaValidator::validate(&model, &filters).len(), 1);
    }

    #[test]
    fn non_db_field_is_dropped() {
        let mut fields = HashMap::new();
        fields.insert(
            "computed".to_owned(),
            FieldDescriptor::new(FieldType::Text).non_persistent(),
        );
        let model = TestModel(fields);
        let filters = vec![FilterEntry {
            field: "computed".to_owned(),
            op: crate::metadata::FilterOp::Equals,
            value: FilterValue::None,
        }];
        assert!(FilterCriteriaValidator::validate(&model, &filters).is_empty());
    }

    #[test]
    fn one_bad_entry_does_not_drop_the_rest() {
        let model = model_with("age", FieldType::Integer);
        let filters = vec![
            FilterEntry {
                field: "age".to_owned(),
                op: crate::metadata::FilterOp::GreaterThan,
                value: FilterValue::Scalar(serde_json::json!(21)),
            },
            FilterEntry {
                field: "password".to_owned(),
                op: crate::metadata::FilterOp::Equals,
                value: FilterValue::None,
            },
        ];
        let kept = FilterCriteriaValidator::validate(&model, &filters);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].field, "age");
    }
}
