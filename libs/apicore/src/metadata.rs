//! Collaborator contracts consumed from the (out-of-scope) metadata engine
//! and model factory, plus a static, data-driven field-capability table.
//!
//! None of this owns persistence or schema generation; it only describes
//! the shape the pipeline needs in order to validate filters/search and
//! drive RBAC component derivation.

use std::collections::HashMap;
use std::sync::Arc;

use crate::route::RouteDeclaration;

/// Closed set of field type tags. Each tag carries a fixed capability set
/// (see [`FieldType::capability`]) rather than per-field-class operator
/// lists scattered across call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum FieldType {
    Text,
    BigText,
    Integer,
    Float,
    Boolean,
    Date,
    DateTime,
    Enum,
    Email,
    Password,
    Id,
    Image,
}

/// Filter operators the pipeline understands. Parsers normalize dialect-
/// specific operator spellings down to this set before filters reach the
/// validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOp {
    Equals,
    NotEquals,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
    Contains,
    StartsWith,
    EndsWith,
    In,
    Between,
    IsNull,
    IsNotNull,
}

/// Search operators; a strict subset of [`FilterOp`]'s text-ish members.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchOp {
    Contains,
    StartsWith,
    EndsWith,
    Equals,
}

/// What a field type supports: which filter/search operators are legal,
/// and whether the type is searchable by default.
#[derive(Debug, Clone)]
pub struct FieldCapability {
    pub filter_ops: &'static [FilterOp],
    pub search_ops: &'static [SearchOp],
    pub default_searchable: bool,
}

impl FieldType {
    /// The capability set for this type. A single, central, data-driven
    /// table — consumed by both the filter/search validators and (outside
    /// this crate's scope) the OpenAPI emitter.
    #[must_use]
    pub fn capability(self) -> FieldCapability {
        use FilterOp::{
            Between, Contains, EndsWith, Equals, GreaterThan, GreaterThanOrEqual, In, IsNotNull,
            IsNull, LessThan, LessThanOrEqual, NotEquals, StartsWith,
        };

        match self {
            FieldType::Text | FieldType::BigText | FieldType::Email => FieldCapability {
                filter_ops: &[
                    Equals, NotEquals, Contains, StartsWith, EndsWith, In, IsNull, IsNotNull,
                ],
                search_ops: &[
                    SearchOp::Contains,
                    SearchOp::StartsWith,
                    SearchOp::EndsWith,
                    SearchOp::Equals,
                ],
                default_searchable: true,
            },
            FieldType::Integer | FieldType::Float => FieldCapability {
                filter_ops: &[
                    Equals,
                    NotEquals,
                    GreaterThan,
                    GreaterThanOrEqual,
                    LessThan,
                    LessThanOrEqual,
                    In,
                    Between,
                    IsNull,
                    IsNotNull,
                ],
                search_ops: &[],
                default_searchable: false,
            },
            FieldType::Date | FieldType::DateTime => FieldCapability {
                filter_ops: &[
                    Equals,
                    NotEquals,
                    GreaterThan,
                    GreaterThanOrEqual,
                    LessThan,
                    LessThanOrEqual,
                    Between,
                    IsNull,
                    IsNotNull,
                ],
                search_ops: &[],
                default_searchable: false,
            },
            FieldType::Enum => FieldCapability {
                filter_ops: &[Equals, NotEquals, In, IsNull, IsNotNull],
                search_ops: &[SearchOp::Equals],
                default_searchable: false,
            },
            FieldType::Boolean => FieldCapability {
                filter_ops: &[Equals, NotEquals, IsNull, IsNotNull],
                search_ops: &[],
                default_searchable: false,
            },
            FieldType::Id => FieldCapability {
                filter_ops: &[Equals, NotEquals, In, IsNull, IsNotNull],
                search_ops: &[],
                default_searchable: false,
            },
            // Password never participates in filtering or search.
            FieldType::Password | FieldType::Image => FieldCapability {
                filter_ops: &[],
                search_ops: &[],
                default_searchable: false,
            },
        }
    }

    #[must_use]
    pub fn is_secret_or_binary(self) -> bool {
        matches!(self, FieldType::Password | FieldType::Image)
    }
}

/// Per-field metadata as consumed from the external metadata engine.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub field_type: FieldType,
    pub is_db_field: bool,
    pub options: Option<Vec<String>>,
    pub description: Option<String>,
}

impl FieldDescriptor {
    #[must_use]
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            is_db_field: true,
            options: None,
            description: None,
        }
    }

    #[must_use]
    pub fn non_persistent(mut self) -> Self {
        self.is_db_field = false;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Object-safe boundary the core consumes from the (out-of-scope) metadata
/// engine and model factory. A real deployment implements this against its
/// schema store; tests and demos implement it in-memory.
pub trait ModelMetadata: Send + Sync {
    fn display_name(&self) -> &str;
    fn table_name(&self) -> &str;
    fn fields(&self) -> &HashMap<String, FieldDescriptor>;
    /// role name -> list of action names, or `["*"]` for all actions.
    fn role_actions(&self) -> &HashMap<String, Vec<String>>;
    /// Fields considered searchable by default when the caller supplies no
    /// explicit search field list.
    fn default_searchable_fields(&self) -> Vec<String> {
        self.fields()
            .iter()
            .filter(|(_, f)| f.is_db_field && f.field_type.capability().default_searchable)
            .map(|(name, _)| name.clone())
            .collect()
    }
    /// Routes this model declares for the registry to pick up automatically
    /// at discovery time, on top of whatever explicit controllers register.
    /// Empty by default — plenty of models are exposed purely through a
    /// hand-written `RouteSource`.
    fn api_routes(&self) -> Vec<RouteDeclaration> {
        Vec::new()
    }
}

/// Stand-in for the external metadata engine: an in-memory catalog of
/// models by name. Never issues SQL; it is not a persistence layer.
#[derive(Clone, Default)]
pub struct ModelCatalog {
    models: HashMap<String, Arc<dyn ModelMetadata>>,
}

impl ModelCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, model: Arc<dyn ModelMetadata>) {
        self.models.insert(name.into(), model);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn ModelMetadata>> {
        self.models.get(name).cloned()
    }

    #[must_use]
    pub fn available_models(&self) -> Vec<String> {
        let mut names: Vec<String> = self.models.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn password_has_no_filter_or_search_ops() {
        let cap = FieldType::Password.capability();
        assert!(cap.filter_ops.is_empty());
        assert!(cap.search_ops.is_empty());
        assert!(!cap.default_searchable);
    }

    #[test]
    fn text_is_default_searchable() {
        assert!(FieldType::Text.capability().default_searchable);
        assert!(!FieldType::Integer.capability().default_searchable);
    }

    #[test]
    fn is_secret_or_binary_flags_password_and_image() {
        assert!(FieldType::Password.is_secret_or_binary());
        assert!(FieldType::Image.is_secret_or_binary());
        assert!(!FieldType::Text.is_secret_or_binary());
    }

    struct DummyModel {
        fields: HashMap<String, FieldDescriptor>,
        roles: HashMap<String, Vec<String>>,
    }

    impl ModelMetadata for DummyModel {
        fn display_name(&self) -> &str {
            "Dummy"
        }
        fn table_name(&self) -> &str {
            "dummies"
        }
        fn fields(&self) -> &HashMap<String, FieldDescriptor> {
            &self.fields
        }
        fn role_actions(&self) -> &HashMap<String, Vec<String>> {
            &self.roles
        }
    }

    #[test]
    fn default_searchable_fields_excludes_password_and_non_db() {
        let mut fields = HashMap::new();
        fields.insert("name".to_owned(), FieldDescriptor::new(FieldType::Text));
        fields.insert(
            "password".to_owned(),
            FieldDescriptor::new(FieldType::Password),
        );
        fields.insert(
            "computed".to_owned(),
            FieldDescriptor::new(FieldType::Text).non_persistent(),
        );
        let model = DummyModel {
            fields,
            roles: HashMap::new(),
        };

        let searchable = model.default_searchable_fields();
        assert_eq!(searchable, vec!["name".to_owned()]);
    }

    #[test]
    fn catalog_register_and_get() {
        let mut catalog = ModelCatalog::new();
        let model = Arc::new(DummyModel {
            fields: HashMap::new(),
            roles: HashMap::new(),
        });
        catalog.register("Dummy", model);

        assert!(catalog.get("Dummy").is_some());
        assert!(catalog.get("Missing").is_none());
        assert_eq!(catalog.available_models(), vec!["Dummy".to_owned()]);
    }
}
