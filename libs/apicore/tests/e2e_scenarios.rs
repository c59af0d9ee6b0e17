//! The six end-to-end scenarios the pipeline must demonstrably satisfy:
//! literal-beats-wildcard scoring, AG-Grid pagination, MUI's page-index
//! conversion to 1-based, the simple dialect's unknown-key-becomes-filter
//! behavior, password fields never becoming filters, and a fail-secure
//! RBAC denial that reports the action/component the caller was missing.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rm_apicore::authz::{AuthorizationGate, PermissionTable, TrustCallerRoles};
use rm_apicore::metadata::{FieldDescriptor, FieldType, ModelCatalog, ModelMetadata};
use rm_apicore::parsers::parse_request;
use rm_apicore::request::RawQuery;
use rm_apicore::router::{Handler, RequestContext};
use rm_apicore::{HttpMethod, PipelineError, Route, RouteDeclaration, RouteRegistry, RouteSource, Router};
use rm_security::Caller;
use tokio_util::sync::CancellationToken;

struct UsersController;

impl RouteSource for UsersController {
    fn routes(&self) -> Vec<RouteDeclaration> {
        vec![
            RouteDeclaration::new(HttpMethod::Get, "/Users/?")
                .component("Users")
                .param_name("id"),
            RouteDeclaration::new(HttpMethod::Get, "/Users/123")
                .component("Users")
                .rbac_action("read_admin"),
            RouteDeclaration::new(HttpMethod::Delete, "/Users/?")
                .component("Users")
                .rbac_action("delete")
                .param_name("id"),
        ]
    }
}

struct UsersModel {
    fields: HashMap<String, FieldDescriptor>,
    roles: HashMap<String, Vec<String>>,
}

impl UsersModel {
    fn new() -> Self {
        let mut fields = HashMap::new();
        fields.insert("name".to_owned(), FieldDescriptor::new(FieldType::Text));
        fields.insert(
            "status".to_owned(),
            FieldDescriptor::new(FieldType::Enum).with_options(vec!["active".to_owned(), "inactive".to_owned()]),
        );
        fields.insert(
            "password".to_owned(),
            FieldDescriptor::new(FieldType::Password),
        );
        Self {
            fields,
            roles: HashMap::new(),
        }
    }
}

impl ModelMetadata for UsersModel {
    fn display_name(&self) -> &str {
        "Users"
    }
    fn table_name(&self) -> &str {
        "users"
    }
    fn fields(&self) -> &HashMap<String, FieldDescriptor> {
        &self.fields
    }
    fn role_actions(&self) -> &HashMap<String, Vec<String>> {
        &self.roles
    }
}

struct ViewerOnly;
impl PermissionTable for ViewerOnly {
    fn allows(&self, component: &str, action: &str, role: &str) -> bool {
        component == "Users" && action == "read" && role == "viewer"
    }
}

struct EchoHandler;
#[async_trait]
impl Handler for EchoHandler {
    async fn handle(&self, ctx: RequestContext<'_>) -> Result<serde_json::Value, PipelineError> {
        Ok(serde_json::json!({
            "route": ctx.route.path,
            "params": ctx.params,
            "filters": ctx.parsed.filters.len(),
        }))
    }
}

fn build_router() -> Router<ViewerOnly, TrustCallerRoles> {
    let controllers: Vec<Box<dyn RouteSource>> = vec![Box::new(UsersController)];
    let mut catalog = ModelCatalog::new();
    catalog.register("Users", Arc::new(UsersModel::new()));
    let catalog = Arc::new(catalog);
    let registry = Arc::new(RouteRegistry::build(&controllers, &catalog).unwrap());
    let gate = AuthorizationGate::new(ViewerOnly, TrustCallerRoles);
    Router::new(registry, catalog, gate)
}

fn query_with(pairs: &[(&str, &str)]) -> RawQuery {
    let mut query: RawQuery = HashMap::new();
    for (k, v) in pairs {
        query.insert((*k).to_owned(), vec![(*v).to_owned()]);
    }
    query
}

#[tokio::test]
async fn scenario_literal_path_beats_wildcard_path() {
    let controllers: Vec<Box<dyn RouteSource>> = vec![Box::new(UsersController)];
    let catalog = ModelCatalog::new();
    let registry = RouteRegistry::build(&controllers, &catalog).unwrap();

    let matched = registry.find(HttpMethod::Get, &["Users", "123"]).unwrap();
    assert_eq!(matched.path, "/Users/123");
}

#[tokio::test]
async fn scenario_ag_grid_start_end_row_becomes_page_and_size() {
    let query = query_with(&[("startRow", "40"), ("endRow", "60")]);
    let parsed = parse_request(&query).unwrap();
    assert_eq!(parsed.meta.dialect, "ag-grid");
    assert_eq!(parsed.pagination.page, 3);
    assert_eq!(parsed.pagination.page_size, 20);
}

#[tokio::test]
async fn scenario_mui_page_converts_to_one_based() {
    let query = query_with(&[("page", "0"), ("pageSize", "10"), ("sortModel", "[]")]);
    let parsed = parse_request(&query).unwrap();
    assert_eq!(parsed.meta.dialect, "mui-datagrid");
    assert_eq!(parsed.pagination.page, 1);
    assert_eq!(parsed.pagination.page_size, 10);
}

#[tokio::test]
async fn scenario_simple_dialect_turns_unknown_key_into_equality_filter() {
    let query = query_with(&[("status", "active")]);
    let parsed = parse_request(&query).unwrap();
    assert_eq!(parsed.meta.dialect, "simple");
    assert_eq!(parsed.filters.len(), 1);
    assert_eq!(parsed.filters[0].field, "status");
}

#[tokio::test]
async fn scenario_password_query_key_is_dropped_not_turned_into_a_filter() {
    let query = query_with(&[("password", "hunter2"), ("name", "alice")]);
    let parsed = parse_request(&query).unwrap();
    assert_eq!(parsed.filters.len(), 1);
    assert_eq!(parsed.filters[0].field, "name");
}

#[tokio::test]
async fn scenario_rbac_denial_reports_required_action_and_component() {
    let router = build_router();
    let query = HashMap::new();
    let caller = Caller::builder()
        .roles(vec!["viewer".to_owned()])
        .credential("tok".to_owned())
        .build();

    let err = router
        .dispatch(
            HttpMethod::Delete,
            "/Users/1",
            &query,
            caller,
            CancellationToken::new(),
            &EchoHandler,
        )
        .await
        .unwrap_err();

    let envelope = err.envelope(true, chrono::Utc::now());
    assert_eq!(envelope.status, 403);
    let context = envelope.error.context.unwrap();
    assert_eq!(context["required_action"], "delete");
    assert_eq!(context["component"], "Users");
}

#[tokio::test]
async fn allowed_read_request_reaches_the_handler() {
    let router = build_router();
    let query = HashMap::new();
    let caller = Caller::builder()
        .roles(vec!["viewer".to_owned()])
        .credential("tok".to_owned())
        .build();

    let result = router
        .dispatch(
            HttpMethod::Get,
            "/Users/1",
            &query,
            caller,
            CancellationToken::new(),
            &EchoHandler,
        )
        .await
        .unwrap();

    assert_eq!(result["route"], "/Users/?");
}
