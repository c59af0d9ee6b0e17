//! Bootstrap binary: loads configuration, builds a route registry and
//! authorization gate from a small in-process demo catalog, and serves the
//! pipeline over HTTP until interrupted.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clap::Parser;
use figment::Figment;
use figment::providers::{Env, Format, Yaml};
use rm_apicore::authz::{AuthorizationGate, PermissionTable, TrustCallerRoles};
use rm_apicore::metadata::{FieldDescriptor, FieldType, ModelCatalog, ModelMetadata};
use rm_apicore::router::{Handler, RequestContext};
use rm_apicore::{
    HttpMethod, PipelineError, ResponseFormatter, ResultSet, Router as PipelineRouter, RouteDeclaration,
    RouteRegistry, RouteSource,
};
use rm_http_gateway::auth::AuthnError;
use rm_http_gateway::{ApiGatewayConfig, AuthnClient, GatewayHost};
use rm_security::Caller;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(name = "meridian-server", about = "Meridian REST request-resolution pipeline")]
struct Cli {
    /// Path to a YAML configuration file. Environment variables prefixed
    /// with `MERIDIAN_` override any value it sets.
    #[arg(long, default_value = "config.yaml")]
    config: String,
}

/// Demo "Users" component: in-memory field metadata, no persistence.
struct UsersModel {
    fields: HashMap<String, FieldDescriptor>,
    role_actions: HashMap<String, Vec<String>>,
}

impl UsersModel {
    fn new() -> Self {
        let mut fields = HashMap::new();
        fields.insert("id".to_owned(), FieldDescriptor::new(FieldType::Id));
        fields.insert("name".to_owned(), FieldDescriptor::new(FieldType::Text));
        fields.insert("email".to_owned(), FieldDescriptor::new(FieldType::Email));
        fields.insert(
            "password".to_owned(),
            FieldDescriptor::new(FieldType::Password),
        );

        let mut role_actions = HashMap::new();
        role_actions.insert("admin".to_owned(), vec!["*".to_owned()]);
        role_actions.insert("viewer".to_owned(), vec!["read".to_owned()]);

        Self { fields, role_actions }
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
        &self.role_actions
    }
}

struct UsersController;

impl RouteSource for UsersController {
    fn routes(&self) -> Vec<RouteDeclaration> {
        vec![
            RouteDeclaration::new(HttpMethod::Get, "/Users/?")
                .component("Users")
                .param_name("id"),
            RouteDeclaration::new(HttpMethod::Post, "/Users/?").component("Users"),
            RouteDeclaration::new(HttpMethod::Delete, "/Users/?")
                .component("Users")
                .rbac_action("delete")
                .param_name("id"),
        ]
    }
}

/// Flat `(component, action, role)` permission table matching
/// `UsersModel::role_actions`: `admin` holds every action, `viewer` holds
/// only `read`, and the `system` role (injected when auth is disabled)
/// holds everything.
struct RoleActionTable {
    catalog: Arc<ModelCatalog>,
}

impl PermissionTable for RoleActionTable {
    fn allows(&self, component: &str, action: &str, role: &str) -> bool {
        if role == "system" {
            return true;
        }
        let Some(model) = self.catalog.get(component) else {
            return false;
        };
        model
            .role_actions()
            .get(role)
            .is_some_and(|actions| actions.iter().any(|a| a == "*" || a == action))
    }
}

/// Echoes the resolved route and parsed request back as a single-item
/// result set, rendered in whichever dialect the caller asked for via
/// `responseFormat`/`format`. A real deployment replaces this with a model
/// factory / database connector; this crate owns request resolution, not
/// persistence.
struct DemoHandler;

#[async_trait]
impl Handler for DemoHandler {
    async fn handle(&self, ctx: RequestContext<'_>) -> Result<serde_json::Value, PipelineError> {
        let echo = serde_json::json!({
            "component": ctx.route.component,
            "path": ctx.route.path,
            "params": ctx.params,
            "filters": ctx.parsed.filters.len(),
        });
        let result = ResultSet {
            items: vec![echo],
            total: 1,
            pagination: ctx.parsed.pagination,
        };
        Ok(ResponseFormatter::format(ctx.parsed.meta.response_dialect, &result))
    }
}

/// Trusts any non-empty bearer token and grants the `viewer` role. Stands
/// in for a real authentication service in this bootstrap; production
/// deployments implement `AuthnClient` against their own token issuer.
struct DemoAuthnClient;

#[async_trait]
impl AuthnClient for DemoAuthnClient {
    async fn authenticate(&self, token: &str) -> Result<Caller, AuthnError> {
        if token.is_empty() {
            return Err(AuthnError::Unauthorized("empty token".to_owned()));
        }
        Ok(Caller::builder()
            .roles(vec!["viewer".to_owned()])
            .credential(token.to_owned())
            .build())
    }
}

fn load_config(path: &str) -> Result<ApiGatewayConfig> {
    Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed("MERIDIAN_"))
        .extract()
        .with_context(|| format!("failed to load configuration from {path}"))
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = load_config(&cli.config).unwrap_or_else(|err| {
        tracing::warn!(%err, "falling back to default configuration");
        ApiGatewayConfig {
            bind_addr: "127.0.0.1:8080".to_owned(),
            ..ApiGatewayConfig::default()
        }
    });

    let mut catalog = ModelCatalog::new();
    catalog.register("Users", Arc::new(UsersModel::new()));
    let catalog = Arc::new(catalog);

    let controllers: Vec<Box<dyn RouteSource>> = vec![Box::new(UsersController)];
    let registry = Arc::new(RouteRegistry::build(&controllers, &catalog)?);

    let gate = AuthorizationGate::new(
        RoleActionTable {
            catalog: Arc::clone(&catalog),
        },
        TrustCallerRoles,
    );
    let pipeline = PipelineRouter::new(registry, catalog, gate);

    let authn_client: Option<Arc<dyn AuthnClient>> = if config.auth_disabled {
        None
    } else {
        Some(Arc::new(DemoAuthnClient))
    };

    let host = Arc::new(GatewayHost::new(config, pipeline, Arc::new(DemoHandler), authn_client));

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        signal_cancel.cancel();
    });

    host.serve(cancel).await
}
