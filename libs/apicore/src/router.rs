//! The orchestrator: resolves a route, parses and validates the query,
//! authorizes the caller, invokes the handler, and formats the response —
//! the ten-step pipeline the rest of the crate's modules feed into.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use rm_security::Caller;
use tokio_util::sync::CancellationToken;

use crate::authz::{AuthorizationGate, PermissionTable, UserDirectory};
use crate::error::PipelineError;
use crate::metadata::ModelCatalog;
use crate::parsers::parse_request;
use crate::registry::RouteRegistry;
use crate::request::{ParsedRequest, RawQuery};
use crate::route::Route;
use crate::validate::{FilterCriteriaValidator, SearchEngineValidator};

/// Everything a handler needs: the matched route, the parsed/validated
/// request, path parameters merged with query parameters (query wins on a
/// name collision), the caller, and a deadline the handler should respect.
pub struct RequestContext<'a> {
    pub route: &'a Route,
    pub parsed: ParsedRequest,
    pub params: HashMap<String, String>,
    pub caller: Caller,
    pub cancellation: CancellationToken,
}

/// Implemented by whatever ultimately produces a response body — the
/// model factory / database connector in a full deployment, an in-memory
/// fixture in tests.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: RequestContext<'_>) -> Result<serde_json::Value, PipelineError>;
}

pub struct Router<P, D> {
    registry: Arc<RouteRegistry>,
    catalog: Arc<ModelCatalog>,
    gate: AuthorizationGate<P, D>,
}

impl<P, D> Router<P, D>
where
    P: PermissionTable,
    D: UserDirectory,
{
    pub fn new(registry: Arc<RouteRegistry>, catalog: Arc<ModelCatalog>, gate: AuthorizationGate<P, D>) -> Self {
        Self {
            registry,
            catalog,
            gate,
        }
    }

    /// Runs the full resolution pipeline for one inbound request.
    ///
    /// # Errors
    /// Any `PipelineError` variant raised by route lookup, parsing,
    /// validation, authorization, cancellation, or the handler itself.
    #[allow(clippy::too_many_arguments)]
    pub async fn dispatch(
        &self,
        method: crate::route::HttpMethod,
        path: &str,
        query: &RawQuery,
        caller: Caller,
        cancellation: CancellationToken,
        handler: &dyn Handler,
    ) -> Result<serde_json::Value, PipelineError> {
        // 1. Resolve the route.
        let components: Vec<&str> = path.split('/').filter(|c| !c.is_empty()).collect();
        let route = self.registry.find(method, &components).ok_or_else(|| {
            PipelineError::RouteNotFound {
                method: method.to_string(),
                path: path.to_owned(),
            }
        })?;

        tracing::debug!(path, method = %method, score_path = %route.path, "route resolved");

        // 2. Parse the query string per dialect, priority-ordered.
        let mut parsed = parse_request(query)?;

        // 3. Merge path parameters with query parameters; query wins.
        let mut params = extract_path_params(route, &components);
        for (k, v) in query {
            if let Some(value) = v.first() {
                params.insert(k.clone(), value.clone());
            }
        }

        // 4-5. Validate filters and search against the owning model, when
        // one is registered (routes with no model backing, e.g. health
        // checks, skip model-aware validation entirely). Invalid filter
        // entries and unresolvable search fields are dropped silently
        // rather than aborting the request.
        if let Some(model) = self.catalog.get(&route.component) {
            parsed.filters = FilterCriteriaValidator::validate(model.as_ref(), &parsed.filters);
            parsed.search = parsed.search.take().and_then(|search| {
                let fields = SearchEngineValidator::resolve_fields(model.as_ref(), &search);
                if fields.is_empty() {
                    None
                } else {
                    Some(crate::request::SearchSpec {
                        term: search.term,
                        fields: Some(fields),
                    })
                }
            });
        }

        // 6. Authorize.
        self.gate.authorize(route, &caller).await?;

        // 7. Check cancellation before doing any real work.
        if cancellation.is_cancelled() {
            return Err(PipelineError::RequestCanceled);
        }

        // 8. Invoke the handler, racing it against cancellation.
        let ctx = RequestContext {
            route,
            parsed,
            params,
            caller,
            cancellation: cancellation.clone(),
        };

        tokio::select! {
            result = handler.handle(ctx) => result,
            () = cancellation.cancelled() => Err(PipelineError::RequestCanceled),
        }
    }
}

/// Infers the RBAC action for a route that declares none. Per spec §4.6
/// step 2: GET maps to `read` for a single-resource path (terminal
/// component is the wildcard token) and to `list` for a collection path;
/// every other method keeps its fixed default. Routes SHOULD declare
/// `rbac_action` explicitly — this inference only fires when one is
/// absent, and logs when it does so operators can see where it's missing.
#[must_use]
pub fn infer_action(route: &Route) -> &'static str {
    if !matches!(route.method, crate::route::HttpMethod::Get) {
        return route.method.default_action();
    }

    let terminal_is_single_resource = route.wildcards.last().copied().unwrap_or(false);

    if terminal_is_single_resource {
        "read"
    } else {
        tracing::debug!(path = %route.path, "inferring list action: no explicit rbac_action and terminal component is not the wildcard token");
        "list"
    }
}

fn extract_path_params(route: &Route, request_components: &[&str]) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for (name, value) in route.param_names.iter().zip(request_components) {
        if let Some(name) = name {
            params.insert(name.clone(), (*value).to_owned());
        }
    }
    params
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::authz::TrustCallerRoles;
    use crate::route::{HttpMethod, RouteDeclaration, RouteSource};

    struct UsersController;

    impl RouteSource for UsersController {
        fn routes(&self) -> Vec<RouteDeclaration> {
            vec![
                RouteDeclaration::new(HttpMethod::Get, "/Users/?")
                    .component("Users")
                    .param_name("id"),
                RouteDeclaration::new(HttpMethod::Get, "/health").public(),
            ]
        }
    }

    struct AllowAll;
    impl PermissionTable for AllowAll {
        fn allows(&self, _component: &str, _action: &str, _role: &str) -> bool {
            true
        }
    }

    struct EchoHandler;
    #[async_trait]
    impl Handler for EchoHandler {
        async fn handle(&self, ctx: RequestContext<'_>) -> Result<serde_json::Value, PipelineError> {
            Ok(serde_json::json!({ "params": ctx.params }))
        }
    }

    fn router() -> Router<AllowAll, TrustCallerRoles> {
        let controllers: Vec<Box<dyn RouteSource>> = vec![Box::new(UsersController)];
        let catalog = Arc::new(ModelCatalog::new());
        let registry = Arc::new(RouteRegistry::build(&controllers, &catalog).unwrap());
        let gate = AuthorizationGate::new(AllowAll, TrustCallerRoles);
        Router::new(registry, catalog, gate)
    }

    #[tokio::test]
    async fn dispatch_resolves_route_and_extracts_path_params() {
        let query = HashMap::new();
        let result = router()
            .dispatch(
                HttpMethod::Get,
                "/Users/42",
                &query,
                Caller::builder().credential("tok".to_owned()).build(),
                CancellationToken::new(),
                &EchoHandler,
            )
            .await
            .unwrap();
        assert_eq!(result["params"]["id"], "42");
    }

    #[tokio::test]
    async fn dispatch_returns_route_not_found_for_unknown_path() {
        let query = HashMap::new();
        let err = router()
            .dispatch(
                HttpMethod::Get,
                "/Nope",
                &query,
                Caller::anonymous(),
                CancellationToken::new(),
                &EchoHandler,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::RouteNotFound { .. }));
    }

    #[tokio::test]
    async fn dispatch_honors_already_canceled_token() {
        let query = HashMap::new();
        let token = CancellationToken::new();
        token.cancel();
        let err = router()
            .dispatch(
                HttpMethod::Get,
                "/health",
                &query,
                Caller::anonymous(),
                token,
                &EchoHandler,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::RequestCanceled));
    }

    #[tokio::test]
    async fn query_param_overrides_path_param_of_the_same_name() {
        let mut query: RawQuery = HashMap::new();
        query.insert("id".to_owned(), vec!["from-query".to_owned()]);
        let result = router()
            .dispatch(
                HttpMethod::Get,
                "/Users/42",
                &query,
                Caller::builder().credential("tok".to_owned()).build(),
                CancellationToken::new(),
                &EchoHandler,
            )
            .await
            .unwrap();
        assert_eq!(result["params"]["id"], "from-query");
    }
}
