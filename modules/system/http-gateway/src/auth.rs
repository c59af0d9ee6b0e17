use axum::http::Method;
use axum::response::IntoResponse;
use axum::Json;
use std::{collections::HashMap, sync::Arc};

use rm_apicore::PipelineError;
use rm_security::Caller;

/// Resolves a bearer token to a [`Caller`]. A real deployment backs this
/// with whatever authentication service issues tokens; tests and demos
/// can implement it in-memory.
#[async_trait::async_trait]
pub trait AuthnClient: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Caller, AuthnError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthnError {
    #[error("token was rejected: {0}")]
    Unauthorized(String),
    #[error("authentication service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("internal authentication error: {0}")]
    Internal(String),
}

/// Route matcher for a specific HTTP method (authenticated routes).
#[derive(Clone)]
pub struct RouteMatcher {
    matcher: matchit::Router<()>,
}

impl RouteMatcher {
    fn new() -> Self {
        Self {
            matcher: matchit::Router::new(),
        }
    }

    fn insert(&mut self, path: &str) -> Result<(), matchit::InsertError> {
        self.matcher.insert(path, ())
    }

    fn find(&self, path: &str) -> bool {
        self.matcher.at(path).is_ok()
    }
}

/// Public route matcher for explicitly public routes
#[derive(Clone)]
pub struct PublicRouteMatcher {
    matcher: matchit::Router<()>,
}

impl PublicRouteMatcher {
    fn new() -> Self {
        Self {
            matcher: matchit::Router::new(),
        }
    }

    fn insert(&mut self, path: &str) -> Result<(), matchit::InsertError> {
        self.matcher.insert(path, ())
    }

    fn find(&self, path: &str) -> bool {
        self.matcher.at(path).is_ok()
    }
}

/// Convert Axum path syntax `:param` to matchit syntax `{param}`
///
/// Axum uses `:id` for path parameters, but matchit 0.8+ uses `{id}`.
/// This matcher lives only in the gateway (it resolves auth requirements
/// ahead of the pipeline's own path scorer, which works on raw components
/// and needs no such conversion).
fn convert_axum_path_to_matchit(path: &str) -> String {
    let mut result = String::with_capacity(path.len());
    let mut chars = path.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == ':' {
            result.push('{');
            while matches!(chars.peek(), Some(c) if c.is_alphanumeric() || *c == '_') {
                if let Some(c) = chars.next() {
                    result.push(c);
                }
            }
            result.push('}');
        } else {
            result.push(ch);
        }
    }

    result
}

/// Whether a route requires authentication.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRequirement {
    /// No authentication required (public route).
    None,
    /// Authentication required.
    Required,
}

/// Gateway-specific route policy implementation
#[derive(Clone)]
pub struct GatewayRoutePolicy {
    route_matchers: Arc<HashMap<Method, RouteMatcher>>,
    public_matchers: Arc<HashMap<Method, PublicRouteMatcher>>,
    require_auth_by_default: bool,
}

impl GatewayRoutePolicy {
    #[must_use]
    pub fn new(
        route_matchers: Arc<HashMap<Method, RouteMatcher>>,
        public_matchers: Arc<HashMap<Method, PublicRouteMatcher>>,
        require_auth_by_default: bool,
    ) -> Self {
        Self {
            route_matchers,
            public_matchers,
            require_auth_by_default,
        }
    }

    /// Resolve the authentication requirement for a given (method, path).
    #[must_use]
    pub fn resolve(&self, method: &Method, path: &str) -> AuthRequirement {
        let is_authenticated = self
            .route_matchers
            .get(method)
            .is_some_and(|matcher| matcher.find(path));

        let is_public = self
            .public_matchers
            .get(method)
            .is_some_and(|matcher| matcher.find(path));

        let needs_authn = is_authenticated || (self.require_auth_by_default && !is_public);

        if needs_authn {
            AuthRequirement::Required
        } else {
            AuthRequirement::None
        }
    }
}

/// Shared state for the authentication middleware.
#[derive(Clone)]
pub struct AuthState {
    pub authn_client: Arc<dyn AuthnClient>,
    pub route_policy: GatewayRoutePolicy,
    pub expose_detailed_errors: bool,
}

/// Builds a `GatewayRoutePolicy` from the registry's public/protected
/// route sets. `/health` and `/healthz` are always treated as public by
/// the caller before this function runs — see `module::build_route_policy_from_registry`.
///
/// # Errors
/// Propagates a `matchit::InsertError` (wrapped in `anyhow`) if two
/// routes for the same method collide under matchit's own rules.
pub fn build_route_policy(
    cfg: &crate::config::ApiGatewayConfig,
    authenticated_routes: std::collections::HashSet<(Method, String)>,
    public_routes: std::collections::HashSet<(Method, String)>,
) -> Result<GatewayRoutePolicy, anyhow::Error> {
    let mut route_matchers_map: HashMap<Method, RouteMatcher> = HashMap::new();

    for (method, path) in authenticated_routes {
        let matcher = route_matchers_map
            .entry(method)
            .or_insert_with(RouteMatcher::new);
        let matchit_path = convert_axum_path_to_matchit(&path);
        matcher
            .insert(&matchit_path)
            .map_err(|e| anyhow::anyhow!("failed to insert route pattern '{path}': {e}"))?;
    }

    let mut public_matchers_map: HashMap<Method, PublicRouteMatcher> = HashMap::new();

    for (method, path) in public_routes {
        let matcher = public_matchers_map
            .entry(method)
            .or_insert_with(PublicRouteMatcher::new);
        let matchit_path = convert_axum_path_to_matchit(&path);
        matcher
            .insert(&matchit_path)
            .map_err(|e| anyhow::anyhow!("failed to insert public route pattern '{path}': {e}"))?;
    }

    Ok(GatewayRoutePolicy::new(
        Arc::new(route_matchers_map),
        Arc::new(public_matchers_map),
        cfg.require_auth_by_default,
    ))
}

/// Authentication middleware backed by the configured `AuthnClient`.
///
/// For each request:
/// 1. Skips CORS preflight requests.
/// 2. Resolves the route's auth requirement via `GatewayRoutePolicy`.
/// 3. For public routes: inserts an anonymous `Caller`.
/// 4. For required routes: extracts the bearer token, authenticates it,
///    and inserts the resulting `Caller`.
pub async fn authn_middleware(
    axum::extract::State(state): axum::extract::State<AuthState>,
    mut req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    if is_preflight_request(req.method(), req.headers()) {
        return next.run(req).await;
    }

    let requirement = state.route_policy.resolve(req.method(), req.uri().path());

    match requirement {
        AuthRequirement::None => {
            req.extensions_mut().insert(Caller::anonymous());
            next.run(req).await
        }
        AuthRequirement::Required => {
            let Some(token) = extract_bearer_token(req.headers()) else {
                return error_response(&PipelineError::Unauthenticated, state.expose_detailed_errors);
            };

            match state.authn_client.authenticate(token).await {
                Ok(caller) => {
                    req.extensions_mut().insert(caller);
                    next.run(req).await
                }
                Err(err) => authn_error_response(&err, state.expose_detailed_errors),
            }
        }
    }
}

pub(crate) fn error_response(err: &PipelineError, expose_details: bool) -> axum::response::Response {
    let status = axum::http::StatusCode::from_u16(err.status().as_u16())
        .unwrap_or(axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    let envelope = err.envelope(expose_details, chrono::Utc::now());
    (status, Json(envelope)).into_response()
}

fn authn_error_response(err: &AuthnError, expose_details: bool) -> axum::response::Response {
    log_authn_error(err);
    let pipeline_err = match err {
        AuthnError::Unauthorized(_) => PipelineError::Unauthenticated,
        AuthnError::ServiceUnavailable(msg) | AuthnError::Internal(msg) => {
            PipelineError::Internal(msg.clone())
        }
    };
    error_response(&pipeline_err, expose_details)
}

/// Cognitive complexity is inflated by tracing macro expansion.
#[allow(clippy::cognitive_complexity)]
fn log_authn_error(err: &AuthnError) {
    match err {
        AuthnError::Unauthorized(msg) => tracing::debug!("authn rejected: {msg}"),
        AuthnError::ServiceUnavailable(msg) => tracing::error!("authn service unavailable: {msg}"),
        AuthnError::Internal(msg) => tracing::error!("authn internal error: {msg}"),
    }
}

/// Extract Bearer token from Authorization header
fn extract_bearer_token(headers: &axum::http::HeaderMap) -> Option<&str> {
    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer ").map(str::trim))
}

/// Check if this is a CORS preflight request
///
/// Preflight requests are OPTIONS requests with:
/// - Origin header present
/// - Access-Control-Request-Method header present
fn is_preflight_request(method: &Method, headers: &axum::http::HeaderMap) -> bool {
    method == Method::OPTIONS
        && headers.contains_key(axum::http::header::ORIGIN)
        && headers.contains_key(axum::http::header::ACCESS_CONTROL_REQUEST_METHOD)
}
