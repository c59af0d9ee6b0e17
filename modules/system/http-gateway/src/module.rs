//! HTTP host for the pipeline: owns the Axum server, assembles the
//! middleware stack (request id, trace, timeout, body limit, CORS, auth),
//! and exposes a single catch-all route that drives
//! `rm_apicore::Router::dispatch`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use arc_swap::ArcSwap;
use axum::extract::{DefaultBodyLimit, RawQuery as AxumRawQuery, Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::{from_fn, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use axum::routing::{any, get};
use axum::{Json, Router as AxumRouter};
use rm_apicore::authz::{PermissionTable, UserDirectory};
use rm_apicore::request::RawQuery;
use rm_apicore::{Handler, HttpMethod as PipelineMethod, Router as PipelineRouter};
use rm_security::Caller;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{self, AuthState, AuthnClient};
use crate::config::ApiGatewayConfig;
use crate::middleware::request_id;

/// Owns the live configuration and pipeline router behind `ArcSwap`, so a
/// reload (new routes, a changed CORS policy) never needs a process
/// restart — callers swap the whole `Arc` rather than mutating through a
/// lock.
pub struct GatewayHost<P, D> {
    config: ArcSwap<ApiGatewayConfig>,
    pipeline: ArcSwap<PipelineRouter<P, D>>,
    handler: Arc<dyn Handler>,
    authn_client: Option<Arc<dyn AuthnClient>>,
    /// Cancelled once `serve`'s shutdown signal fires; every in-flight
    /// request's cancellation token is a child of this one, so a client
    /// disconnect no longer has to be the only way a request ever sees
    /// `RequestCanceled` — a graceful shutdown does too.
    shutdown: CancellationToken,
}

impl<P, D> GatewayHost<P, D>
where
    P: PermissionTable + 'static,
    D: UserDirectory + 'static,
{
    #[must_use]
    pub fn new(
        config: ApiGatewayConfig,
        pipeline: PipelineRouter<P, D>,
        handler: Arc<dyn Handler>,
        authn_client: Option<Arc<dyn AuthnClient>>,
    ) -> Self {
        Self {
            config: ArcSwap::from_pointee(config),
            pipeline: ArcSwap::from_pointee(pipeline),
            handler,
            authn_client,
            shutdown: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> ApiGatewayConfig {
        (**self.config.load()).clone()
    }

    /// Atomically swap in a newly built pipeline router — e.g. after a
    /// model/controller hot-reload.
    pub fn reload_pipeline(&self, pipeline: PipelineRouter<P, D>) {
        self.pipeline.store(Arc::new(pipeline));
    }

    /// Build the authentication route policy from the gateway's own
    /// always-public health endpoints plus whatever the caller passes in
    /// for the rest of the API surface.
    ///
    /// # Errors
    /// Propagates `auth::build_route_policy`'s matcher construction errors.
    pub fn build_route_policy(
        &self,
        authenticated_routes: std::collections::HashSet<(Method, String)>,
        mut public_routes: std::collections::HashSet<(Method, String)>,
    ) -> Result<auth::GatewayRoutePolicy> {
        public_routes.insert((Method::GET, "/health".to_owned()));
        public_routes.insert((Method::GET, "/healthz".to_owned()));
        auth::build_route_policy(&self.config(), authenticated_routes, public_routes)
    }

    /// Assemble the full Axum router: health endpoints, the catch-all
    /// pipeline route, and every middleware layer.
    ///
    /// Layers are added innermost-first — `axum::Router::layer` makes the
    /// most-recently-added layer the outermost one, so the list below
    /// reads bottom-to-top as the actual request path: `SetRequestId` ->
    /// `PropagateRequestId` -> trace -> timeout -> body limit -> CORS ->
    /// auth -> catch-all.
    ///
    /// # Errors
    /// Propagates `build_route_policy`'s errors when auth is enabled.
    pub fn build_router(self: &Arc<Self>) -> Result<AxumRouter> {
        let config = self.config();

        let mut router = AxumRouter::new()
            .route("/health", get(health_check))
            .route("/healthz", get(|| async { "ok" }))
            .route("/{*path}", any(dispatch::<P, D>))
            .route("/", any(dispatch::<P, D>))
            .with_state(Arc::clone(self));

        if config.auth_disabled {
            tracing::warn!(
                "HTTP gateway auth is DISABLED: every request runs as an anonymous caller. \
                 Only appropriate for single-user, non-production deployments."
            );
            router = router.layer(from_fn(insert_disabled_auth_caller));
        } else {
            let client = self.authn_client.clone().ok_or_else(|| {
                anyhow::anyhow!(
                    "auth is enabled but no AuthnClient was supplied; \
                     construct GatewayHost with one or set auth_disabled = true"
                )
            })?;
            let route_policy = self.build_route_policy(
                std::collections::HashSet::new(),
                std::collections::HashSet::new(),
            )?;
            let auth_state = AuthState {
                authn_client: client,
                route_policy,
                expose_detailed_errors: config.expose_detailed_errors,
            };
            router = router.layer(from_fn_with_state(auth_state, auth::authn_middleware));
        }

        if config.cors_enabled {
            router = router.layer(build_cors_layer(&config));
        }

        router = router.layer(RequestBodyLimitLayer::new(config.defaults.body_limit_bytes));
        router = router.layer(DefaultBodyLimit::max(config.defaults.body_limit_bytes));
        router = router.layer(TimeoutLayer::new(Duration::from_secs(30)));
        router = router.layer(from_fn(request_id::push_req_id_to_extensions));
        router = router.layer(TraceLayer::new_for_http().make_span_with(
            |req: &axum::http::Request<axum::body::Body>| {
                tracing::info_span!(
                    "http_request",
                    method = %req.method(),
                    path = %req.uri().path(),
                    request_id = tracing::field::Empty,
                )
            },
        ));
        router = router.layer(PropagateRequestIdLayer::new(request_id::HEADER_NAME));
        router = router.layer(SetRequestIdLayer::new(
            request_id::HEADER_NAME,
            request_id::MakeReqId,
        ));

        Ok(router)
    }

    /// Bind and serve until `cancel` fires, then shut down gracefully.
    ///
    /// # Errors
    /// Invalid bind address, bind failure, router construction failure, or
    /// a serve-loop I/O error.
    pub async fn serve(self: Arc<Self>, cancel: CancellationToken) -> Result<()> {
        let addr: SocketAddr = self
            .config()
            .bind_addr
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid bind address '{}': {e}", self.config().bind_addr))?;
        let router = self.build_router()?;

        let listener = tokio::net::TcpListener::bind(addr).await?;
        tracing::info!(%addr, "HTTP gateway listening");

        // Forward the caller's shutdown signal onto `self.shutdown`, so
        // every outstanding request's per-request token (a child of
        // `self.shutdown`) observes the same cancellation.
        let shutdown_token = self.shutdown.clone();
        tokio::spawn(async move {
            cancel.cancelled().await;
            shutdown_token.cancel();
        });

        let shutdown = {
            let shutdown_token = self.shutdown.clone();
            async move {
                shutdown_token.cancelled().await;
                tracing::info!("HTTP gateway shutting down gracefully");
            }
        };

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow::anyhow!(e))
    }
}

/// `auth_disabled` still runs every request through the authorization gate
/// (permission checks keep applying) — it only skips the authentication
/// service. So the injected caller needs a credential, or the gate would
/// reject every request as `Unauthenticated` before the permission table
/// is ever consulted. `system` is the role a deployment's permission table
/// is expected to grant broad access to.
async fn insert_disabled_auth_caller(mut req: Request, next: axum::middleware::Next) -> Response {
    let caller = Caller::builder()
        .roles(vec!["system".to_owned()])
        .credential("auth-disabled".to_owned())
        .build();
    req.extensions_mut().insert(caller);
    next.run(req).await
}

fn build_cors_layer(config: &ApiGatewayConfig) -> CorsLayer {
    use axum::http::{HeaderName, HeaderValue};

    let Some(cors) = &config.cors else {
        return CorsLayer::permissive();
    };

    let mut layer = CorsLayer::new().max_age(Duration::from_secs(cors.max_age_seconds));

    layer = if cors.allowed_origins.iter().any(|o| o == "*") {
        layer.allow_origin(tower_http::cors::Any)
    } else {
        let origins: Vec<HeaderValue> = cors
            .allowed_origins
            .iter()
            .filter_map(|o| HeaderValue::from_str(o).ok())
            .collect();
        layer.allow_origin(origins)
    };

    let methods: Vec<Method> = cors
        .allowed_methods
        .iter()
        .filter_map(|m| m.parse().ok())
        .collect();
    layer = layer.allow_methods(methods);

    layer = if cors.allowed_headers.iter().any(|h| h == "*") {
        layer.allow_headers(tower_http::cors::Any)
    } else {
        let headers: Vec<HeaderName> = cors
            .allowed_headers
            .iter()
            .filter_map(|h| h.parse().ok())
            .collect();
        layer.allow_headers(headers)
    };

    layer.allow_credentials(cors.allow_credentials)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "timestamp": chrono::Utc::now(),
    }))
}

fn to_pipeline_method(method: &Method) -> Option<PipelineMethod> {
    match *method {
        Method::GET => Some(PipelineMethod::Get),
        Method::POST => Some(PipelineMethod::Post),
        Method::PUT => Some(PipelineMethod::Put),
        Method::PATCH => Some(PipelineMethod::Patch),
        Method::DELETE => Some(PipelineMethod::Delete),
        _ => None,
    }
}

fn parse_raw_query(raw: &str) -> RawQuery {
    let mut map: RawQuery = std::collections::HashMap::new();
    for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
        map.entry(key.into_owned()).or_default().push(value.into_owned());
    }
    map
}

/// Catch-all Axum handler: extracts method/path/query, pulls the `Caller`
/// the auth middleware stashed in request extensions, and drives the
/// pipeline's ten-step dispatch.
async fn dispatch<P, D>(
    State(host): State<Arc<GatewayHost<P, D>>>,
    method: Method,
    uri: axum::http::Uri,
    AxumRawQuery(raw_query): AxumRawQuery,
    req: Request,
) -> Response
where
    P: PermissionTable + 'static,
    D: UserDirectory + 'static,
{
    let Some(pipeline_method) = to_pipeline_method(&method) else {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    };

    let caller = req
        .extensions()
        .get::<Caller>()
        .cloned()
        .unwrap_or_else(Caller::anonymous);

    let query = parse_raw_query(raw_query.as_deref().unwrap_or(""));
    let expose_details = host.config().expose_detailed_errors;
    let pipeline = host.pipeline.load();

    let result = pipeline
        .dispatch(
            pipeline_method,
            uri.path(),
            &query,
            caller,
            host.shutdown.child_token(),
            host.handler.as_ref(),
        )
        .await;

    match result {
        Ok(value) => Json(value).into_response(),
        Err(err) => auth::error_response(&err, expose_details),
    }
}
