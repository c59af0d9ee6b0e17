//! Route declarations and the controller/model collaborator contracts that
//! produce them.

use std::fmt;

/// Closed set of HTTP methods the pipeline dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Default RBAC action inferred for this method, absent an explicit
    /// `rbac_action` on the route and absent the wildcard/id-shaped
    /// terminal-component fallback (see `router::infer_action`).
    #[must_use]
    pub fn default_action(self) -> &'static str {
        match self {
            HttpMethod::Get => "read",
            HttpMethod::Post => "create",
            HttpMethod::Put | HttpMethod::Patch => "update",
            HttpMethod::Delete => "delete",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HttpMethod {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(HttpMethod::Get),
            "POST" => Ok(HttpMethod::Post),
            "PUT" => Ok(HttpMethod::Put),
            "PATCH" => Ok(HttpMethod::Patch),
            "DELETE" => Ok(HttpMethod::Delete),
            _ => Err(()),
        }
    }
}

/// Name bound to a wildcard path component; `None` where the component is
/// a literal, or a wildcard left unnamed.
pub type RouteParamName = Option<String>;

/// A fully resolved route: path broken into components, which components
/// are the wildcard token, the name (if any) bound to each wildcard, and
/// the metadata the rest of the pipeline needs (RBAC component/action,
/// owning model).
///
/// The wildcard token is the literal path component `?` — nothing else.
/// `"?"` and a declared parameter name are independent: a route is built
/// with `?` marking *where* a value is accepted, and `param_name` binds
/// *what to call it*, mirroring the path-components/parameter-names pair
/// a metadata-driven route description carries as two parallel arrays
/// rather than one `:name`-encoded path string.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: HttpMethod,
    /// Raw path as registered, e.g. `/Users/?`.
    pub path: String,
    /// Path split on `/`, empty leading component dropped.
    pub components: Vec<String>,
    /// `true` at each position whose component is the wildcard token `?`.
    pub wildcards: Vec<bool>,
    /// Parameter name bound to each wildcard position; `None` where the
    /// component is a literal, or a wildcard left unnamed.
    pub param_names: Vec<RouteParamName>,
    /// RBAC component name (defaults to the first path segment).
    pub component: String,
    /// Explicit RBAC action, if the route declared one.
    pub rbac_action: Option<String>,
    /// Bypasses the authorization gate entirely when true.
    pub is_public: bool,
}

impl Route {
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        let path = path.into();
        let components: Vec<String> = path
            .split('/')
            .filter(|c| !c.is_empty())
            .map(ToOwned::to_owned)
            .collect();
        let wildcards: Vec<bool> = components.iter().map(|c| c == "?").collect();
        let param_names = vec![None; components.len()];
        let component = components.first().cloned().unwrap_or_default();

        Self {
            method,
            path,
            components,
            wildcards,
            param_names,
            component,
            rbac_action: None,
            is_public: false,
        }
    }

    #[must_use]
    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = component.into();
        self
    }

    #[must_use]
    pub fn rbac_action(mut self, action: impl Into<String>) -> Self {
        self.rbac_action = Some(action.into());
        self
    }

    #[must_use]
    pub fn public(mut self) -> Self {
        self.is_public = true;
        self
    }

    /// Binds a name to the next unnamed wildcard position, left to right.
    /// A no-op if every wildcard already has a name (or the route has
    /// none).
    #[must_use]
    pub fn param_name(mut self, name: impl Into<String>) -> Self {
        if let Some(slot) = self
            .wildcards
            .iter()
            .zip(self.param_names.iter_mut())
            .find_map(|(is_wildcard, slot)| (*is_wildcard && slot.is_none()).then_some(slot))
        {
            *slot = Some(name.into());
        }
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.components.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

/// What a controller hands the route registry at startup. Kept separate
/// from `Route` so controllers can describe intent (public? explicit
/// action?) without constructing the registry's internal representation
/// directly — mirrors a builder-style registration hook rather than a
/// transport-level router.
#[derive(Debug, Clone)]
pub struct RouteDeclaration {
    pub method: HttpMethod,
    pub path: String,
    pub component: Option<String>,
    pub rbac_action: Option<String>,
    pub is_public: bool,
    /// Names to bind to this route's wildcard positions, in left-to-right
    /// order. Fewer names than wildcards leaves the remaining wildcards
    /// unnamed; the pipeline still matches on them but cannot extract a
    /// path parameter from them.
    param_names: Vec<String>,
}

impl RouteDeclaration {
    #[must_use]
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            component: None,
            rbac_action: None,
            is_public: false,
            param_names: Vec::new(),
        }
    }

    #[must_use]
    pub fn component(mut self, component: impl Into<String>) -> Self {
        self.component = Some(component.into());
        self
    }

    #[must_use]
    pub fn rbac_action(mut self, action: impl Into<String>) -> Self {
        self.rbac_action = Some(action.into());
        self
    }

    #[must_use]
    pub fn public(mut self) -> Self {
        self.is_public = true;
        self
    }

    /// Declares the name bound to this route's next (left-to-right)
    /// wildcard position.
    #[must_use]
    pub fn param_name(mut self, name: impl Into<String>) -> Self {
        self.param_names.push(name.into());
        self
    }

    #[must_use]
    pub fn into_route(self) -> Route {
        let mut route = Route::new(self.method, self.path);
        if let Some(component) = self.component {
            route = route.component(component);
        }
        if let Some(action) = self.rbac_action {
            route = route.rbac_action(action);
        }
        if self.is_public {
            route = route.public();
        }
        for name in self.param_names {
            route = route.param_name(name);
        }
        route
    }
}

/// Implemented by controllers that want to register routes with the
/// registry. Analogous to a `registerRoutes()` hook: declarations are
/// transport-agnostic records, not `axum::Router` fragments, so the same
/// declarations can drive the matcher and (optionally) a real router.
pub trait RouteSource: Send + Sync {
    fn routes(&self) -> Vec<RouteDeclaration>;
}
