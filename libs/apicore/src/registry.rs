//! Route registry: discovers routes from controllers and model metadata,
//! indexes them by `(method, path length)` for a cheap first pass, then
//! scores same-length candidates to find the best match.
//!
//! Constructed once per (re)build and held read-only thereafter — callers
//! that need hot-reload wrap the registry in `arc_swap::ArcSwap` and swap
//! the whole `Arc` rather than mutating through a lock.

use std::collections::HashMap;

use crate::metadata::ModelCatalog;
use crate::path_scorer::best_match;
use crate::route::{HttpMethod, Route, RouteSource};

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("duplicate route: {method} {path}")]
    DuplicateRoute { method: HttpMethod, path: String },
}

/// Routes indexed by `(method, component count)`, the registry's two-pass
/// lookup key: first narrow to same-length candidates, then run the path
/// scorer over just those.
pub struct RouteRegistry {
    index: HashMap<(HttpMethod, usize), Vec<Route>>,
}

impl RouteRegistry {
    /// Builds a registry from controller-declared routes and every
    /// registered model's `ModelMetadata::api_routes`. A model-declared
    /// route that leaves its RBAC component unset inherits the model's
    /// catalog name. Rejects an exact `(method, path)` duplicate —
    /// ambiguous registration is a configuration error the caller should
    /// fix, not silently resolve.
    ///
    /// # Errors
    /// `DuplicateRoute` if the same method and literal path are declared
    /// twice, whether by two controllers, two models, or a controller and
    /// a model.
    pub fn build(controllers: &[Box<dyn RouteSource>], catalog: &ModelCatalog) -> Result<Self, RegistryError> {
        let mut seen: std::collections::HashSet<(HttpMethod, String)> = std::collections::HashSet::new();
        let mut index: HashMap<(HttpMethod, usize), Vec<Route>> = HashMap::new();

        for controller in controllers {
            for declaration in controller.routes() {
                Self::insert(&mut index, &mut seen, declaration)?;
            }
        }

        for name in catalog.available_models() {
            let Some(model) = catalog.get(&name) else {
                continue;
            };
            for declaration in model.api_routes() {
                let declaration = if declaration.component.is_some() {
                    declaration
                } else {
                    declaration.component(name.clone())
                };
                Self::insert(&mut index, &mut seen, declaration)?;
            }
        }

        Ok(Self { index })
    }

    fn insert(
        index: &mut HashMap<(HttpMethod, usize), Vec<Route>>,
        seen: &mut std::collections::HashSet<(HttpMethod, String)>,
        declaration: crate::route::RouteDeclaration,
    ) -> Result<(), RegistryError> {
        let route = declaration.into_route();
        let key = (route.method, route.path.clone());
        if !seen.insert(key) {
            return Err(RegistryError::DuplicateRoute {
                method: route.method,
                path: route.path,
            });
        }
        index.entry((route.method, route.len())).or_default().push(route);
        Ok(())
    }

    /// Two-pass lookup: narrow by `(method, component count)`, then score
    /// the narrowed set and return the best match.
    #[must_use]
    pub fn find(&self, method: HttpMethod, path_components: &[&str]) -> Option<&Route> {
        let candidates = self.index.get(&(method, path_components.len()))?;
        best_match(candidates, path_components)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
