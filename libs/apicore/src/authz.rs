//! Authorization gate: public-route shortcut, role/permission lookup,
//! fail-secure on every other path.
//!
//! Grounded conceptually on the split between request construction and
//! decision evaluation used by policy-enforcement-point designs, but
//! reduced to a flat `(component, action, role)` permission table — no
//! tenant hierarchy, no constraint predicates.

use rm_security::Caller;

use crate::error::PipelineError;
use crate::route::Route;
use crate::router::infer_action;

/// A synchronous permission table: does `role` hold `action` on
/// `component`? Implementations are expected to be cheap, read-only
/// lookups (a `HashMap`, a `DashMap`, a compiled table) — no I/O.
pub trait PermissionTable: Send + Sync {
    fn allows(&self, component: &str, action: &str, role: &str) -> bool;
}

/// Resolves the roles held by a caller. Separated from [`Caller`] itself
/// because a caller may carry only a subject id and the directory is
/// consulted to resolve current roles (e.g. roles changed since the
/// credential was issued).
#[async_trait::async_trait]
pub trait UserDirectory: Send + Sync {
    async fn roles_of(&self, caller: &Caller) -> Result<Vec<String>, PipelineError>;
}

/// A `UserDirectory` that trusts the roles already embedded in the
/// `Caller` — the common case when the authentication service stamps
/// roles onto the token at issuance time.
pub struct TrustCallerRoles;

#[async_trait::async_trait]
impl UserDirectory for TrustCallerRoles {
    async fn roles_of(&self, caller: &Caller) -> Result<Vec<String>, PipelineError> {
        Ok(caller.roles().to_vec())
    }
}

pub struct AuthorizationGate<P, D> {
    permissions: P,
    directory: D,
}

impl<P, D> AuthorizationGate<P, D>
where
    P: PermissionTable,
    D: UserDirectory,
{
    pub fn new(permissions: P, directory: D) -> Self {
        Self {
            permissions,
            directory,
        }
    }

    /// Fail-secure: public routes always pass; every other route requires
    /// a resolvable caller with at least one role granting the action on
    /// the route's component. Unauthenticated callers on a non-public
    /// route get `Unauthenticated`; authenticated callers without the
    /// right role get `Forbidden`. Any ambiguity (no roles resolved, no
    /// matching permission) denies rather than allows.
    ///
    /// # Errors
    /// `Unauthenticated` or `Forbidden` per the above; propagates
    /// directory lookup failures unchanged.
    pub async fn authorize(&self, route: &Route, caller: &Caller) -> Result<(), PipelineError> {
        if route.is_public {
            return Ok(());
        }

        if !caller.has_credential() {
            return Err(PipelineError::Unauthenticated);
        }

        let action = route
            .rbac_action
            .clone()
            .unwrap_or_else(|| infer_action(route).to_owned());

        let roles = self.directory.roles_of(caller).await?;
        let allowed = roles
            .iter()
            .any(|role| self.permissions.allows(&route.component, &action, role));

        if allowed {
            Ok(())
        } else {
            Err(PipelineError::Forbidden {
                component: route.component.clone(),
                action,
            })
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::route::HttpMethod;

    struct StaticTable(Vec<(&'static str, &'static str, &'static str)>);

    impl PermissionTable for StaticTable {
        fn allows(&self, component: &str, action: &str, role: &str) -> bool {
            self.0
                .iter()
                .any(|(c, a, r)| *c == component && *a == action && *r == role)
        }
    }

    fn gate() -> AuthorizationGate<StaticTable, TrustCallerRoles> {
        AuthorizationGate::new(
            StaticTable(vec![("Users", "read", "admin"), ("Users", "read", "viewer")]),
            TrustCallerRoles,
        )
    }

    #[tokio::test]
    async fn public_route_bypasses_everything() {
        let route = Route::new(HttpMethod::Get, "/health").public();
        let caller = Caller::anonymous();
        assert!(gate().authorize(&route, &caller).await.is_ok());
    }

    #[tokio::test]
    async fn anonymous_caller_on_protected_route_is_unauthenticated() {
        let route = Route::new(HttpMethod::Get, "/Users/?").component("Users");
        let caller = Caller::anonymous();
        let err = gate().authorize(&route, &caller).await.unwrap_err();
        assert!(matches!(err, PipelineError::Unauthenticated));
    }

    #[tokio::test]
    async fn credentialed_caller_without_role_is_forbidden() {
        let route = Route::new(HttpMethod::Delete, "/Users/?")
            .component("Users")
            .rbac_action("delete");
        let caller = Caller::builder()
            .roles(vec!["viewer".to_owned()])
            .credential("tok".to_owned())
            .build();
        let err = gate().authorize(&route, &caller).await.unwrap_err();
        match err {
            PipelineError::Forbidden { component, action } => {
                assert_eq!(component, "Users");
                assert_eq!(action, "delete");
            }
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn credentialed_caller_with_matching_role_is_allowed() {
        let route = Route::new(HttpMethod::Get, "/Users/?").component("Users");
        let caller = Caller::builder()
            .roles(vec!["viewer".to_owned()])
            .credential("tok".to_owned())
            .build();
        assert!(gate().authorize(&route, &caller).await.is_ok());
    }

    #[tokio::test]
    async fn get_on_a_collection_route_is_authorized_as_list_not_read() {
        let route = Route::new(HttpMethod::Get, "/Users").component("Users");
        let caller = Caller::builder()
            .roles(vec!["viewer".to_owned()])
            .credential("tok".to_owned())
            .build();
        let err = gate().authorize(&route, &caller).await.unwrap_err();
        match err {
            PipelineError::Forbidden { action, .. } => assert_eq!(action, "list"),
            other => panic!("expected Forbidden, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn role_with_no_matching_permission_entry_fails_secure() {
        let route = Route::new(HttpMethod::Post, "/Users").component("Users");
        let caller = Caller::builder()
            .roles(vec!["unknown-role".to_owned()])
            .credential("tok".to_owned())
            .build();
        assert!(gate().authorize(&route, &caller).await.is_err());
    }
}
