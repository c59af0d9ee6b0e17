use secrecy::SecretString;
use uuid::Uuid;

/// Identity of the caller making a request, as resolved by the authentication
/// service before the pipeline runs.
///
/// A `Caller` carries the set of role names the authorization gate consults;
/// it does not carry permissions directly — those live in the permission
/// table the gate queries (see `rm_apicore::authz`).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Caller {
    /// Subject ID of the authenticated user. `None` for an anonymous caller.
    subject_id: Option<Uuid>,
    /// Role names held by this caller.
    #[serde(default)]
    roles: Vec<String>,
    /// Original bearer credential, if one was presented. Used only to tell
    /// "no credentials" (401) apart from "credentials, wrong role" (403).
    /// Wrapped in `SecretString` so `Debug` redacts the value.
    #[serde(skip)]
    credential: Option<SecretString>,
}

impl Caller {
    /// Start building a `Caller`.
    #[must_use]
    pub fn builder() -> CallerBuilder {
        CallerBuilder::default()
    }

    /// An anonymous caller: no subject, no roles, no credential.
    #[must_use]
    pub fn anonymous() -> Self {
        CallerBuilder::default().build()
    }

    #[must_use]
    pub fn subject_id(&self) -> Option<Uuid> {
        self.subject_id
    }

    #[must_use]
    pub fn roles(&self) -> &[String] {
        &self.roles
    }

    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Whether the caller presented any credential at all (used to choose
    /// between 401 Unauthenticated and 403 Forbidden on an authorization
    /// failure).
    #[must_use]
    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }
}

#[derive(Default)]
pub struct CallerBuilder {
    subject_id: Option<Uuid>,
    roles: Vec<String>,
    credential: Option<SecretString>,
}

impl CallerBuilder {
    #[must_use]
    pub fn subject_id(mut self, subject_id: Uuid) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    #[must_use]
    pub fn roles(mut self, roles: Vec<String>) -> Self {
        self.roles = roles;
        self
    }

    #[must_use]
    pub fn credential(mut self, credential: impl Into<SecretString>) -> Self {
        self.credential = Some(credential.into());
        self
    }

    #[must_use]
    pub fn build(self) -> Caller {
        Caller {
            subject_id: self.subject_id,
            roles: self.roles,
            credential: self.credential,
        }
    }
}
