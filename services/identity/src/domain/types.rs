use std::fmt;

use chrono::{DateTime, Utc};

use tessera_domain::id::IdentityId;
use tessera_domain::identity::IdentityStatus;

/// Plaintext password supplied by a caller. Never printed by `Debug`.
#[derive(Clone, PartialEq, Eq)]
pub struct Password(String);

impl Password {
    pub fn new(plaintext: impl Into<String>) -> Self {
        Self(plaintext.into())
    }

    /// Borrow the plaintext. Only hand it to a credential hasher.
    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password([redacted])")
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Password {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// User account owned by the identity store.
///
/// `desired_role` and `new_password` are write intents: they are consumed by
/// `IdentityStore::save` and never read back from storage. The role currently
/// held in the role authority is available through
/// `IdentityStore::current_roles`.
#[derive(Clone)]
pub struct Identity {
    pub id: IdentityId,
    pub username: String,
    /// PHC-encoded password hash.
    pub credential_hash: String,
    /// Opaque "remember me" token, independent of the password.
    pub session_token: String,
    pub status: IdentityStatus,
    pub full_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Department id as entered; `Some("")` is normalized to `None` on save.
    pub department_ref: Option<String>,
    pub desired_role: Option<String>,
    pub new_password: Option<Password>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("credential_hash", &"[redacted]")
            .field("session_token", &"[redacted]")
            .field("status", &self.status)
            .field("full_name", &self.full_name)
            .field("address", &self.address)
            .field("phone", &self.phone)
            .field("department_ref", &self.department_ref)
            .field("desired_role", &self.desired_role)
            .field("new_password", &self.new_password)
            .field("created_at", &self.created_at)
            .field("updated_at", &self.updated_at)
            .finish()
    }
}

/// Input of the create scenario.
#[derive(Debug, Clone, Default)]
pub struct NewIdentity {
    pub username: String,
    pub password: Option<Password>,
    pub role: Option<String>,
    pub full_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub department_ref: Option<String>,
}

/// Validation scenario. Creation additionally requires a password.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    Create,
    Update,
}

/// Role defined in the role authority.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Role {
    pub name: String,
    pub description: Option<String>,
}

impl Role {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

/// Department an identity can reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Department {
    pub id: i32,
    pub name: String,
}

/// Result of a role reconciliation that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoleSyncOutcome {
    /// The authority already held exactly the desired role.
    Unchanged,
    /// All previous roles were revoked and the desired role assigned.
    Replaced {
        previous: std::collections::BTreeSet<String>,
    },
}

/// Normalize an empty department reference to absent.
pub fn normalize_department_ref(department_ref: &mut Option<String>) {
    if department_ref.as_deref() == Some("") {
        *department_ref = None;
    }
}
