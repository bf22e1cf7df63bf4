#![allow(async_fn_in_trait)]

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};

use tessera_domain::id::{DepartmentId, IdentityId};
use tessera_domain::identity::IdentityStatus;

use crate::domain::types::{Department, Identity, Role};

/// Relational store for identity rows.
pub trait IdentityRepository: Send + Sync {
    async fn find_by_id(
        &self,
        id: IdentityId,
        status: IdentityStatus,
    ) -> anyhow::Result<Option<Identity>>;

    async fn find_by_username(
        &self,
        username: &str,
        status: IdentityStatus,
    ) -> anyhow::Result<Option<Identity>>;

    /// Whether any identity other than `except` uses `username`, regardless of status.
    async fn username_taken(
        &self,
        username: &str,
        except: Option<IdentityId>,
    ) -> anyhow::Result<bool>;

    async fn insert(&self, identity: &Identity) -> anyhow::Result<()>;

    /// Overwrite every mutable column. `created_at` is left untouched.
    async fn update(&self, identity: &Identity) -> anyhow::Result<()>;

    /// Move `id` from status `from` to `to`. Returns `true` if a row changed.
    async fn set_status(
        &self,
        id: IdentityId,
        from: IdentityStatus,
        to: IdentityStatus,
        at: DateTime<Utc>,
    ) -> anyhow::Result<bool>;

    async fn find_department(&self, id: DepartmentId) -> anyhow::Result<Option<Department>>;
}

/// Role-based access control authority: owns role definitions and
/// per-identity role assignments.
pub trait RoleAuthority: Send + Sync {
    async fn list_roles(&self) -> anyhow::Result<Vec<Role>>;

    async fn list_role_names(&self) -> anyhow::Result<BTreeSet<String>> {
        Ok(self
            .list_roles()
            .await?
            .into_iter()
            .map(|role| role.name)
            .collect())
    }

    async fn role_by_name(&self, name: &str) -> anyhow::Result<Option<Role>>;

    async fn roles_assigned_to(&self, id: IdentityId) -> anyhow::Result<BTreeSet<String>>;

    async fn revoke_all(&self, id: IdentityId) -> anyhow::Result<()>;

    async fn assign(&self, role: &Role, id: IdentityId) -> anyhow::Result<()>;
}

/// One-way password hashing and random token generation.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, plaintext: &str) -> anyhow::Result<String>;

    /// Returns `Ok(false)` on mismatch; `Err` only for malformed hashes.
    fn verify(&self, plaintext: &str, hash: &str) -> anyhow::Result<bool>;

    fn random_token(&self) -> String;
}
