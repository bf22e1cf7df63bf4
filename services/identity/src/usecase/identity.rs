use std::collections::BTreeSet;

use chrono::Utc;
use tracing::{info, warn};

use tessera_domain::id::{DepartmentId, IdentityId};
use tessera_domain::identity::IdentityStatus;

use crate::domain::repository::{CredentialHasher, IdentityRepository, RoleAuthority};
use crate::domain::types::{
    Department, Identity, NewIdentity, Role, RoleSyncOutcome, Scenario, normalize_department_ref,
};
use crate::error::{IdentityError, ValidationErrors};
use crate::usecase::role_sync::RoleReconciler;

/// Owns identity records and keeps each identity's single desired role in
/// step with the role authority.
pub struct IdentityStore<R, A, H>
where
    R: IdentityRepository,
    A: RoleAuthority,
    H: CredentialHasher,
{
    repo: R,
    authority: A,
    hasher: H,
    reconciler: RoleReconciler,
}

impl<R, A, H> IdentityStore<R, A, H>
where
    R: IdentityRepository,
    A: RoleAuthority,
    H: CredentialHasher,
{
    pub fn new(repo: R, authority: A, hasher: H) -> Self {
        Self {
            repo,
            authority,
            hasher,
            reconciler: RoleReconciler::default(),
        }
    }

    /// Retry a failed role assign up to `attempts` times before restoring.
    pub fn with_assign_attempts(mut self, attempts: u32) -> Self {
        self.reconciler = RoleReconciler::new(attempts);
        self
    }

    pub fn repo(&self) -> &R {
        &self.repo
    }

    pub fn authority(&self) -> &A {
        &self.authority
    }

    // ── Lookup ───────────────────────────────────────────────────────────────

    pub async fn find_active_by_id(&self, id: IdentityId) -> Result<Option<Identity>, IdentityError> {
        self.repo
            .find_by_id(id, IdentityStatus::Active)
            .await
            .map_err(IdentityError::Persistence)
    }

    pub async fn find_active_by_username(
        &self,
        username: &str,
    ) -> Result<Option<Identity>, IdentityError> {
        self.repo
            .find_by_username(username, IdentityStatus::Active)
            .await
            .map_err(IdentityError::Persistence)
    }

    /// Bearer-token lookup is not implemented; always fails.
    pub async fn find_by_access_token(
        &self,
        _token: &str,
        kind: Option<&str>,
    ) -> Result<Option<Identity>, IdentityError> {
        warn!(kind = ?kind, "rejected bearer-token identity lookup");
        Err(IdentityError::Unsupported("find_by_access_token"))
    }

    // ── Credentials ──────────────────────────────────────────────────────────

    pub fn validate_credential(
        &self,
        identity: &Identity,
        plaintext: &str,
    ) -> Result<bool, IdentityError> {
        self.hasher
            .verify(plaintext, &identity.credential_hash)
            .map_err(IdentityError::Credential)
    }

    pub fn set_password(&self, identity: &mut Identity, plaintext: &str) -> Result<(), IdentityError> {
        identity.credential_hash = self
            .hasher
            .hash(plaintext)
            .map_err(IdentityError::Credential)?;
        Ok(())
    }

    pub fn regenerate_session_token(&self, identity: &mut Identity) {
        identity.session_token = self.hasher.random_token();
    }

    /// Exact comparison against the stored token. An identity without a token
    /// never validates.
    pub fn validate_session_token(&self, identity: &Identity, token: &str) -> bool {
        !identity.session_token.is_empty() && identity.session_token == token
    }

    // ── Validation ───────────────────────────────────────────────────────────

    /// Check every field of `identity` for `scenario`.
    ///
    /// Local and role checks run first; the username uniqueness query only
    /// runs once they pass, so a rejected identity never reaches the store.
    pub async fn validate(&self, identity: &Identity, scenario: Scenario) -> Result<(), IdentityError> {
        let mut errors = ValidationErrors::default();

        if identity.username.trim().is_empty() {
            errors.add("username", "must not be empty");
        }

        if scenario == Scenario::Create
            && identity.new_password.as_ref().is_none_or(|p| p.is_empty())
        {
            errors.add("new_password", "required on creation");
        }

        if let Some(department_ref) = identity.department_ref.as_deref().filter(|d| !d.is_empty()) {
            if let Err(e) = department_ref.parse::<DepartmentId>() {
                errors.add("department_ref", e.to_string());
            }
        }

        match identity.desired_role.as_deref() {
            None | Some("") => errors.add("role", "must not be empty"),
            Some(role) => {
                let roles = self
                    .authority
                    .list_role_names()
                    .await
                    .map_err(IdentityError::Authority)?;
                if !roles.contains(role) {
                    errors.add("role", format!("unknown role {role:?}"));
                }
            }
        }

        if !errors.is_empty() {
            return errors.into_result();
        }

        let except = match scenario {
            Scenario::Create => None,
            Scenario::Update => Some(identity.id),
        };
        let taken = self
            .repo
            .username_taken(&identity.username, except)
            .await
            .map_err(IdentityError::Persistence)?;
        if taken {
            errors.add("username", "already taken");
        }
        errors.into_result()
    }

    // ── Save ─────────────────────────────────────────────────────────────────

    /// Create a new identity (the insert path of save).
    ///
    /// The store assigns the id and an initial session token.
    pub async fn create(&self, input: NewIdentity) -> Result<Identity, IdentityError> {
        let now = Utc::now();
        let mut identity = Identity {
            id: IdentityId::generate(),
            username: input.username,
            credential_hash: String::new(),
            session_token: self.hasher.random_token(),
            status: IdentityStatus::Active,
            full_name: input.full_name,
            address: input.address,
            phone: input.phone,
            department_ref: input.department_ref,
            desired_role: input.role,
            new_password: input.password,
            created_at: now,
            updated_at: now,
        };
        self.persist(&mut identity, Scenario::Create).await?;
        Ok(identity)
    }

    /// Save changes to an existing identity (the update path of save).
    pub async fn save(&self, identity: &mut Identity) -> Result<RoleSyncOutcome, IdentityError> {
        self.persist(identity, Scenario::Update).await
    }

    /// Validate, write and reconcile. `identity` is only modified once the
    /// row has been written; a validation or persistence failure leaves it
    /// as the caller passed it.
    async fn persist(
        &self,
        identity: &mut Identity,
        scenario: Scenario,
    ) -> Result<RoleSyncOutcome, IdentityError> {
        self.validate(identity, scenario).await?;

        let mut staged = identity.clone();
        if let Some(password) = staged.new_password.take() {
            if !password.is_empty() {
                self.set_password(&mut staged, password.expose())?;
            }
        }
        normalize_department_ref(&mut staged.department_ref);

        let now = Utc::now();
        let written = match scenario {
            Scenario::Create => {
                staged.created_at = now;
                staged.updated_at = now;
                self.repo.insert(&staged).await
            }
            Scenario::Update => {
                staged.updated_at = now;
                self.repo.update(&staged).await
            }
        };
        written.map_err(IdentityError::Persistence)?;
        *identity = staged;

        info!(
            identity_id = %identity.id,
            username = %identity.username,
            scenario = ?scenario,
            "identity saved"
        );

        let desired = identity.desired_role.as_deref().unwrap_or_default();
        self.reconciler
            .reconcile(&self.authority, identity.id, desired)
            .await
    }

    /// Flip an active identity to deleted. Role assignments are left as they
    /// are. Returns `false` when no active identity has `id`.
    pub async fn soft_delete(&self, id: IdentityId) -> Result<bool, IdentityError> {
        let changed = self
            .repo
            .set_status(id, IdentityStatus::Active, IdentityStatus::Deleted, Utc::now())
            .await
            .map_err(IdentityError::Persistence)?;
        if changed {
            info!(identity_id = %id, "identity deleted");
        }
        Ok(changed)
    }

    // ── Roles ────────────────────────────────────────────────────────────────

    /// Roles the authority currently assigns to `identity`.
    pub async fn current_roles(&self, identity: &Identity) -> Result<BTreeSet<String>, IdentityError> {
        self.authority
            .roles_assigned_to(identity.id)
            .await
            .map_err(IdentityError::Authority)
    }

    /// The role to show for `identity`: the first assigned role by name.
    /// Does not touch `desired_role`.
    pub async fn load_role_for_display(
        &self,
        identity: &Identity,
    ) -> Result<Option<String>, IdentityError> {
        Ok(self.current_roles(identity).await?.into_iter().next())
    }

    pub async fn available_roles(&self) -> Result<Vec<Role>, IdentityError> {
        self.authority
            .list_roles()
            .await
            .map_err(IdentityError::Authority)
    }

    // ── Relations ────────────────────────────────────────────────────────────

    pub async fn department_of(&self, identity: &Identity) -> Result<Option<Department>, IdentityError> {
        let Some(department_ref) = identity.department_ref.as_deref().filter(|d| !d.is_empty())
        else {
            return Ok(None);
        };
        let id = department_ref.parse::<DepartmentId>().map_err(|e| {
            let mut errors = ValidationErrors::default();
            errors.add("department_ref", e.to_string());
            IdentityError::Validation(errors)
        })?;
        self.repo
            .find_department(id)
            .await
            .map_err(IdentityError::Persistence)
    }
}
