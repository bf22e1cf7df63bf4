use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::anyhow;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use tessera_domain::id::IdentityId;

use crate::domain::repository::RoleAuthority;
use crate::domain::types::RoleSyncOutcome;
use crate::error::{IdentityError, RoleSyncStage};

/// Keeps an identity's role assignments equal to the single desired role.
///
/// Reconciliation is a full replace: when the assigned set is anything other
/// than `{desired}`, every assignment is revoked and the desired role is
/// assigned. Runs for one identity are serialized so concurrent saves cannot
/// interleave their revoke/assign pairs.
pub struct RoleReconciler {
    locks: DashMap<IdentityId, Arc<Mutex<()>>>,
    assign_attempts: u32,
}

impl RoleReconciler {
    /// `assign_attempts` is clamped to at least one.
    pub fn new(assign_attempts: u32) -> Self {
        Self {
            locks: DashMap::new(),
            assign_attempts: assign_attempts.max(1),
        }
    }

    pub fn assign_attempts(&self) -> u32 {
        self.assign_attempts
    }

    pub async fn reconcile<A: RoleAuthority>(
        &self,
        authority: &A,
        id: IdentityId,
        desired: &str,
    ) -> Result<RoleSyncOutcome, IdentityError> {
        let lock = Arc::clone(self.locks.entry(id).or_default().value());
        let outcome = {
            let _guard = lock.lock().await;
            self.reconcile_locked(authority, id, desired).await
        };
        drop(lock);
        // Only the map itself still holds the lock once every waiter is done.
        self.locks
            .remove_if(&id, |_, lock| Arc::strong_count(lock) == 1);
        outcome
    }

    async fn reconcile_locked<A: RoleAuthority>(
        &self,
        authority: &A,
        id: IdentityId,
        desired: &str,
    ) -> Result<RoleSyncOutcome, IdentityError> {
        let fail = |stage, prior: &BTreeSet<String>, restored, source| IdentityError::RoleSync {
            identity_id: id,
            desired_role: desired.to_owned(),
            stage,
            prior_roles: prior.clone(),
            restored,
            source,
        };

        let assigned = authority
            .roles_assigned_to(id)
            .await
            .map_err(|e| fail(RoleSyncStage::Inspect, &BTreeSet::new(), true, e))?;

        if is_in_sync(&assigned, desired) {
            debug!(identity_id = %id, role = desired, "role assignment unchanged");
            return Ok(RoleSyncOutcome::Unchanged);
        }

        // Nothing has been mutated yet, so the prior state is still intact.
        let role = authority
            .role_by_name(desired)
            .await
            .and_then(|role| role.ok_or_else(|| anyhow!("role {desired:?} does not exist")))
            .map_err(|e| fail(RoleSyncStage::Resolve, &assigned, true, e))?;

        authority
            .revoke_all(id)
            .await
            .map_err(|e| fail(RoleSyncStage::Revoke, &assigned, false, e))?;

        let mut last_error = None;
        for attempt in 1..=self.assign_attempts {
            match authority.assign(&role, id).await {
                Ok(()) => {
                    info!(
                        identity_id = %id,
                        role = desired,
                        previous = ?assigned,
                        "role assignment replaced"
                    );
                    return Ok(RoleSyncOutcome::Replaced { previous: assigned });
                }
                Err(e) => {
                    warn!(
                        identity_id = %id,
                        role = desired,
                        attempt,
                        error = %e,
                        "role assign failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        let restored = restore(authority, id, &assigned).await;
        let source = last_error.unwrap_or_else(|| anyhow!("role assign failed"));
        tracing::error!(
            identity_id = %id,
            role = desired,
            restored,
            "role sync failed after revoke; assignments need manual reconciliation"
        );
        Err(fail(RoleSyncStage::Assign, &assigned, restored, source))
    }
}

impl Default for RoleReconciler {
    fn default() -> Self {
        Self::new(1)
    }
}

/// In sync means the assigned set is exactly the singleton `{desired}`.
pub fn is_in_sync(assigned: &BTreeSet<String>, desired: &str) -> bool {
    assigned.len() == 1 && assigned.contains(desired)
}

/// Re-assign `prior` after a failed replace. Returns `true` when every prior
/// role is back in place.
async fn restore<A: RoleAuthority>(authority: &A, id: IdentityId, prior: &BTreeSet<String>) -> bool {
    let mut restored = true;
    for name in prior {
        let result = match authority.role_by_name(name).await {
            Ok(Some(role)) => authority.assign(&role, id).await,
            Ok(None) => Err(anyhow!("role {name:?} no longer exists")),
            Err(e) => Err(e),
        };
        if let Err(e) = result {
            warn!(identity_id = %id, role = %name, error = %e, "role restore failed");
            restored = false;
        }
    }
    restored
}
