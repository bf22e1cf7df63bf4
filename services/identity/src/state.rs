use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::config::IdentityConfig;
use crate::infra::db::DbIdentityRepository;
use crate::infra::hasher::Argon2Hasher;
use crate::infra::rbac::DbRoleAuthority;
use crate::usecase::identity::IdentityStore;

/// Identity store wired to the database adapters.
pub type DbIdentityStore = IdentityStore<DbIdentityRepository, DbRoleAuthority, Argon2Hasher>;

/// Shared state: the database connection and the loaded configuration.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub config: Arc<IdentityConfig>,
}

impl AppState {
    pub fn identity_repo(&self) -> DbIdentityRepository {
        DbIdentityRepository {
            db: self.db.clone(),
        }
    }

    pub fn role_authority(&self) -> DbRoleAuthority {
        DbRoleAuthority {
            db: self.db.clone(),
        }
    }

    pub fn hasher(&self) -> anyhow::Result<Argon2Hasher> {
        Argon2Hasher::from_config(&self.config)
    }

    pub fn identity_store(&self) -> anyhow::Result<DbIdentityStore> {
        Ok(
            IdentityStore::new(self.identity_repo(), self.role_authority(), self.hasher()?)
                .with_assign_attempts(self.config.role_sync_assign_attempts),
        )
    }
}
