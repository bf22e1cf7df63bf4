use std::collections::BTreeSet;

use anyhow::Context as _;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder,
};

use tessera_domain::id::IdentityId;
use tessera_identity_schema::{auth_assignments, auth_roles};

use crate::domain::repository::RoleAuthority;
use crate::domain::types::Role;

/// Role authority backed by the `auth_roles` / `auth_assignments` tables.
#[derive(Clone)]
pub struct DbRoleAuthority {
    pub db: DatabaseConnection,
}

impl DbRoleAuthority {
    /// Define a new role. Fails if a role with the same name exists.
    pub async fn create_role(&self, role: &Role) -> anyhow::Result<()> {
        auth_roles::ActiveModel {
            name: Set(role.name.clone()),
            description: Set(role.description.clone()),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .with_context(|| format!("create role {:?}", role.name))?;
        Ok(())
    }
}

impl RoleAuthority for DbRoleAuthority {
    async fn list_roles(&self) -> anyhow::Result<Vec<Role>> {
        let models = auth_roles::Entity::find()
            .order_by_asc(auth_roles::Column::Name)
            .all(&self.db)
            .await
            .context("list roles")?;
        Ok(models.into_iter().map(role_from_model).collect())
    }

    async fn role_by_name(&self, name: &str) -> anyhow::Result<Option<Role>> {
        let model = auth_roles::Entity::find_by_id(name.to_owned())
            .one(&self.db)
            .await
            .context("find role by name")?;
        Ok(model.map(role_from_model))
    }

    async fn roles_assigned_to(&self, id: IdentityId) -> anyhow::Result<BTreeSet<String>> {
        let models = auth_assignments::Entity::find()
            .filter(auth_assignments::Column::IdentityId.eq(id.0))
            .all(&self.db)
            .await
            .context("list role assignments")?;
        Ok(models.into_iter().map(|m| m.role_name).collect())
    }

    async fn revoke_all(&self, id: IdentityId) -> anyhow::Result<()> {
        auth_assignments::Entity::delete_many()
            .filter(auth_assignments::Column::IdentityId.eq(id.0))
            .exec(&self.db)
            .await
            .context("revoke role assignments")?;
        Ok(())
    }

    async fn assign(&self, role: &Role, id: IdentityId) -> anyhow::Result<()> {
        auth_assignments::ActiveModel {
            role_name: Set(role.name.clone()),
            identity_id: Set(id.0),
            created_at: Set(Utc::now()),
        }
        .insert(&self.db)
        .await
        .with_context(|| format!("assign role {:?}", role.name))?;
        Ok(())
    }
}

fn role_from_model(model: auth_roles::Model) -> Role {
    Role {
        name: model.name,
        description: model.description,
    }
}
