use anyhow::{Context as _, anyhow};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, sea_query::Expr,
};

use tessera_domain::id::{DepartmentId, IdentityId};
use tessera_domain::identity::IdentityStatus;
use tessera_identity_schema::{departments, identities};

use crate::domain::repository::IdentityRepository;
use crate::domain::types::{Department, Identity};

// ── Identity repository ──────────────────────────────────────────────────────

#[derive(Clone)]
pub struct DbIdentityRepository {
    pub db: DatabaseConnection,
}

impl IdentityRepository for DbIdentityRepository {
    async fn find_by_id(
        &self,
        id: IdentityId,
        status: IdentityStatus,
    ) -> anyhow::Result<Option<Identity>> {
        let model = identities::Entity::find_by_id(id.0)
            .filter(identities::Column::Status.eq(status.code()))
            .one(&self.db)
            .await
            .context("find identity by id")?;
        model.map(identity_from_model).transpose()
    }

    async fn find_by_username(
        &self,
        username: &str,
        status: IdentityStatus,
    ) -> anyhow::Result<Option<Identity>> {
        let model = identities::Entity::find()
            .filter(identities::Column::Username.eq(username))
            .filter(identities::Column::Status.eq(status.code()))
            .one(&self.db)
            .await
            .context("find identity by username")?;
        model.map(identity_from_model).transpose()
    }

    async fn username_taken(
        &self,
        username: &str,
        except: Option<IdentityId>,
    ) -> anyhow::Result<bool> {
        let mut query =
            identities::Entity::find().filter(identities::Column::Username.eq(username));
        if let Some(id) = except {
            query = query.filter(identities::Column::Id.ne(id.0));
        }
        let count = query
            .count(&self.db)
            .await
            .context("count identities by username")?;
        Ok(count > 0)
    }

    async fn insert(&self, identity: &Identity) -> anyhow::Result<()> {
        let mut am = active_model(identity)?;
        am.created_at = Set(identity.created_at);
        am.insert(&self.db).await.context("insert identity")?;
        Ok(())
    }

    async fn update(&self, identity: &Identity) -> anyhow::Result<()> {
        active_model(identity)?
            .update(&self.db)
            .await
            .context("update identity")?;
        Ok(())
    }

    async fn set_status(
        &self,
        id: IdentityId,
        from: IdentityStatus,
        to: IdentityStatus,
        at: DateTime<Utc>,
    ) -> anyhow::Result<bool> {
        let result = identities::Entity::update_many()
            .col_expr(identities::Column::Status, Expr::value(to.code()))
            .col_expr(identities::Column::UpdatedAt, Expr::value(at))
            .filter(identities::Column::Id.eq(id.0))
            .filter(identities::Column::Status.eq(from.code()))
            .exec(&self.db)
            .await
            .context("update identity status")?;
        Ok(result.rows_affected > 0)
    }

    async fn find_department(&self, id: DepartmentId) -> anyhow::Result<Option<Department>> {
        let model = departments::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .context("find department by id")?;
        Ok(model.map(|m| Department {
            id: m.id,
            name: m.name,
        }))
    }
}

/// Active model with every column except `created_at` set.
fn active_model(identity: &Identity) -> anyhow::Result<identities::ActiveModel> {
    let department_id = identity
        .department_ref
        .as_deref()
        .filter(|d| !d.is_empty())
        .map(|d| d.parse::<DepartmentId>().map(|id| id.0))
        .transpose()
        .context("department reference")?;
    Ok(identities::ActiveModel {
        id: Set(identity.id.0),
        username: Set(identity.username.clone()),
        credential_hash: Set(identity.credential_hash.clone()),
        session_token: Set(identity.session_token.clone()),
        status: Set(identity.status.code()),
        full_name: Set(identity.full_name.clone()),
        address: Set(identity.address.clone()),
        phone: Set(identity.phone.clone()),
        department_id: Set(department_id),
        updated_at: Set(identity.updated_at),
        ..Default::default()
    })
}

fn identity_from_model(model: identities::Model) -> anyhow::Result<Identity> {
    let status = IdentityStatus::from_code(model.status)
        .ok_or_else(|| anyhow!("identity {} has unknown status {}", model.id, model.status))?;
    Ok(Identity {
        id: IdentityId(model.id),
        username: model.username,
        credential_hash: model.credential_hash,
        session_token: model.session_token,
        status,
        full_name: model.full_name,
        address: model.address,
        phone: model.phone,
        department_ref: model.department_id.map(|id| id.to_string()),
        desired_role: None,
        new_password: None,
        created_at: model.created_at,
        updated_at: model.updated_at,
    })
}
