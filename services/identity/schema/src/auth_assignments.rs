use sea_orm::entity::prelude::*;

/// Assignment of one role to one identity.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "auth_assignments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub role_name: String,
    #[sea_orm(primary_key, auto_increment = false)]
    pub identity_id: Uuid,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::auth_roles::Entity",
        from = "Column::RoleName",
        to = "super::auth_roles::Column::Name",
        on_delete = "Cascade"
    )]
    AuthRoles,
    #[sea_orm(
        belongs_to = "super::identities::Entity",
        from = "Column::IdentityId",
        to = "super::identities::Column::Id",
        on_delete = "Cascade"
    )]
    Identities,
}

impl Related<super::auth_roles::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthRoles.def()
    }
}

impl Related<super::identities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Identities.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
