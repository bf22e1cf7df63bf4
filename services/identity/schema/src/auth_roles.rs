use sea_orm::entity::prelude::*;

/// Role known to the role authority. Roles are keyed by name.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "auth_roles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub name: String,
    pub description: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::auth_assignments::Entity")]
    AuthAssignments,
}

impl Related<super::auth_assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthAssignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
