use sea_orm::entity::prelude::*;

/// Identity (user account) row.
///
/// `status` holds the numeric lifecycle code (10 = active, 0 = deleted).
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "identities")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    pub credential_hash: String,
    pub session_token: String,
    pub status: i16,
    pub full_name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub department_id: Option<i32>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::departments::Entity",
        from = "Column::DepartmentId",
        to = "super::departments::Column::Id",
        on_delete = "SetNull"
    )]
    Departments,
    #[sea_orm(has_many = "super::auth_assignments::Entity")]
    AuthAssignments,
}

impl Related<super::departments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Departments.def()
    }
}

impl Related<super::auth_assignments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthAssignments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
