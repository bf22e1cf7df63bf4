use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuthAssignments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthAssignments::RoleName)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(ColumnDef::new(AuthAssignments::IdentityId).uuid().not_null())
                    .col(
                        ColumnDef::new(AuthAssignments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .primary_key(
                        Index::create()
                            .col(AuthAssignments::RoleName)
                            .col(AuthAssignments::IdentityId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AuthAssignments::Table, AuthAssignments::RoleName)
                            .to(AuthRoles::Table, AuthRoles::Name)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(AuthAssignments::Table, AuthAssignments::IdentityId)
                            .to(Identities::Table, Identities::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(AuthAssignments::Table)
                    .col(AuthAssignments::IdentityId)
                    .name("idx_auth_assignments_identity_id")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_auth_assignments_identity_id")
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(AuthAssignments::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AuthAssignments {
    Table,
    RoleName,
    IdentityId,
    CreatedAt,
}

#[derive(Iden)]
enum AuthRoles {
    Table,
    Name,
}

#[derive(Iden)]
enum Identities {
    Table,
    Id,
}
