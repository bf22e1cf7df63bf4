use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

/// Numeric code for an active identity; mirrors `IdentityStatus::Active`.
const STATUS_ACTIVE: i16 = 10;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Identities::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Identities::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Identities::Username)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Identities::CredentialHash)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Identities::SessionToken)
                            .string_len(64)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Identities::Status)
                            .small_integer()
                            .not_null()
                            .default(STATUS_ACTIVE),
                    )
                    .col(ColumnDef::new(Identities::FullName).string().null())
                    .col(ColumnDef::new(Identities::Address).string().null())
                    .col(ColumnDef::new(Identities::Phone).string().null())
                    .col(ColumnDef::new(Identities::DepartmentId).integer().null())
                    .col(
                        ColumnDef::new(Identities::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Identities::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Identities::Table, Identities::DepartmentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .table(Identities::Table)
                    .col(Identities::Status)
                    .name("idx_identities_status")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("idx_identities_status").to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Identities::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Identities {
    Table,
    Id,
    Username,
    CredentialHash,
    SessionToken,
    Status,
    FullName,
    Address,
    Phone,
    DepartmentId,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Departments {
    Table,
    Id,
}
