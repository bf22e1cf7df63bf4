use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(AuthRoles::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AuthRoles::Name)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AuthRoles::Description).text().null())
                    .col(
                        ColumnDef::new(AuthRoles::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AuthRoles::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum AuthRoles {
    Table,
    Name,
    Description,
    CreatedAt,
}
