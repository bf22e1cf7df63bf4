use sea_orm_migration::prelude::*;

mod m20261001_000001_create_departments;
mod m20261001_000002_create_identities;
mod m20261001_000003_create_auth_roles;
mod m20261001_000004_create_auth_assignments;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20261001_000001_create_departments::Migration),
            Box::new(m20261001_000002_create_identities::Migration),
            Box::new(m20261001_000003_create_auth_roles::Migration),
            Box::new(m20261001_000004_create_auth_assignments::Migration),
        ]
    }
}
