use crate::db::{self, users};
use sea_orm::sea_query::Table;
use sea_orm::{DbErr, DeriveMigrationName};
use sea_orm_migration::{MigrationTrait, SchemaManager, schema};

#[derive(DeriveMigrationName)]
pub(crate) struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(db::Users)
            .if_not_exists()
            .col(schema::pk_auto(users::Column::Id))
            .col(schema::string_uniq(users::Column::Email))
            .col(schema::string(users::Column::Password))
            .col(schema::string(users::Column::Name))
            .col(schema::string(users::Column::Role).default("user"))
            .col(schema::timestamp_with_time_zone(users::Column::CreatedAt))
            .to_owned();
        manager.create_table(table).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(db::Users).to_owned())
            .await
    }
}
