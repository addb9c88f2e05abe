use crate::db::{self, sweets};
use sea_orm::sea_query::Table;
use sea_orm::{DbErr, DeriveMigrationName};
use sea_orm_migration::{MigrationTrait, SchemaManager, schema};

#[derive(DeriveMigrationName)]
pub(crate) struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let table = Table::create()
            .table(db::Sweets)
            .if_not_exists()
            .col(schema::pk_auto(sweets::Column::Id))
            .col(schema::string(sweets::Column::Name))
            .col(schema::string(sweets::Column::Category))
            .col(schema::double(sweets::Column::Price))
            .col(schema::integer(sweets::Column::Quantity).default(0))
            .col(schema::text_null(sweets::Column::Description))
            .col(schema::string_null(sweets::Column::ImageUrl))
            .col(schema::timestamp_with_time_zone(sweets::Column::CreatedAt))
            .col(schema::timestamp_with_time_zone(sweets::Column::UpdatedAt))
            .to_owned();
        manager.create_table(table).await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(db::Sweets).to_owned())
            .await
    }
}
