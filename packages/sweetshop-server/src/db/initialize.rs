use crate::db::migration::{m00001_create_table_users, m00002_create_table_sweets};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbConn, DbErr};
use sea_orm_migration::{MigrationTrait, MigratorTrait};
use tracing::info;

pub(crate) async fn connect(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(db_url);
    options.sqlx_logging(false);
    // 内存数据库每个连接都是独立的库
    if db_url.contains(":memory:") {
        options.max_connections(1).min_connections(1);
    }
    Database::connect(options).await
}

pub(crate) async fn initial(db_cnn: &DbConn) -> Result<(), DbErr> {
    Migrator::up(db_cnn, None).await?;
    info!("database migrations applied");
    Ok(())
}

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m00001_create_table_users::Migration),
            Box::new(m00002_create_table_sweets::Migration),
        ]
    }
}

#[cfg(test)]
pub(crate) async fn test_db() -> DatabaseConnection {
    let db = connect("sqlite::memory:").await.unwrap();
    initial(&db).await.unwrap();
    db
}
