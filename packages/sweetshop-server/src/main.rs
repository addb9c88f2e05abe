mod bootstrap;
mod db;
mod error;
mod routes;
mod services;
mod state;

use crate::bootstrap::config::ServerConfig;
use crate::state::AppState;
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "sweetshop-server", version, about = "Sweet shop inventory server")]
struct CliArgs {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    /// 启动 HTTP 服务（默认）
    Serve,
    /// 只执行数据库迁移
    Migrate,
    /// 写入示例账号
    Seed,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .init();

    let args = CliArgs::parse();
    let config = ServerConfig::from_env()?;

    let db_cnn = db::initialize::connect(&config.db_url).await?;
    db::initialize::initial(&db_cnn).await?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Migrate => {
            info!(db_url = %config.db_url, "migrations applied");
        }
        Command::Seed => {
            let created = db::seed::seed_users(&db_cnn, config.bcrypt_cost).await?;
            info!(created, "seed completed");
        }
        Command::Serve => sweetshop_service(db_cnn, config).await?,
    }

    Ok(())
}

async fn sweetshop_service(
    db_cnn: sea_orm::DatabaseConnection,
    config: ServerConfig,
) -> anyhow::Result<()> {
    let addr = config.addr;
    let display_addr = config.display_addr();
    let state = Arc::new(AppState::new(db_cnn, config));
    let app = bootstrap::app::axum_app(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| anyhow::anyhow!("failed to bind {addr}: {e}"))?;
    info!("sweetshop server listening on {display_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("server error: {e}"))?;
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        info!("shutdown signal received");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults_to_serve() {
        let args = CliArgs::try_parse_from(["sweetshop-server"]).unwrap();
        assert_eq!(args.command, None);

        let args = CliArgs::try_parse_from(["sweetshop-server", "seed"]).unwrap();
        assert_eq!(args.command, Some(Command::Seed));
        assert!(CliArgs::try_parse_from(["sweetshop-server", "explode"]).is_err());
    }

    #[tokio::test]
    async fn test_database_connection() {
        let db = db::initialize::connect("sqlite::memory:").await.unwrap();
        assert!(db.ping().await.is_ok());
    }
}
