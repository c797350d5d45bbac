use clap::Parser;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

/// Build filter server - attributes, builds and saved filters over HTTP
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "build-filter")]
pub struct ServerConfig {
    /// Bind address
    #[arg(long, env = "BUILD_FILTER_LISTEN", default_value = "127.0.0.1:3000")]
    pub listen: String,

    /// SQLite database URL
    #[arg(
        long,
        env = "BUILD_FILTER_DATABASE_URL",
        default_value = "sqlite://build-filter.db?mode=rwc"
    )]
    pub database_url: String,

    /// Maximum number of pooled database connections
    #[arg(long, env = "BUILD_FILTER_MAX_CONNECTIONS", default_value_t = 5)]
    pub max_connections: u32,
}

impl ServerConfig {
    pub async fn connect(&self) -> Result<SqlitePool, sqlx::Error> {
        SqlitePoolOptions::new()
            .max_connections(self.max_connections)
            .connect(&self.database_url)
            .await
    }
}
