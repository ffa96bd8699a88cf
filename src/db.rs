use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;

pub type DbPool = PgPool;

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Replaces the userinfo of a connection URL so it can be logged.
pub fn redact_database_url(database_url: &str) -> String {
    match database_url.rsplit_once('@') {
        Some((before, host)) => match before.split_once("://") {
            Some((scheme, _credentials)) => format!("{}://<hidden>@{}", scheme, host),
            None => format!("<hidden>@{}", host),
        },
        None => database_url.to_string(),
    }
}
