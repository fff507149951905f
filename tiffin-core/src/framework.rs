use sqlx::SqlitePool;
use sqlx::migrate::Migrator;

/// Embedded database migrations, run at startup with `--migrate`.
pub static MIGRATOR: Migrator = sqlx::migrate!("../migrations");

/// Executes entity commands and queries against the connection pool.
pub struct DatabaseProcessor {
    pub pool: SqlitePool,
}
