use std::time::Duration;

use anyhow::{Context, Result};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use tracing::info;

use super::schema;
use crate::config::DatabaseConfig;

/// Opens the pool and makes sure every table exists.
pub async fn connect(cfg: &DatabaseConfig) -> Result<DatabaseConnection> {
    let db = open(cfg).await?;

    info!("ensuring database schema");
    schema::ensure_schema(&db)
        .await
        .context("database schema is incompatible")?;
    Ok(db)
}

/// sqlx opens every pooled SQLite connection with `foreign_keys = ON` and a
/// five second busy timeout, so there are no per-connection pragmas to run.
pub async fn open(cfg: &DatabaseConfig) -> Result<DatabaseConnection> {
    let mut options = ConnectOptions::new(cfg.url.clone());
    options
        .max_connections(cfg.max_connections)
        .min_connections(cfg.min_idle)
        .connect_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let db = Database::connect(options)
        .await
        .with_context(|| format!("failed to connect to {}", cfg.url))?;
    Ok(db)
}

#[cfg(test)]
mod tests {
    use sea_orm::{ConnectionTrait, DbBackend, FromQueryResult, Statement};

    use crate::test_helpers::TempDatabase;

    #[derive(Debug, FromQueryResult)]
    struct ForeignKeys {
        foreign_keys: i32,
    }

    #[tokio::test]
    async fn every_pooled_connection_enforces_foreign_keys() {
        let file = TempDatabase::new();
        let db = file.open(3).await;

        let (a, b, c) = tokio::join!(
            db.execute_unprepared("INSERT INTO cart_items (user_id, listing_id, quantity, added_at) VALUES (1, 1, 1, '')"),
            db.execute_unprepared("INSERT INTO cart_items (user_id, listing_id, quantity, added_at) VALUES (2, 2, 1, '')"),
            ForeignKeys::find_by_statement(Statement::from_string(
                DbBackend::Sqlite,
                "PRAGMA foreign_keys",
            ))
            .one(&db),
        );

        assert!(a.is_err(), "dangling user/listing must be rejected");
        assert!(b.is_err(), "dangling user/listing must be rejected");
        let pragma = c.expect("pragma query").expect("pragma row");
        assert_eq!(pragma.foreign_keys, 1);
    }
}
