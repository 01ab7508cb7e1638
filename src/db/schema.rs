//! Table definitions and the startup check that creates or verifies them.
//!
//! Tables are created with `CREATE TABLE IF NOT EXISTS`; an existing table is
//! accepted when every expected column is present with the expected declared
//! type and the unique keys and CHECK clauses the data layer relies on are
//! in place. Extra columns are left alone. Nothing here drops or alters data.

use sea_orm::{
    ConnectionTrait, DatabaseConnection, DbBackend, DbErr, FromQueryResult, Statement,
};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("table `{table}` is missing column `{column}`")]
    MissingColumn { table: &'static str, column: &'static str },
    #[error("table `{table}` column `{column}` is declared `{found}`, expected `{expected}`")]
    ColumnType {
        table: &'static str,
        column: &'static str,
        expected: &'static str,
        found: String,
    },
    #[error("table `{table}` is missing constraint `{constraint}`")]
    MissingConstraint {
        table: &'static str,
        constraint: String,
    },
    #[error("schema statement failed: {0}")]
    Db(#[from] DbErr),
}

pub struct TableSpec {
    pub name: &'static str,
    pub columns: &'static [(&'static str, &'static str)],
    /// Column sets that must be covered by a full (non-partial) unique index
    /// or a non-rowid primary key. `ON CONFLICT` targets depend on them.
    pub unique_keys: &'static [&'static [&'static str]],
    /// CHECK expressions that must appear in the stored table definition,
    /// compared with whitespace removed and case folded.
    pub checks: &'static [&'static str],
    create: &'static str,
}

/// Ordered so that referenced tables are created first.
pub const TABLES: &[TableSpec] = &[
    TableSpec {
        name: "users",
        columns: &[
            ("id", "INTEGER"),
            ("username", "TEXT"),
            ("email", "TEXT"),
            ("password_hash", "TEXT"),
            ("display_name", "TEXT"),
            ("created_at", "TEXT"),
        ],
        unique_keys: &[&["username"], &["email"]],
        checks: &[],
        create: "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            username TEXT NOT NULL UNIQUE COLLATE NOCASE,
            email TEXT NOT NULL UNIQUE COLLATE NOCASE,
            password_hash TEXT NOT NULL,
            display_name TEXT,
            created_at TEXT NOT NULL
        )",
    },
    TableSpec {
        name: "categories",
        columns: &[("id", "INTEGER"), ("name", "TEXT"), ("slug", "TEXT")],
        unique_keys: &[&["name"], &["slug"]],
        checks: &[],
        create: "CREATE TABLE IF NOT EXISTS categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            slug TEXT NOT NULL UNIQUE
        )",
    },
    TableSpec {
        name: "listings",
        columns: &[
            ("id", "INTEGER"),
            ("owner_id", "INTEGER"),
            ("category_id", "INTEGER"),
            ("title", "TEXT"),
            ("description", "TEXT"),
            ("price_cents", "INTEGER"),
            ("condition", "TEXT"),
            ("color", "TEXT"),
            ("status", "TEXT"),
            ("created_at", "TEXT"),
        ],
        unique_keys: &[],
        checks: &[
            "price_cents >= 0",
            "status IN ('active', 'sold', 'removed')",
        ],
        create: "CREATE TABLE IF NOT EXISTS listings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            owner_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            category_id INTEGER NOT NULL REFERENCES categories(id) ON DELETE RESTRICT,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            price_cents INTEGER NOT NULL CHECK (price_cents >= 0),
            condition TEXT,
            color TEXT,
            status TEXT NOT NULL DEFAULT 'active'
                CHECK (status IN ('active', 'sold', 'removed')),
            created_at TEXT NOT NULL
        )",
    },
    TableSpec {
        name: "cart_items",
        columns: &[
            ("user_id", "INTEGER"),
            ("listing_id", "INTEGER"),
            ("quantity", "INTEGER"),
            ("added_at", "TEXT"),
        ],
        unique_keys: &[&["user_id", "listing_id"]],
        checks: &["quantity BETWEEN 1 AND 99"],
        create: "CREATE TABLE IF NOT EXISTS cart_items (
            user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            listing_id INTEGER NOT NULL REFERENCES listings(id) ON DELETE CASCADE,
            quantity INTEGER NOT NULL CHECK (quantity BETWEEN 1 AND 99),
            added_at TEXT NOT NULL,
            PRIMARY KEY (user_id, listing_id)
        )",
    },
    TableSpec {
        name: "seller_ratings",
        columns: &[
            ("id", "INTEGER"),
            ("rater_id", "INTEGER"),
            ("ratee_id", "INTEGER"),
            ("listing_id", "INTEGER"),
            ("score", "INTEGER"),
            ("comment", "TEXT"),
            ("created_at", "TEXT"),
        ],
        unique_keys: &[&["rater_id", "listing_id"]],
        checks: &["score BETWEEN 1 AND 5", "rater_id <> ratee_id"],
        create: "CREATE TABLE IF NOT EXISTS seller_ratings (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            rater_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            ratee_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
            listing_id INTEGER NOT NULL REFERENCES listings(id) ON DELETE CASCADE,
            score INTEGER NOT NULL CHECK (score BETWEEN 1 AND 5),
            comment TEXT,
            created_at TEXT NOT NULL,
            CHECK (rater_id <> ratee_id),
            UNIQUE (rater_id, listing_id)
        )",
    },
    TableSpec {
        name: "seed_flags",
        columns: &[("name", "TEXT"), ("applied_at", "TEXT")],
        unique_keys: &[&["name"]],
        checks: &[],
        create: "CREATE TABLE IF NOT EXISTS seed_flags (
            name TEXT PRIMARY KEY NOT NULL,
            applied_at TEXT NOT NULL
        )",
    },
];

const INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_listings_status_created ON listings (status, created_at)",
    "CREATE INDEX IF NOT EXISTS idx_listings_owner ON listings (owner_id)",
    "CREATE INDEX IF NOT EXISTS idx_listings_category ON listings (category_id)",
];

#[derive(Debug, FromQueryResult)]
struct ColumnInfo {
    name: String,
    column_type: String,
}

#[derive(Debug, FromQueryResult)]
struct IndexInfo {
    name: String,
    is_unique: i32,
    is_partial: i32,
}

#[derive(Debug, FromQueryResult)]
struct IndexColumn {
    name: Option<String>,
}

#[derive(Debug, FromQueryResult)]
struct TableSql {
    sql: Option<String>,
}

/// Creates missing tables and verifies existing ones. Safe on every start.
pub async fn ensure_schema(db: &DatabaseConnection) -> Result<(), SchemaError> {
    for table in TABLES {
        let existing = table_columns(db, table.name).await?;
        if existing.is_empty() {
            info!(table = table.name, "creating table");
            db.execute_unprepared(table.create).await?;
        } else {
            debug!(table = table.name, "verifying existing table");
            verify_columns(table, &existing)?;
            verify_unique_keys(db, table).await?;
            verify_checks(db, table).await?;
        }
    }

    for index in INDEXES {
        db.execute_unprepared(index).await?;
    }

    Ok(())
}

async fn table_columns(db: &DatabaseConnection, table: &str) -> Result<Vec<ColumnInfo>, DbErr> {
    ColumnInfo::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        "SELECT name, type AS column_type FROM pragma_table_info(?)",
        [table.into()],
    ))
    .all(db)
    .await
}

fn verify_columns(table: &TableSpec, existing: &[ColumnInfo]) -> Result<(), SchemaError> {
    for &(column, expected) in table.columns {
        let found = existing
            .iter()
            .find(|info| info.name.eq_ignore_ascii_case(column))
            .ok_or(SchemaError::MissingColumn {
                table: table.name,
                column,
            })?;

        if !found.column_type.trim().eq_ignore_ascii_case(expected) {
            return Err(SchemaError::ColumnType {
                table: table.name,
                column,
                expected,
                found: found.column_type.clone(),
            });
        }
    }
    Ok(())
}

async fn verify_unique_keys(db: &DatabaseConnection, table: &TableSpec) -> Result<(), SchemaError> {
    if table.unique_keys.is_empty() {
        return Ok(());
    }

    let indexes = IndexInfo::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        r#"SELECT name, "unique" AS is_unique, partial AS is_partial FROM pragma_index_list(?)"#,
        [table.name.into()],
    ))
    .all(db)
    .await?;

    let mut unique_sets: Vec<Vec<String>> = Vec::new();
    for index in indexes.iter().filter(|i| i.is_unique != 0 && i.is_partial == 0) {
        let columns = IndexColumn::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Sqlite,
            "SELECT name FROM pragma_index_info(?) ORDER BY seqno",
            [index.name.clone().into()],
        ))
        .all(db)
        .await?;
        // Expression columns come back without a name and can never match a key.
        let mut names: Vec<String> = columns
            .into_iter()
            .filter_map(|c| c.name.map(|n| n.to_ascii_lowercase()))
            .collect();
        names.sort();
        unique_sets.push(names);
    }

    for key in table.unique_keys {
        let mut wanted: Vec<String> = key.iter().map(|c| c.to_ascii_lowercase()).collect();
        wanted.sort();
        if !unique_sets.contains(&wanted) {
            return Err(SchemaError::MissingConstraint {
                table: table.name,
                constraint: format!("UNIQUE ({})", key.join(", ")),
            });
        }
    }
    Ok(())
}

async fn verify_checks(db: &DatabaseConnection, table: &TableSpec) -> Result<(), SchemaError> {
    if table.checks.is_empty() {
        return Ok(());
    }

    let stored = TableSql::find_by_statement(Statement::from_sql_and_values(
        DbBackend::Sqlite,
        "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?",
        [table.name.into()],
    ))
    .one(db)
    .await?
    .and_then(|row| row.sql)
    .map(|sql| squash(&sql))
    .unwrap_or_default();

    for check in table.checks {
        if !stored.contains(&squash(check)) {
            return Err(SchemaError::MissingConstraint {
                table: table.name,
                constraint: format!("CHECK ({check})"),
            });
        }
    }
    Ok(())
}

fn squash(sql: &str) -> String {
    sql.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use sea_orm::{ConnectionTrait, EntityTrait, PaginatorTrait};

    use super::{SchemaError, ensure_schema, squash, table_columns};
    use crate::{db::entities::category, test_helpers::memory_db};

    #[tokio::test]
    async fn creates_all_tables_and_is_idempotent() {
        let db = memory_db().await;

        ensure_schema(&db).await.expect("first run should succeed");
        db.execute_unprepared(
            "INSERT INTO categories (name, slug) VALUES ('Books', 'books')",
        )
        .await
        .expect("insert should succeed");
        ensure_schema(&db).await.expect("second run should succeed");

        let columns = table_columns(&db, "cart_items")
            .await
            .expect("pragma should succeed");
        assert_eq!(columns.len(), 4);

        let categories = category::Entity::find()
            .count(&db)
            .await
            .expect("count should succeed");
        assert_eq!(categories, 1);
    }

    #[tokio::test]
    async fn tolerates_extra_columns() {
        let db = memory_db().await;
        db.execute_unprepared(
            "CREATE TABLE seed_flags (name TEXT PRIMARY KEY, applied_at TEXT NOT NULL, note TEXT)",
        )
        .await
        .expect("create should succeed");

        ensure_schema(&db).await.expect("extra column is compatible");
    }

    #[tokio::test]
    async fn reports_incompatible_column_type() {
        let db = memory_db().await;
        db.execute_unprepared(
            "CREATE TABLE categories (id INTEGER PRIMARY KEY, name TEXT, slug INTEGER)",
        )
        .await
        .expect("create should succeed");

        let err = ensure_schema(&db)
            .await
            .expect_err("conflicting table should fail");
        assert!(matches!(
            err,
            SchemaError::ColumnType { table: "categories", column: "slug", .. }
        ));
    }

    #[tokio::test]
    async fn reports_missing_column() {
        let db = memory_db().await;
        db.execute_unprepared("CREATE TABLE seed_flags (name TEXT PRIMARY KEY)")
            .await
            .expect("create should succeed");

        let err = ensure_schema(&db)
            .await
            .expect_err("missing column should fail");
        assert!(matches!(
            err,
            SchemaError::MissingColumn { table: "seed_flags", column: "applied_at" }
        ));
    }

    #[tokio::test]
    async fn reports_cart_table_without_its_key() {
        let db = memory_db().await;
        db.execute_unprepared(
            "CREATE TABLE cart_items (
                user_id INTEGER NOT NULL,
                listing_id INTEGER NOT NULL,
                quantity INTEGER NOT NULL CHECK (quantity BETWEEN 1 AND 99),
                added_at TEXT NOT NULL
            )",
        )
        .await
        .expect("create should succeed");

        let err = ensure_schema(&db)
            .await
            .expect_err("keyless cart table should fail");
        match err {
            SchemaError::MissingConstraint { table, constraint } => {
                assert_eq!(table, "cart_items");
                assert_eq!(constraint, "UNIQUE (user_id, listing_id)");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn accepts_cart_key_declared_as_unique_index() {
        let db = memory_db().await;
        db.execute_unprepared(
            "CREATE TABLE cart_items (
                user_id INTEGER NOT NULL,
                listing_id INTEGER NOT NULL,
                quantity INTEGER NOT NULL CHECK (quantity BETWEEN 1 AND 99),
                added_at TEXT NOT NULL
            )",
        )
        .await
        .expect("create should succeed");
        db.execute_unprepared(
            "CREATE UNIQUE INDEX cart_items_owner ON cart_items (listing_id, user_id)",
        )
        .await
        .expect("index should succeed");

        ensure_schema(&db).await.expect("unique index covers the key");
    }

    #[tokio::test]
    async fn reports_rating_table_without_self_rating_check() {
        let db = memory_db().await;
        db.execute_unprepared(
            "CREATE TABLE seller_ratings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                rater_id INTEGER NOT NULL,
                ratee_id INTEGER NOT NULL,
                listing_id INTEGER NOT NULL,
                score INTEGER NOT NULL CHECK (score BETWEEN 1 AND 5),
                comment TEXT,
                created_at TEXT NOT NULL,
                UNIQUE (rater_id, listing_id)
            )",
        )
        .await
        .expect("create should succeed");

        let err = ensure_schema(&db)
            .await
            .expect_err("missing check should fail");
        assert!(matches!(
            err,
            SchemaError::MissingConstraint { table: "seller_ratings", ref constraint }
                if constraint == "CHECK (rater_id <> ratee_id)"
        ));
    }

    #[test]
    fn squash_ignores_spacing_and_case() {
        assert_eq!(squash("CHECK (Score  BETWEEN 1\n AND 5)"), "check(scorebetween1and5)");
    }
}
