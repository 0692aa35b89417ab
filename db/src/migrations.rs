use sqlx::postgres::PgPool;
use sqlx::Executor;

use crate::error::{StoreError, StoreResult};

/// A schema script embedded at compile time.
#[derive(Debug, Clone, Copy)]
pub struct Migration {
    pub name: &'static str,
    pub sql: &'static str,
}

pub const RELATIONAL_MIGRATIONS: &[Migration] = &[Migration {
    name: "0001_relational",
    sql: include_str!("../migrations/0001_relational.sql"),
}];

pub const DOCUMENT_MIGRATIONS: &[Migration] = &[
    Migration {
        name: "0002_documents",
        sql: include_str!("../migrations/0002_documents.sql"),
    },
    Migration {
        name: "0003_document_keys",
        sql: include_str!("../migrations/0003_document_keys.sql"),
    },
];

/// Applies every migration not yet recorded in the `migrations` table, in
/// order.
pub async fn run_migrations(pool: &PgPool, migrations: &[Migration]) -> StoreResult<()> {
    init_migrations_tracker(pool).await?;

    for migration in migrations {
        if is_applied(pool, migration.name).await? {
            tracing::debug!("Migration {} already applied", migration.name);
            continue;
        }

        tracing::info!("Running migration: {}", migration.name);
        // Plain &str runs over the simple query protocol, which accepts
        // multi-statement scripts.
        pool.execute(migration.sql)
            .await
            .map_err(|source| StoreError::Migration {
                name: migration.name.to_string(),
                source,
            })?;
        record_migration(pool, migration.name).await?;
    }

    Ok(())
}

/// Create the table tracking applied migrations.
pub async fn init_migrations_tracker(pool: &PgPool) -> StoreResult<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS migrations (
            id SERIAL PRIMARY KEY,
            name VARCHAR(255) NOT NULL UNIQUE,
            applied_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn is_applied(pool: &PgPool, name: &str) -> StoreResult<bool> {
    let found: Option<i32> = sqlx::query_scalar("SELECT id FROM migrations WHERE name = $1")
        .bind(name)
        .fetch_optional(pool)
        .await?;
    Ok(found.is_some())
}

/// Record a migration as applied
pub async fn record_migration(pool: &PgPool, name: &str) -> StoreResult<()> {
    sqlx::query("INSERT INTO migrations (name) VALUES ($1) ON CONFLICT DO NOTHING")
        .bind(name)
        .execute(pool)
        .await?;

    Ok(())
}
