//! Sync cache repository

use sqlx::PgPool;

use crate::db::models::SyncCacheRow;

/// Fetch one cache row by key
pub async fn get(pool: &PgPool, key: &str) -> Result<Option<SyncCacheRow>, sqlx::Error> {
    let row = sqlx::query_as::<_, SyncCacheRow>(
        "SELECT key, timestamp, data FROM sync_cache WHERE key = $1",
    )
    .bind(key)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Insert or replace a cache row
pub async fn put(pool: &PgPool, key: &str, timestamp: i64, data: &str) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO sync_cache (key, timestamp, data)
        VALUES ($1, $2, $3)
        ON CONFLICT (key) DO UPDATE SET
            timestamp = EXCLUDED.timestamp,
            data = EXCLUDED.data
        "#,
    )
    .bind(key)
    .bind(timestamp)
    .bind(data)
    .execute(pool)
    .await?;

    Ok(())
}
