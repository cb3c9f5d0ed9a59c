//! Channels repository

use sqlx::PgConnection;

use crate::db::models::NewChannel;
use crate::models::LogoUpdate;

/// Insert or update a channel by name
pub async fn upsert(conn: &mut PgConnection, channel: &NewChannel) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO channels (name, logo_path, category, image_urls)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (name) DO UPDATE SET
            logo_path = EXCLUDED.logo_path,
            category = EXCLUDED.category,
            image_urls = EXCLUDED.image_urls
        "#,
    )
    .bind(&channel.name)
    .bind(&channel.logo_path)
    .bind(&channel.category)
    .bind(&channel.image_urls)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Bulk upsert channels on one connection
pub async fn upsert_many(conn: &mut PgConnection, channels: &[NewChannel]) -> Result<u64, sqlx::Error> {
    let mut affected = 0;
    for channel in channels {
        affected += upsert(&mut *conn, channel).await?;
    }
    Ok(affected)
}

/// Set the logo of an existing channel; returns false when no channel has that name
pub async fn update_logo(conn: &mut PgConnection, update: &LogoUpdate) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
        UPDATE channels
        SET logo_path = $2, image_urls = $2
        WHERE name = $1
        "#,
    )
    .bind(&update.name)
    .bind(&update.logo_url)
    .execute(conn)
    .await?;

    Ok(result.rows_affected() > 0)
}
