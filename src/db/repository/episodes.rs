//! Episodes repository

use sqlx::PgConnection;

use crate::db::models::NewEpisode;

/// Insert or update an episode by (series_id, season_id, episode_number)
pub async fn upsert(conn: &mut PgConnection, episode: &NewEpisode) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO episodes (id, series_id, season_id, episode_number, name, overview,
                              air_date, runtime, still_path, vote_average, vote_count, image_urls)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
        ON CONFLICT (series_id, season_id, episode_number) DO UPDATE SET
            id = EXCLUDED.id,
            name = EXCLUDED.name,
            overview = EXCLUDED.overview,
            air_date = EXCLUDED.air_date,
            runtime = EXCLUDED.runtime,
            still_path = EXCLUDED.still_path,
            vote_average = EXCLUDED.vote_average,
            vote_count = EXCLUDED.vote_count,
            image_urls = EXCLUDED.image_urls
        "#,
    )
    .bind(episode.id)
    .bind(episode.series_id)
    .bind(episode.season_id)
    .bind(episode.episode_number)
    .bind(&episode.name)
    .bind(&episode.overview)
    .bind(episode.air_date)
    .bind(episode.runtime)
    .bind(&episode.still_path)
    .bind(episode.vote_average)
    .bind(episode.vote_count)
    .bind(&episode.image_urls)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Bulk upsert episodes on one connection
pub async fn upsert_many(conn: &mut PgConnection, episodes: &[NewEpisode]) -> Result<u64, sqlx::Error> {
    let mut affected = 0;
    for episode in episodes {
        affected += upsert(&mut *conn, episode).await?;
    }
    Ok(affected)
}
