//! Seasons repository

use sqlx::PgConnection;

use crate::db::models::NewSeason;

/// Insert or update a season by (series_id, season_number)
///
/// The remote id is overwritten too; episodes follow it through
/// `ON UPDATE CASCADE`. A row elsewhere that still holds the id is removed first.
pub async fn upsert(conn: &mut PgConnection, season: &NewSeason) -> Result<u64, sqlx::Error> {
    sqlx::query(
        r#"
        DELETE FROM seasons
        WHERE id = $1 AND NOT (series_id = $2 AND season_number = $3)
        "#,
    )
    .bind(season.id)
    .bind(season.series_id)
    .bind(season.season_number)
    .execute(&mut *conn)
    .await?;

    let result = sqlx::query(
        r#"
        INSERT INTO seasons (id, series_id, season_number, name, overview, air_date,
                             episode_count, poster_path, vote_average, image_urls)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        ON CONFLICT (series_id, season_number) DO UPDATE SET
            id = EXCLUDED.id,
            name = EXCLUDED.name,
            overview = EXCLUDED.overview,
            air_date = EXCLUDED.air_date,
            episode_count = EXCLUDED.episode_count,
            poster_path = EXCLUDED.poster_path,
            vote_average = EXCLUDED.vote_average,
            image_urls = EXCLUDED.image_urls
        "#,
    )
    .bind(season.id)
    .bind(season.series_id)
    .bind(season.season_number)
    .bind(&season.name)
    .bind(&season.overview)
    .bind(season.air_date)
    .bind(season.episode_count)
    .bind(&season.poster_path)
    .bind(season.vote_average)
    .bind(&season.image_urls)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Bulk upsert seasons on one connection
pub async fn upsert_many(conn: &mut PgConnection, seasons: &[NewSeason]) -> Result<u64, sqlx::Error> {
    let mut affected = 0;
    for season in seasons {
        affected += upsert(&mut *conn, season).await?;
    }
    Ok(affected)
}
