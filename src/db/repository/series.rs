//! TV series repository

use sqlx::{PgConnection, PgPool};

use crate::db::models::NewSeries;

/// Insert or update a series by remote id
pub async fn upsert(conn: &mut PgConnection, series: &NewSeries) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO tv_series (id, name, overview, poster_path, backdrop_path, first_air_date,
                               vote_average, vote_count, genre_ids, adult, original_language,
                               original_name, popularity, origin_country, image_urls)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name,
            overview = EXCLUDED.overview,
            poster_path = EXCLUDED.poster_path,
            backdrop_path = EXCLUDED.backdrop_path,
            first_air_date = EXCLUDED.first_air_date,
            vote_average = EXCLUDED.vote_average,
            vote_count = EXCLUDED.vote_count,
            genre_ids = EXCLUDED.genre_ids,
            adult = EXCLUDED.adult,
            original_language = EXCLUDED.original_language,
            original_name = EXCLUDED.original_name,
            popularity = EXCLUDED.popularity,
            origin_country = EXCLUDED.origin_country,
            image_urls = EXCLUDED.image_urls
        "#,
    )
    .bind(series.id)
    .bind(&series.name)
    .bind(&series.overview)
    .bind(&series.poster_path)
    .bind(&series.backdrop_path)
    .bind(series.first_air_date)
    .bind(series.vote_average)
    .bind(series.vote_count)
    .bind(&series.genre_ids)
    .bind(series.adult)
    .bind(&series.original_language)
    .bind(&series.original_name)
    .bind(series.popularity)
    .bind(&series.origin_country)
    .bind(&series.image_urls)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Bulk upsert series on one connection
pub async fn upsert_many(conn: &mut PgConnection, series_list: &[NewSeries]) -> Result<u64, sqlx::Error> {
    let mut affected = 0;
    for series in series_list {
        affected += upsert(&mut *conn, series).await?;
    }
    Ok(affected)
}

/// Ids of stored series, most popular first
pub async fn list_ids(pool: &PgPool, limit: i64) -> Result<Vec<i64>, sqlx::Error> {
    let ids = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT id FROM tv_series
        ORDER BY popularity DESC, id
        LIMIT $1
        "#,
    )
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(ids)
}
