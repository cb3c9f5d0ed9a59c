//! Movies repository

use sqlx::PgConnection;

use crate::db::models::NewMovie;

/// Insert or update a movie by remote id
pub async fn upsert(conn: &mut PgConnection, movie: &NewMovie) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
        INSERT INTO movies (id, title, overview, poster_path, backdrop_path, release_date,
                            vote_average, vote_count, genre_ids, adult, original_language,
                            original_title, popularity, video, image_urls)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        ON CONFLICT (id) DO UPDATE SET
            title = EXCLUDED.title,
            overview = EXCLUDED.overview,
            poster_path = EXCLUDED.poster_path,
            backdrop_path = EXCLUDED.backdrop_path,
            release_date = EXCLUDED.release_date,
            vote_average = EXCLUDED.vote_average,
            vote_count = EXCLUDED.vote_count,
            genre_ids = EXCLUDED.genre_ids,
            adult = EXCLUDED.adult,
            original_language = EXCLUDED.original_language,
            original_title = EXCLUDED.original_title,
            popularity = EXCLUDED.popularity,
            video = EXCLUDED.video,
            image_urls = EXCLUDED.image_urls
        "#,
    )
    .bind(movie.id)
    .bind(&movie.title)
    .bind(&movie.overview)
    .bind(&movie.poster_path)
    .bind(&movie.backdrop_path)
    .bind(movie.release_date)
    .bind(movie.vote_average)
    .bind(movie.vote_count)
    .bind(&movie.genre_ids)
    .bind(movie.adult)
    .bind(&movie.original_language)
    .bind(&movie.original_title)
    .bind(movie.popularity)
    .bind(movie.video)
    .bind(&movie.image_urls)
    .execute(conn)
    .await?;

    Ok(result.rows_affected())
}

/// Bulk upsert movies on one connection
pub async fn upsert_many(conn: &mut PgConnection, movies: &[NewMovie]) -> Result<u64, sqlx::Error> {
    let mut affected = 0;
    for movie in movies {
        affected += upsert(&mut *conn, movie).await?;
    }
    Ok(affected)
}
