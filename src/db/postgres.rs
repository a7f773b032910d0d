use sqlx::{postgres::PgPoolOptions, PgPool};

/// Connection pool for the search/interaction store. Five connections
/// cover the request handlers plus the background feed refresh tasks.
pub async fn create_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(pool)
}
