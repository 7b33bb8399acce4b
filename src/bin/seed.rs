/*!
Replaces the course catalog with the bundled sample courses (`seed/courses.json`).

Reads the same environment as the server (`DATABASE_URL` and `.env`), applies
pending migrations, then clears and repopulates the `courses` table. Users and
enquiries are left alone.
*/

use coaching_portal::{
    AppConfig, bootstrap,
    repository::{PostgresRepository, Repository},
};
use sqlx::postgres::PgPoolOptions;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coaching_portal=info,seed=info".into()),
        )
        .init();

    let config = AppConfig::load();

    let pool = match PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.db_url)
        .await
    {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("could not connect to Postgres: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
        tracing::error!("migrations failed: {}", e);
        return ExitCode::FAILURE;
    }

    let courses = match bootstrap::sample_courses() {
        Ok(courses) => courses,
        Err(e) => {
            tracing::error!("seed/courses.json is malformed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let repo = PostgresRepository::new(pool);
    match bootstrap::seed_courses(&repo as &dyn Repository, courses).await {
        Ok(count) => {
            tracing::info!("seeded {} courses", count);
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!("seeding failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
