use anyhow::{Context, Result};
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use std::env;
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    dotenvy::dotenv().ok();

    let database_url =
        env::var("DATABASE_URL").context("DATABASE_URL environment variable is required")?;

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("up");

    match command {
        "up" => {
            info!("Running database migrations...");
            MIGRATOR
                .run(&pool)
                .await
                .context("Failed to run migrations")?;
            info!("Database migrations completed");
        }
        "status" => {
            let applied: Vec<(i64,)> =
                sqlx::query_as("SELECT version FROM _sqlx_migrations ORDER BY version")
                    .fetch_all(&pool)
                    .await
                    .unwrap_or_default();
            let applied: Vec<i64> = applied.into_iter().map(|(v,)| v).collect();

            for migration in MIGRATOR.iter() {
                let state = if applied.contains(&migration.version) {
                    "applied"
                } else {
                    "pending"
                };
                println!(
                    "{:>14}  {:<40} {}",
                    migration.version, migration.description, state
                );
            }
        }
        _ => {
            eprintln!("Usage: migrate [up|status]");
            eprintln!("  up      - Run all pending migrations (default)");
            eprintln!("  status  - Show migration status");
            std::process::exit(1);
        }
    }

    Ok(())
}
