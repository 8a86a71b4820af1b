use color_eyre::eyre::Result;
use dotenv::dotenv;
use slotbook_api::{config::ApiConfig, init_tracing, start_server};
use slotbook_db::{create_pool, schema::initialize_database};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv().ok();

    let config = ApiConfig::from_env()?;
    init_tracing(config.log_level)?;

    let db_pool = create_pool(&config.database_url, config.database_max_connections).await?;

    // Statements are idempotent, so every boot brings the schema up to date.
    initialize_database(&db_pool).await?;

    start_server(config, db_pool).await?;

    Ok(())
}
