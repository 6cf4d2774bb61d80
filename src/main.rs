use std::sync::Arc;

use sealbox::{
    config::Config,
    crypto::{EnvelopeCrypto, MasterKey},
    grpc::start_grpc_server,
    observability::init_tracing,
    services::SecretsManager,
    storage::{create_pool, SecretsRepository},
    Result, APP_NAME, VERSION,
};
use tokio::signal;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (optional - won't fail if missing)
    // This must happen before any config is read from environment
    if let Err(e) = dotenvy::dotenv() {
        if !e.to_string().contains("not found") {
            eprintln!("Warning: Error loading .env file: {}", e);
        }
    }

    let config = Config::from_env()?;
    init_tracing(&config.observability)?;

    info!(
        app_name = APP_NAME,
        version = VERSION,
        "Starting sealbox secrets manager"
    );

    // Master key load failure is unrecoverable: no degraded mode exists.
    let master_key = Arc::new(MasterKey::load(&config.security.master_key_path)?);
    info!(
        path = %master_key.source_path().display(),
        version = master_key.version(),
        "Master key loaded"
    );

    info!("Creating database connection pool");
    let pool = create_pool(&config.database).await?;

    let crypto = EnvelopeCrypto::new(master_key);
    let repository = SecretsRepository::new(pool);
    let service = SecretsManager::new(crypto, repository);

    let shutdown = async {
        let _ = signal::ctrl_c().await;
        info!("Shutdown signal received");
    };

    start_grpc_server(&config.grpc, service, shutdown).await?;

    info!("sealbox stopped");
    Ok(())
}
