use parcel_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (telemetry, storage, routes)
    let (_state, router) = parcel_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    parcel_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
