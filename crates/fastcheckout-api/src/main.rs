use fastcheckout_api::{constants::SERVICE_NAME, setup};
use fastcheckout_core::Config;
use fastcheckout_infra::init_telemetry;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    init_telemetry(SERVICE_NAME, &config.environment, config.is_production())?;
    tracing::info!("Configuration loaded and validated successfully");

    let (_state, router) = setup::initialize_app(config.clone()).await?;

    setup::server::start_server(&config, router).await?;

    Ok(())
}
