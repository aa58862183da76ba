use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "fastcheckout=debug,tower_http=debug";

/// Installs the global subscriber: `RUST_LOG` filter (or a debug default for our
/// crates) and a fmt layer, JSON encoded when `json` is set.
pub fn init_telemetry(service_name: &str, environment: &str, json: bool) -> anyhow::Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json());
    let pretty_layer = (!json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(pretty_layer)
        .try_init()?;

    tracing::info!(
        service = service_name,
        environment = environment,
        json_logs = json,
        "Telemetry initialized"
    );
    Ok(())
}
