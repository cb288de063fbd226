use crate::monitor::error::{MonitorError, MonitorResult};
use crate::types::{MonitorConfig, Venue};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;
use tracing::info;
use url::Url;

#[derive(Debug, Deserialize)]
struct RawConfig {
    monitor: RawMonitorConfig,
    #[allow(dead_code)]
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Deserialize)]
struct RawMonitorConfig {
    grpc_endpoint: String,
    grpc_x_token: Option<String>,
    rpc_endpoints: Vec<String>,
    venues: Option<Vec<String>>,
    connection_timeout_secs: Option<u64>,
    max_reconnect_attempts: Option<u32>,
    use_confirmed_commitment: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct LoggingConfig {
    #[allow(dead_code)]
    level: Option<String>,
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> MonitorResult<MonitorConfig> {
    info!("Loading configuration from {:?}", path.as_ref());

    let config = Config::builder()
        .add_source(File::from(path.as_ref()))
        .build()
        .map_err(|e| MonitorError::ConfigError(format!("Failed to load config: {}", e)))?;

    let raw: RawConfig = config
        .try_deserialize()
        .map_err(|e| MonitorError::ConfigError(format!("Failed to parse config: {}", e)))?;

    validate_http_endpoint(&raw.monitor.grpc_endpoint, "gRPC endpoint")?;

    if raw.monitor.rpc_endpoints.is_empty() {
        return Err(MonitorError::ConfigError(
            "At least one RPC endpoint is required".to_string(),
        ));
    }
    for endpoint in &raw.monitor.rpc_endpoints {
        validate_http_endpoint(endpoint, "RPC endpoint")?;
    }

    let venues = match &raw.monitor.venues {
        Some(names) => {
            let mut venues = Vec::with_capacity(names.len());
            for name in names {
                let venue: Venue = name
                    .parse()
                    .map_err(|e| MonitorError::ConfigError(format!("Invalid venue: {}", e)))?;
                if !venues.contains(&venue) {
                    venues.push(venue);
                }
            }
            if venues.is_empty() {
                return Err(MonitorError::ConfigError(
                    "At least one venue is required".to_string(),
                ));
            }
            venues
        }
        None => Venue::all().to_vec(),
    };

    let monitor_config = MonitorConfig {
        grpc_endpoint: raw.monitor.grpc_endpoint,
        grpc_x_token: raw.monitor.grpc_x_token,
        rpc_endpoints: raw.monitor.rpc_endpoints,
        venues,
        connection_timeout_secs: raw.monitor.connection_timeout_secs.unwrap_or(30),
        max_reconnect_attempts: raw.monitor.max_reconnect_attempts.unwrap_or(5),
        use_confirmed_commitment: raw.monitor.use_confirmed_commitment.unwrap_or(true),
    };

    info!("Configuration loaded successfully");
    info!("gRPC endpoint: {}", monitor_config.grpc_endpoint);
    info!("RPC endpoints: {:?}", monitor_config.rpc_endpoints);
    info!("Enabled venues: {:?}", monitor_config.venues);

    Ok(monitor_config)
}

fn validate_http_endpoint(endpoint: &str, label: &str) -> MonitorResult<()> {
    let url = Url::parse(endpoint)
        .map_err(|e| MonitorError::ConfigError(format!("Invalid {}: {}", label, e)))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(MonitorError::ConfigError(format!(
            "Invalid {} (must use http:// or https://): {}",
            label, endpoint
        )));
    }
    Ok(())
}

/// Create a default configuration file
pub fn create_default_config<P: AsRef<Path>>(path: P) -> MonitorResult<()> {
    let default_config = r#"[monitor]
# Yellowstone geyser gRPC endpoint for the live stream
grpc_endpoint = "https://YOUR_GEYSER_ENDPOINT:10000"

# Optional x-token for the gRPC endpoint
# grpc_x_token = "YOUR_X_TOKEN"

# List of RPC endpoints (for historical backfill and failover)
rpc_endpoints = [
    "https://api.mainnet-beta.solana.com"
]

# Venues to decode. Omit to enable all of them.
venues = [
    "pump_fun",
    "raydium_v4",
    "raydium_cpmm",
    "raydium_launchpad",
    "meteora_dbc",
    "pump_swap"
]

# Connection timeout in seconds
connection_timeout_secs = 30

# Maximum number of reconnection attempts
max_reconnect_attempts = 5

# Use "confirmed" commitment level (faster) instead of "finalized" (safer)
use_confirmed_commitment = true

[logging]
# Logging level: trace, debug, info, warn, error
level = "info"
"#;

    std::fs::write(path.as_ref(), default_config)
        .map_err(|e| MonitorError::ConfigError(format!("Failed to write config file: {}", e)))?;

    info!("Created default config file at {:?}", path.as_ref());
    Ok(())
}
