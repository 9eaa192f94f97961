use std::path::PathBuf;
use std::sync::Arc;

use airwatch::api::AppState;
use airwatch::config::AirWatchConfig;
use airwatch::ml::{FileArtifactLoader, ModelManifest, ModelRegistry};
use airwatch::upstream::{CityAirQuality, OpenAqClient, OpenMeteoClient, WaqiClient, http_client};
use airwatch::{VERSION, telemetry, web};
use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = AirWatchConfig::load_from_path(args.config)?;
    telemetry::init(&config.logging)?;
    info!("Starting AirWatch {VERSION} for {}", config.city.name);

    let registry = load_models(&config);
    let state = build_state(config, registry)?;
    web::run(state).await
}

/// Model problems never stop the service; it starts with whatever loaded
fn load_models(config: &AirWatchConfig) -> ModelRegistry {
    let manifest = match ModelManifest::load(config.manifest_path()) {
        Ok(manifest) => manifest,
        Err(e) => {
            warn!("Ignoring model manifest: {e}");
            return ModelRegistry::disabled();
        }
    };
    let registry = ModelRegistry::load(&manifest, &FileArtifactLoader);
    let status = registry.status();
    info!(
        no2 = status.no2_models_count,
        o3 = status.o3_models_count,
        "{}",
        status.message
    );
    registry
}

fn build_state(config: AirWatchConfig, registry: ModelRegistry) -> Result<AppState> {
    let upstream = &config.upstream;
    let city = &config.city;
    let http = http_client(upstream.timeout())?;

    let waqi = WaqiClient::new(
        http.clone(),
        &upstream.waqi_base_url,
        upstream.waqi_token.clone(),
        &city.feed,
        upstream.station_timeout(),
    );
    let open_meteo = OpenMeteoClient::new(
        http.clone(),
        &upstream.open_meteo_base_url,
        &upstream.open_meteo_air_quality_url,
        city.latitude,
        city.longitude,
    );
    let openaq = OpenAqClient::new(
        http,
        &upstream.openaq_base_url,
        upstream.openaq_api_key.clone(),
        &city.name,
        &city.country,
    );

    if upstream.waqi_token.is_none() {
        warn!("WAQI token not configured, live readings will fall back to mock data");
    }

    Ok(AppState {
        air_quality: Arc::new(CityAirQuality::new(waqi, open_meteo.clone())),
        weather: Arc::new(open_meteo),
        history: Arc::new(openaq),
        registry: Arc::new(registry),
        config: Arc::new(config),
    })
}
