use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tft_lights_core::{
    AppConfig, HueBridge, LightingService, LoggingLights, SnapshotSource, TelemetryClient,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> tft_lights_core::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, dry_run } => run_monitor(config.as_deref(), dry_run).await,
        Commands::Probe { endpoint } => probe(endpoint).await,
        Commands::PrintConfig => print_config(),
    }
}

async fn run_monitor(path: Option<&Path>, dry_run: bool) -> tft_lights_core::Result<()> {
    let config = load_config(path)?;
    tracing::info!(endpoint = %config.telemetry.endpoint, dry_run, "starting monitor");

    let lights: Box<dyn LightingService> = match (&config.bridge, dry_run) {
        (Some(bridge), false) => {
            tracing::info!(address = %bridge.address, group = %bridge.group, "driving hue bridge");
            let (handle, _delivery) = HueBridge::new(bridge)?.spawn();
            Box::new(handle)
        }
        (None, false) => {
            tracing::warn!("no bridge configured, light commands will only be logged");
            Box::new(LoggingLights)
        }
        (_, true) => Box::new(LoggingLights),
    };

    let source = TelemetryClient::new(&config.telemetry)?;
    tft_lights_core::run(&config, source, lights).await
}

async fn probe(endpoint: Option<String>) -> tft_lights_core::Result<()> {
    let mut config = AppConfig::default().telemetry;
    if let Some(endpoint) = endpoint {
        config.endpoint = endpoint;
    }

    let mut client = TelemetryClient::new(&config)?;
    tracing::info!(endpoint = client.endpoint(), "fetching one snapshot");

    let snapshot = client.fetch().await?;
    let player = &snapshot.active_player;
    tracing::info!(
        mode = snapshot.mode().unwrap_or("<none>"),
        game_time = snapshot.game_time(),
        summoner = %player.summoner_name,
        level = player.level,
        health = player.health(),
        events = snapshot.raw_events().len(),
        players = snapshot.all_players.len(),
        "snapshot"
    );
    Ok(())
}

fn print_config() -> tft_lights_core::Result<()> {
    let rendered = serde_json::to_string_pretty(&AppConfig::default())?;
    println!("{rendered}");
    Ok(())
}

fn load_config(path: Option<&Path>) -> tft_lights_core::Result<AppConfig> {
    match path {
        Some(path) => {
            tracing::info!(?path, "loading configuration");
            AppConfig::load(path)
        }
        None => Ok(AppConfig::default()),
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Ambient room lighting driven by live TFT games", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Watch for games and drive the lights.
    Run {
        /// JSON configuration file. Defaults are used when omitted.
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Log light commands instead of sending them to the bridge.
        #[arg(long)]
        dry_run: bool,
    },
    /// Fetch a single snapshot from the live client endpoint and log it.
    Probe {
        /// Override the live client endpoint.
        #[arg(short, long)]
        endpoint: Option<String>,
    },
    /// Print the default configuration as JSON.
    PrintConfig,
}
