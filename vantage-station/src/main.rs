use std::path::PathBuf;

use clap::Parser;
use tracing::{error, info, warn};

use vantage_station::config::{Config, TransportConfig};
use vantage_station::station::Station;
use vantage_station::transport::Transport;
use vantage_station::transport::mock::MockTransport;
use vantage_station::transport::tcp::TcpTransport;

#[derive(Parser)]
#[command(name = "vantage-station")]
#[command(about = "Davis Vantage LOOP telemetry driver")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "vantage-station.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter =
        std::env::var("RUST_LOG").unwrap_or_else(|_| "vantage_station=info".to_owned());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let cli = Cli::parse();

    let config = if cli.config.exists() {
        info!(path = ?cli.config, "Loading configuration");
        Config::load(&cli.config)?
    } else {
        info!("No configuration file found, using defaults");
        Config::default()
    };

    match &config.transport {
        TransportConfig::Tcp {
            addr,
            port,
            baudrate,
        } => {
            info!(%addr, port = ?port, baudrate = ?baudrate, "Using serial bridge transport");
            run_station(TcpTransport::new(*addr), &config).await
        }
        TransportConfig::Mock => {
            info!("Using mock console transport");
            run_station(MockTransport::new(), &config).await
        }
    }
}

async fn run_station<T: Transport>(transport: T, config: &Config) -> color_eyre::Result<()> {
    let mut station = Station::new(transport, config.station.loop_every());

    let mut connect_rx = station.subscribe_connect().await;
    let mut loop_rx = station.subscribe_loop().await;

    if let Err(e) = station.open().await {
        error!(error = %e, "Could not open the station link");
        return Err(e.into());
    }

    if let Some(event) = connect_rx.recv().await {
        match event.error {
            None => info!("Connected to the console"),
            Some(e) => warn!(error = %e, "Console connect reported an error"),
        }
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
            reading = loop_rx.recv() => {
                match reading {
                    Some(r) => {
                        info!(
                            reading_id = ?r.id,
                            barometer_hpa = r.barometer_hpa,
                            out_temperature_c = r.out_temperature_c,
                            out_humidity_pct = r.out_humidity_pct,
                            wind_speed_kmh = r.wind_speed_kmh,
                            wind_direction_deg = r.wind_direction_deg,
                            rain_rate_mm = r.rain_rate_mm,
                            forecast = r.forecast,
                            "Weather reading"
                        );
                    }
                    None => {
                        warn!("Reading stream ended");
                        break;
                    }
                }
            }
        }
    }

    station.close().await;
    info!("vantage-station shut down complete");
    Ok(())
}
