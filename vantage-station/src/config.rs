use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub station: StationConfig,
    pub transport: TransportConfig,
}

#[derive(Debug, Deserialize)]
pub struct StationConfig {
    /// Milliseconds between automatic `LOOP 1` polls; 0 disables polling.
    pub loop_every_ms: u64,
    /// Unit system for emitted readings.
    pub units: Units,
}

/// Only metric output is supported; any other value fails at load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Metric,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TransportConfig {
    Tcp {
        /// Address of the serial bridge exposing the console's port.
        addr: SocketAddr,
        /// Device node behind the bridge; informational.
        port: Option<String>,
        /// Baud rate configured on the bridge; informational.
        baudrate: Option<u32>,
    },
    /// Simulated console; answers every poll with a synthesized packet.
    Mock,
}

impl Config {
    pub fn load(path: &Path) -> color_eyre::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            station: StationConfig {
                loop_every_ms: 2500,
                units: Units::Metric,
            },
            transport: TransportConfig::Tcp {
                addr: "127.0.0.1:4001".parse().unwrap(),
                port: Some("/dev/ttyUSB0".to_string()),
                baudrate: Some(19200),
            },
        }
    }
}

impl StationConfig {
    pub fn loop_every(&self) -> Duration {
        Duration::from_millis(self.loop_every_ms)
    }
}
