pub mod config;
pub mod events;
pub mod station;
pub mod transport;

pub use config::{Config, StationConfig, TransportConfig, Units};
pub use events::{ConnectEvent, EventBus};
pub use station::{LinkState, Station, StationError};
pub use transport::mock::{MockHandle, MockTransport};
pub use transport::tcp::TcpTransport;
pub use transport::{Transport, TransportError};
