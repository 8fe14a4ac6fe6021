use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use ulid::Ulid;

use vantage_core::{
    FrameAssembler, LoopPacket, LoopVariant, Measurement, ReadingId, WeatherReading,
};

use crate::events::{ConnectEvent, EventBus};
use crate::transport::{Transport, TransportError};

const LOOP_COMMAND: &str = "LOOP 1";
const DUMP_COMMAND: &str = "DMP";

/// Connection state of the station link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Debug, thiserror::Error)]
pub enum StationError {
    #[error("station is not connected")]
    NotConnected,

    #[error("station is already connected")]
    AlreadyConnected,

    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
}

/// Owns the serial transport and drives one LOOP session: opening the
/// link, polling the console, decoding incoming frames and fanning
/// readings out to subscribers.
///
/// The transport handle is exclusive to this station; nothing else
/// reads or writes it.
pub struct Station<T: Transport> {
    transport: Arc<Mutex<T>>,
    loop_every: Duration,
    state: StateCell,
    events: EventBus,
    cancel: CancellationToken,
}

impl<T: Transport> Station<T> {
    /// `loop_every` is the automatic polling period; zero disables
    /// polling and leaves `LOOP 1` requests to the caller.
    pub fn new(transport: T, loop_every: Duration) -> Self {
        Self {
            transport: Arc::new(Mutex::new(transport)),
            loop_every,
            state: StateCell::default(),
            events: EventBus::new(),
            cancel: CancellationToken::new(),
        }
    }

    pub async fn state(&self) -> LinkState {
        self.state.get().await
    }

    /// Subscribe to link-attempt outcomes.
    pub async fn subscribe_connect(&self) -> mpsc::Receiver<ConnectEvent> {
        self.events.subscribe_connect().await
    }

    /// Subscribe to decoded weather readings.
    pub async fn subscribe_loop(&self) -> mpsc::Receiver<WeatherReading> {
        self.events.subscribe_loop().await
    }

    /// Open the link and start the session.
    ///
    /// On success the packet pump starts and, with a non-zero polling
    /// period, so does the poller. The outcome is also delivered to
    /// connect subscribers, carrying the error when the open failed.
    pub async fn open(&mut self) -> Result<(), StationError> {
        if self.state.get().await != LinkState::Disconnected {
            return Err(StationError::AlreadyConnected);
        }
        self.state.set(LinkState::Connecting).await;

        // Fresh token per session so a reopened station is not already
        // cancelled by an earlier close().
        self.cancel = CancellationToken::new();

        let opened = {
            let mut transport = self.transport.lock().await;
            transport.open(self.cancel.clone()).await
        };

        let chunk_rx = match opened {
            Ok(rx) => rx,
            Err(e) => {
                self.state.set(LinkState::Disconnected).await;
                let message = e.to_string();
                warn!(error = %message, "Failed to open station link");
                self.events
                    .emit_connect(ConnectEvent {
                        error: Some(message.into()),
                    })
                    .await;
                return Err(e.into());
            }
        };

        self.state.set(LinkState::Connected).await;
        info!("Station link established");

        tokio::spawn(run_pump(
            chunk_rx,
            self.events.clone(),
            self.state.clone(),
            self.cancel.clone(),
        ));

        if !self.loop_every.is_zero() {
            tokio::spawn(run_poller(
                Arc::clone(&self.transport),
                self.loop_every,
                self.state.clone(),
                self.cancel.clone(),
            ));
        }

        self.events.emit_connect(ConnectEvent { error: None }).await;
        Ok(())
    }

    /// Tear the session down: the poller and pump stop before the
    /// transport is released, and no events are delivered afterwards.
    /// Safe to call when already disconnected.
    pub async fn close(&mut self) {
        self.cancel.cancel();
        self.state.set(LinkState::Disconnected).await;
        info!("Station session closed");
    }

    /// Send a console command, newline-terminated.
    pub async fn send_command(&self, command: &str) -> Result<(), StationError> {
        if self.state.get().await != LinkState::Connected {
            return Err(StationError::NotConnected);
        }

        let mut transport = self.transport.lock().await;
        if let Err(e) = transport.write(&command_bytes(command)).await {
            error!(error = %e, command, "Write to station link failed");
            self.state.set(LinkState::Disconnected).await;
            self.cancel.cancel();
            return Err(e.into());
        }
        Ok(())
    }

    /// Switch the console lamp on or off.
    pub async fn set_lamp(&self, on: bool) -> Result<(), StationError> {
        self.send_command(if on { "LAMPS 1" } else { "LAMPS 0" }).await
    }

    /// Request a single LOOP packet.
    pub async fn request_loop(&self) -> Result<(), StationError> {
        self.send_command(LOOP_COMMAND).await
    }

    /// Request an archive dump. Decoding the response is not handled by
    /// this driver.
    pub async fn request_dump(&self) -> Result<(), StationError> {
        self.send_command(DUMP_COMMAND).await
    }
}

/// Link state shared with the background tasks.
#[derive(Clone, Default)]
struct StateCell(Arc<Mutex<LinkState>>);

impl StateCell {
    async fn get(&self) -> LinkState {
        *self.0.lock().await
    }

    async fn set(&self, state: LinkState) {
        *self.0.lock().await = state;
    }
}

fn command_bytes(command: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(command.len() + 1);
    bytes.extend_from_slice(command.as_bytes());
    bytes.push(b'\n');
    bytes
}

/// Reassemble, classify, decode, convert and emit. Everything runs in
/// this one task, so readings go out strictly in transport-delivery
/// order.
async fn run_pump(
    mut chunk_rx: mpsc::Receiver<Vec<u8>>,
    events: EventBus,
    state: StateCell,
    cancel: CancellationToken,
) {
    let mut assembler = FrameAssembler::new();
    info!("Packet pump started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Packet pump shutting down");
                break;
            }
            chunk = chunk_rx.recv() => {
                let Some(chunk) = chunk else {
                    warn!("Transport stream ended");
                    state.set(LinkState::Disconnected).await;
                    cancel.cancel();
                    break;
                };

                assembler.push(&chunk);
                while let Some(frame) = assembler.next_frame() {
                    let Some(variant) = LoopVariant::classify(&frame) else {
                        continue;
                    };
                    match LoopPacket::from_bytes(&frame, variant) {
                        Ok(packet) => {
                            events.emit_loop(convert_reading(&packet)).await;
                        }
                        Err(e) => {
                            // Classification passed, so this is a decoder
                            // defect, not bad wire data.
                            error!(error = ?e, ?variant, "LOOP frame failed to decode");
                        }
                    }
                }
            }
        }
    }
}

/// Issue `LOOP 1` on every tick until the session ends.
async fn run_poller<T: Transport>(
    transport: Arc<Mutex<T>>,
    every: Duration,
    state: StateCell,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(every);
    info!(every_ms = every.as_millis() as u64, "Loop poller started");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Loop poller shutting down");
                break;
            }
            _ = interval.tick() => {
                let mut transport = transport.lock().await;
                if let Err(e) = transport.write(&command_bytes(LOOP_COMMAND)).await {
                    error!(error = %e, "Failed to request loop packet");
                    state.set(LinkState::Disconnected).await;
                    cancel.cancel();
                    break;
                }
            }
        }
    }
}

/// Convert a raw packet into a metric reading, stamped with the capture
/// instant. Humidities, wind direction and the forecast code pass
/// through unconverted.
fn convert_reading(packet: &LoopPacket) -> WeatherReading {
    WeatherReading {
        id: ReadingId(Ulid::new()),
        timestamp: jiff::Timestamp::now(),
        barometer_hpa: Measurement::Pressure.convert(packet.barometer),
        in_temperature_c: Measurement::Temperature.convert(packet.in_temperature),
        in_humidity_pct: packet.in_humidity,
        out_temperature_c: Measurement::Temperature.convert(packet.out_temperature),
        wind_speed_kmh: Measurement::WindSpeed.convert(packet.wind_speed as f64),
        wind_direction_deg: packet.wind_direction,
        out_humidity_pct: packet.out_humidity,
        day_rain_mm: Measurement::Precipitation.convert(packet.day_rain as f64),
        rain_rate_mm: Measurement::Precipitation.convert(packet.rain_rate as f64),
        forecast: packet.forecast,
    }
}
