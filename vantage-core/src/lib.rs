use serde::{Deserialize, Serialize};
use ulid::Ulid;

pub mod protocol;

pub use protocol::frame::FrameAssembler;
pub use protocol::packet::{LoopPacket, LoopVariant};
pub use protocol::units::Measurement;
pub use protocol::{ParseResult, ProtocolError};

/// Unique identifier for one emitted weather reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReadingId(pub Ulid);

/// Units carried by converted readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MetricUnit {
    /// Degrees Celsius (°C).
    Celsius,
    /// Hectopascals (hPa).
    HectoPascal,
    /// Kilometres per hour (km/h).
    KilometersPerHour,
    /// Millimeters (mm).
    Millimeters,
    /// Percent (%) values.
    Percent,
    /// Compass degrees, 0–359.
    Degrees,
}

/// A fully converted weather snapshot built from one LOOP packet.
///
/// Temperatures are in °C, pressure in hPa, wind speed in km/h and rain
/// totals in mm. Humidities, wind direction and the forecast code pass
/// through in the station's own units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeatherReading {
    /// Stable identity of this reading.
    pub id: ReadingId,
    /// Capture instant, stamped when the packet was decoded.
    pub timestamp: jiff::Timestamp,
    /// Barometric pressure in hPa.
    pub barometer_hpa: f64,
    /// Inside temperature in °C.
    pub in_temperature_c: f64,
    /// Inside relative humidity in percent.
    pub in_humidity_pct: i8,
    /// Outside temperature in °C.
    pub out_temperature_c: f64,
    /// Wind speed in km/h.
    pub wind_speed_kmh: f64,
    /// Wind direction in compass degrees.
    pub wind_direction_deg: u16,
    /// Outside relative humidity in percent.
    pub out_humidity_pct: i8,
    /// Rain since midnight in mm.
    pub day_rain_mm: f64,
    /// Current rain rate in mm/h.
    pub rain_rate_mm: f64,
    /// Forecast code from the console's onboard algorithm, unconverted.
    pub forecast: i8,
}
