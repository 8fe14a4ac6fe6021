use super::error::ProtocolError;
use crate::MetricUnit;

/// Measurement kinds the station reports in its native imperial units.
///
/// The set is closed: a kind outside these four cannot be constructed,
/// and the symbolic names used on the wire ("t", "p", "w", "pp") are
/// rejected loudly when they don't match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measurement {
    /// Temperature in °F.
    Temperature,
    /// Barometric pressure in inches of mercury.
    Pressure,
    /// Wind speed in mph.
    WindSpeed,
    /// Rain gauge clicks, 0.2 mm per click.
    Precipitation,
}

impl Measurement {
    /// Convert a raw native-unit value to the metric target unit.
    ///
    /// Pure and total over the numeric domain.
    pub fn convert(self, raw: f64) -> f64 {
        match self {
            Measurement::Temperature => (raw - 32.0) * 5.0 / 9.0,
            Measurement::Pressure => raw * 33.8638816,
            Measurement::WindSpeed => raw * 1.609344,
            Measurement::Precipitation => raw * 0.2,
        }
    }

    /// Unit of the converted value.
    pub fn target_unit(self) -> MetricUnit {
        match self {
            Measurement::Temperature => MetricUnit::Celsius,
            Measurement::Pressure => MetricUnit::HectoPascal,
            Measurement::WindSpeed => MetricUnit::KilometersPerHour,
            Measurement::Precipitation => MetricUnit::Millimeters,
        }
    }
}

impl TryFrom<&str> for Measurement {
    type Error = ProtocolError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "t" => Ok(Measurement::Temperature),
            "p" => Ok(Measurement::Pressure),
            "w" => Ok(Measurement::WindSpeed),
            "pp" => Ok(Measurement::Precipitation),
            other => Err(ProtocolError::InvalidMeasurementKind(other.into())),
        }
    }
}
