use super::error::{ParseResult, ProtocolError};
use super::{FIRST_LOOP_FRAME_LEN, LOOP_FRAME_LEN, LOOP_MARKER};

// LOOP frame structure: "LOO" marker + status fields + crc(2), 99 bytes.
// The first response after a wake carries the ACK byte in front, making
// it 100 bytes with every offset shifted by one.

/// The two LOOP frame revisions a console emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopVariant {
    /// 100-byte frame with the marker at offset 1.
    FirstLoop,
    /// Steady-state 99-byte frame with the marker at offset 0.
    Loop,
}

impl LoopVariant {
    /// Recognize a buffer as one of the two LOOP revisions.
    ///
    /// Returns `None` for anything else; such buffers carry no telemetry
    /// and are dropped by callers without raising an error.
    pub fn classify(buf: &[u8]) -> Option<Self> {
        if buf.len() == FIRST_LOOP_FRAME_LEN && buf[1..4] == *LOOP_MARKER {
            return Some(LoopVariant::FirstLoop);
        }
        if buf.len() == LOOP_FRAME_LEN && buf[0..3] == *LOOP_MARKER {
            return Some(LoopVariant::Loop);
        }
        None
    }

    /// Byte-offset shift applied to every field read of this revision.
    pub fn shift(self) -> usize {
        match self {
            LoopVariant::FirstLoop => 1,
            LoopVariant::Loop => 0,
        }
    }

    pub fn frame_len(self) -> usize {
        match self {
            LoopVariant::FirstLoop => FIRST_LOOP_FRAME_LEN,
            LoopVariant::Loop => LOOP_FRAME_LEN,
        }
    }
}

/// One decoded LOOP packet, still in the station's native units.
///
/// Pressure is in inches of mercury, temperatures in °F, wind speed in
/// mph and rain totals in gauge clicks. The trailing CRC word is
/// extracted but never checked here; see [`LoopPacket::verify_crc`].
#[derive(Debug, Clone, PartialEq)]
pub struct LoopPacket {
    pub barometer: f64,
    pub in_temperature: f64,
    pub in_humidity: i8,
    pub out_temperature: f64,
    pub wind_speed: i8,
    pub wind_direction: u16,
    pub out_humidity: i8,
    pub day_rain: u16,
    pub rain_rate: u16,
    pub forecast: i8,
    pub crc: u16,
}

impl LoopPacket {
    /// Decode a classified frame.
    ///
    /// Every field read is bounds-checked against the buffer even though
    /// classification already pins the valid lengths.
    pub fn from_bytes(buf: &[u8], variant: LoopVariant) -> ParseResult<Self> {
        let m = variant.shift();

        Ok(Self {
            barometer: read_u16_le(buf, 7 + m, "barometer")? as f64 / 1000.0,
            in_temperature: read_u16_le(buf, 9 + m, "in_temperature")? as f64 / 10.0,
            in_humidity: read_i8(buf, 11 + m, "in_humidity")?,
            out_temperature: read_u16_le(buf, 12 + m, "out_temperature")? as f64 / 10.0,
            wind_speed: read_i8(buf, 14 + m, "wind_speed")?,
            wind_direction: read_u16_le(buf, 16 + m, "wind_direction")?,
            out_humidity: read_i8(buf, 33 + m, "out_humidity")?,
            day_rain: read_u16_le(buf, 50 + m, "day_rain")?,
            rain_rate: read_u16_le(buf, 41 + m, "rain_rate")?,
            forecast: read_i8(buf, 89 + m, "forecast")?,
            crc: read_u16_le(buf, 97 + m, "crc")?,
        })
    }

    /// Opt-in frame validation; decoding never applies it.
    ///
    /// The console checksums the packet body and appends the CRC
    /// most-significant byte first, so running the CRC over body and
    /// trailer together yields zero for an intact frame.
    pub fn verify_crc(buf: &[u8], variant: LoopVariant) -> ParseResult<()> {
        let m = variant.shift();
        let end = variant.frame_len();
        if end > buf.len() {
            return Err(ProtocolError::OutOfBounds {
                field: "crc",
                end,
                len: buf.len(),
            });
        }

        if crc16(&buf[m..end]) != 0 {
            return Err(ProtocolError::CrcMismatch {
                expected: u16::from_be_bytes([buf[end - 2], buf[end - 1]]),
                actual: crc16(&buf[m..end - 2]),
            });
        }
        Ok(())
    }
}

/// CRC-16/CCITT as computed by the console firmware (poly 0x1021,
/// initial value 0, no reflection).
pub fn crc16(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ 0x1021
            } else {
                crc << 1
            };
        }
    }
    crc
}

fn read_u16_le(buf: &[u8], offset: usize, field: &'static str) -> ParseResult<u16> {
    let end = offset + 2;
    if end > buf.len() {
        return Err(ProtocolError::OutOfBounds {
            field,
            end,
            len: buf.len(),
        });
    }
    Ok(u16::from_le_bytes([buf[offset], buf[offset + 1]]))
}

fn read_i8(buf: &[u8], offset: usize, field: &'static str) -> ParseResult<i8> {
    if offset >= buf.len() {
        return Err(ProtocolError::OutOfBounds {
            field,
            end: offset + 1,
            len: buf.len(),
        });
    }
    Ok(buf[offset] as i8)
}
