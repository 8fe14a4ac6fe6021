pub mod error;
pub mod frame;
pub mod packet;
pub mod units;

pub use error::{ParseResult, ProtocolError};

/// Length of a steady-state LOOP frame.
pub const LOOP_FRAME_LEN: usize = 99;
/// Length of a first LOOP frame, where the console's ACK byte precedes
/// the packet proper.
pub const FIRST_LOOP_FRAME_LEN: usize = 100;
/// ASCII marker opening every LOOP packet.
pub const LOOP_MARKER: &[u8; 3] = b"LOO";
/// ACK byte the console sends before the first LOOP response.
pub const ACK: u8 = 0x06;
