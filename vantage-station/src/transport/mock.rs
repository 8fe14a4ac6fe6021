use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::info;

use vantage_core::protocol::packet::crc16;
use vantage_core::protocol::{LOOP_FRAME_LEN, LOOP_MARKER};

use super::{Transport, TransportError};

/// Simulated station behind the transport seam.
///
/// Every `LOOP 1` command is answered with one synthesized 99-byte frame
/// carrying plausible raw sensor values. Tests can inject arbitrary
/// chunks through the [`MockHandle`] and inspect every write that
/// reached the link.
pub struct MockTransport {
    handle: MockHandle,
    fail_open: Option<Box<str>>,
    auto_loop: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            handle: MockHandle::default(),
            fail_open: None,
            auto_loop: true,
        }
    }

    /// A station that never answers on its own; frames only arrive via
    /// [`MockHandle::inject`].
    pub fn silent() -> Self {
        Self {
            auto_loop: false,
            ..Self::new()
        }
    }

    /// A link that cannot be opened.
    pub fn failing(reason: &str) -> Self {
        Self {
            fail_open: Some(reason.into()),
            ..Self::new()
        }
    }

    pub fn handle(&self) -> MockHandle {
        self.handle.clone()
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

/// Test-side handle onto a [`MockTransport`].
#[derive(Clone, Default)]
pub struct MockHandle {
    tx: Arc<Mutex<Option<mpsc::Sender<Vec<u8>>>>>,
    written: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl MockHandle {
    /// Deliver a raw chunk as if it arrived from the station.
    pub async fn inject(&self, chunk: &[u8]) {
        if let Some(tx) = self.tx.lock().await.as_ref() {
            let _ = tx.send(chunk.to_vec()).await;
        }
    }

    /// Everything the driver has written to the link so far.
    pub async fn written(&self) -> Vec<Vec<u8>> {
        self.written.lock().await.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn open(
        &mut self,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<Vec<u8>>, TransportError> {
        if let Some(reason) = &self.fail_open {
            return Err(TransportError::Open(reason.clone()));
        }

        let (tx, rx) = mpsc::channel(64);
        *self.handle.tx.lock().await = Some(tx);
        info!("Mock station link opened");

        // Stop delivering once the session tears down.
        let tx_slot = Arc::clone(&self.handle.tx);
        tokio::spawn(async move {
            cancel.cancelled().await;
            tx_slot.lock().await.take();
        });

        Ok(rx)
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let tx_slot = self.handle.tx.lock().await;
        let tx = tx_slot.as_ref().ok_or(TransportError::NotOpen)?;

        self.handle.written.lock().await.push(bytes.to_vec());

        if self.auto_loop && bytes == b"LOOP 1\n" {
            let _ = tx.send(synth_loop_frame()).await;
        }
        Ok(())
    }
}

/// Build one 99-byte frame with randomized but plausible raw values and
/// an intact CRC trailer.
fn synth_loop_frame() -> Vec<u8> {
    let mut rng = rand::rng();
    let mut frame = vec![0u8; LOOP_FRAME_LEN];
    frame[..3].copy_from_slice(LOOP_MARKER);

    put_u16_le(&mut frame, 7, rng.random_range(29_000..31_000)); // inHg x1000
    put_u16_le(&mut frame, 9, rng.random_range(650..780)); // °F x10
    frame[11] = rng.random_range(30..60); // %
    put_u16_le(&mut frame, 12, rng.random_range(300..900)); // °F x10
    frame[14] = rng.random_range(0..40); // mph
    put_u16_le(&mut frame, 16, rng.random_range(0..360));
    frame[33] = rng.random_range(20..95); // %
    put_u16_le(&mut frame, 41, rng.random_range(0..50)); // clicks/h
    put_u16_le(&mut frame, 50, rng.random_range(0..150)); // clicks
    frame[89] = rng.random_range(1..9); // forecast code

    let crc = crc16(&frame[..97]);
    frame[97..99].copy_from_slice(&crc.to_be_bytes());
    frame
}

fn put_u16_le(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}
