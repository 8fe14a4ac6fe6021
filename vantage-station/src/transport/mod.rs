pub mod mock;
pub mod tcp;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("failed to open link: {0}")]
    Open(Box<str>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("link is not open")]
    NotOpen,
}

/// Byte-chunk source and command sink for the station link.
///
/// `open` completes once the link is up and returns the receiving half
/// of a channel onto which the transport delivers raw chunks as they
/// arrive. Chunks carry no framing guarantee. Delivery stops when the
/// cancellation token fires, the peer closes, or the link errors.
#[async_trait]
pub trait Transport: Send + 'static {
    /// Establish the link and start delivering byte chunks.
    async fn open(
        &mut self,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<Vec<u8>>, TransportError>;

    /// Write raw bytes to the link.
    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError>;
}
