use std::net::SocketAddr;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::{Transport, TransportError};

/// Transport over a ser2net-style TCP serial bridge.
///
/// The bridge owns the actual device node and baud rate; this side only
/// sees the raw byte stream of the station's port.
pub struct TcpTransport {
    addr: SocketAddr,
    writer: Option<OwnedWriteHalf>,
}

impl TcpTransport {
    pub fn new(addr: SocketAddr) -> Self {
        Self { addr, writer: None }
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn open(
        &mut self,
        cancel: CancellationToken,
    ) -> Result<mpsc::Receiver<Vec<u8>>, TransportError> {
        let stream = TcpStream::connect(self.addr).await?;
        info!(addr = %self.addr, "Serial bridge connected");

        let (reader, writer) = stream.into_split();
        self.writer = Some(writer);

        let (tx, rx) = mpsc::channel(64);
        tokio::spawn(run_reader(reader, tx, cancel));

        Ok(rx)
    }

    async fn write(&mut self, bytes: &[u8]) -> Result<(), TransportError> {
        let writer = self.writer.as_mut().ok_or(TransportError::NotOpen)?;
        writer.write_all(bytes).await?;
        Ok(())
    }
}

async fn run_reader(
    mut reader: OwnedReadHalf,
    tx: mpsc::Sender<Vec<u8>>,
    cancel: CancellationToken,
) {
    let mut tmp = [0u8; 256];

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Serial bridge reader shutting down");
                break;
            }
            read = reader.read(&mut tmp) => {
                match read {
                    Ok(0) => {
                        info!("Serial bridge closed the connection");
                        break;
                    }
                    Ok(n) => {
                        if tx.send(tmp[..n].to_vec()).await.is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!(error = %e, "Serial bridge read failed");
                        break;
                    }
                }
            }
        }
    }
}
