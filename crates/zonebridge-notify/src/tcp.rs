//! TCP NOTIFY server.
//!
//! Each connection carries exactly one length-prefixed DNS message
//! (RFC 1035 §4.2.2): a 2-byte big-endian length bounded to
//! [`MIN_MESSAGE_SIZE`], [`MAX_MESSAGE_SIZE`], then the message. A prefix
//! outside the bound aborts the connection without a response.

use crate::handler::NotifyHandler;
use crate::Result;
use socket2::{Domain, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::{debug, error, info};
use zonebridge_model::Transport;
use zonebridge_proto::{MAX_MESSAGE_SIZE, MIN_MESSAGE_SIZE};

/// How long a connection may take to deliver its one message.
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// TCP listener: accept, read one message, answer, close.
pub struct TcpNotifyServer {
    listener: TcpListener,
    handler: Arc<NotifyHandler>,
    local_addr: SocketAddr,
}

impl TcpNotifyServer {
    /// Binds the TCP server to the given address.
    pub async fn bind(addr: SocketAddr, handler: Arc<NotifyHandler>) -> Result<Self> {
        let domain = if addr.is_ipv4() { Domain::IPV4 } else { Domain::IPV6 };
        let socket = Socket::new(domain, Type::STREAM, None)?;

        socket.set_reuse_address(true)?;
        #[cfg(unix)]
        socket.set_reuse_port(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;
        socket.listen(128)?;

        let std_listener: std::net::TcpListener = socket.into();
        let listener = TcpListener::from_std(std_listener)?;
        let local_addr = listener.local_addr()?;

        info!(addr = %local_addr, "NOTIFY listener bound (TCP)");

        Ok(Self {
            listener,
            handler,
            local_addr,
        })
    }

    /// Returns the bound address (useful with port 0 in tests).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Runs the accept loop until the shutdown signal fires.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        loop {
            tokio::select! {
                accepted = self.listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let handler = self.handler.clone();
                            tokio::spawn(async move {
                                if let Err(e) = handle_connection(stream, peer, handler).await {
                                    debug!(peer = %peer, error = %e, "TCP connection error");
                                }
                            });
                        }
                        Err(e) => {
                            error!(error = %e, "TCP accept error");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!(addr = %self.local_addr, "TCP listener stopping");
                    return Ok(());
                }
            }
        }
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    peer: SocketAddr,
    handler: Arc<NotifyHandler>,
) -> std::io::Result<()> {
    let message = match timeout(READ_TIMEOUT, read_message(&mut stream, peer)).await {
        Ok(Ok(Some(message))) => message,
        Ok(Ok(None)) => return Ok(()), // rejected length prefix: close silently
        Ok(Err(e)) => return Err(e),
        Err(_) => {
            debug!(peer = %peer, "TCP read timed out");
            return Ok(());
        }
    };

    if let Some(response) = handler.process(&message, peer, Transport::Tcp) {
        write_message(&mut stream, &response).await?;
    }

    Ok(())
}

/// Reads the single length-prefixed message from a connection.
///
/// Returns `None` when the length prefix is outside [12, 512]; the caller
/// closes the connection without responding.
async fn read_message(stream: &mut TcpStream, peer: SocketAddr) -> std::io::Result<Option<Vec<u8>>> {
    let mut len_buf = [0u8; 2];
    stream.read_exact(&mut len_buf).await?;
    let len = usize::from(u16::from_be_bytes(len_buf));

    if !(MIN_MESSAGE_SIZE..=MAX_MESSAGE_SIZE).contains(&len) {
        debug!(peer = %peer, len, "Rejecting TCP length prefix outside bounds");
        return Ok(None);
    }

    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await?;
    Ok(Some(buf))
}

/// Writes a length-prefixed message.
async fn write_message(stream: &mut TcpStream, data: &[u8]) -> std::io::Result<()> {
    let len = data.len() as u16;
    stream.write_all(&len.to_be_bytes()).await?;
    stream.write_all(data).await?;
    stream.flush().await
}
