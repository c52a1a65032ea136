//! UDP NOTIFY server.

use crate::handler::NotifyHandler;
use crate::Result;
use socket2::{Domain, Socket, Type};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::UdpSocket;
use tokio::sync::broadcast;
use tracing::{debug, error, info};
use zonebridge_model::Transport;
use zonebridge_proto::MAX_MESSAGE_SIZE;

/// UDP listener: one datagram in, at most one datagram out.
pub struct UdpNotifyServer {
    socket: Arc<UdpSocket>,
    handler: Arc<NotifyHandler>,
    local_addr: SocketAddr,
}

impl UdpNotifyServer {
    /// Binds the UDP server to the given address.
    pub async fn bind(addr: SocketAddr, handler: Arc<NotifyHandler>) -> Result<Self> {
        let domain = if addr.is_ipv4() { Domain::IPV4 } else { Domain::IPV6 };
        let socket = Socket::new(domain, Type::DGRAM, None)?;

        socket.set_reuse_address(true)?;
        #[cfg(unix)]
        socket.set_reuse_port(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;

        let std_socket: std::net::UdpSocket = socket.into();
        let socket = UdpSocket::from_std(std_socket)?;
        let local_addr = socket.local_addr()?;

        info!(addr = %local_addr, "NOTIFY listener bound (UDP)");

        Ok(Self {
            socket: Arc::new(socket),
            handler,
            local_addr,
        })
    }

    /// Returns the bound address (useful with port 0 in tests).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Runs the receive loop until the shutdown signal fires.
    pub async fn run(&self, mut shutdown: broadcast::Receiver<()>) -> Result<()> {
        // One extra byte so oversized datagrams are detectable rather
        // than silently truncated into something that might still parse.
        let mut buf = vec![0u8; MAX_MESSAGE_SIZE + 1];

        loop {
            tokio::select! {
                received = self.socket.recv_from(&mut buf) => {
                    match received {
                        Ok((len, source)) => {
                            if len > MAX_MESSAGE_SIZE {
                                debug!(source = %source, len, "Dropping oversized UDP datagram");
                                continue;
                            }

                            if let Some(response) =
                                self.handler.process(&buf[..len], source, Transport::Udp)
                            {
                                if let Err(e) = self.socket.send_to(&response, source).await {
                                    debug!(source = %source, error = %e, "Failed to send UDP response");
                                }
                            }
                        }
                        Err(e) => {
                            // Transient receive errors must not kill the loop.
                            error!(error = %e, "UDP receive error");
                        }
                    }
                }
                _ = shutdown.recv() => {
                    info!(addr = %self.local_addr, "UDP listener stopping");
                    return Ok(());
                }
            }
        }
    }
}
