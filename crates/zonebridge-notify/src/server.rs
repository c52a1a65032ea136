//! Combined UDP + TCP NOTIFY server.

use crate::handler::NotifyHandler;
use crate::tcp::TcpNotifyServer;
use crate::udp::UdpNotifyServer;
use crate::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// The NOTIFY listener: both transports over one handler.
///
/// Shutdown is signalled through a broadcast channel; both accept loops
/// exit on the next wakeup. In-flight dispatch tasks are not awaited;
/// resyncs are idempotent, so at-least-once semantics survive a restart.
pub struct NotifyServer {
    udp: UdpNotifyServer,
    tcp: TcpNotifyServer,
    shutdown_tx: broadcast::Sender<()>,
}

impl NotifyServer {
    /// Binds both transports on the given address.
    pub async fn bind(addr: SocketAddr, handler: Arc<NotifyHandler>) -> Result<Self> {
        let udp = UdpNotifyServer::bind(addr, handler.clone()).await?;
        // Share the UDP-resolved port so `addr` with port 0 lands both
        // transports on the same ephemeral port.
        let tcp_addr = SocketAddr::new(addr.ip(), udp.local_addr().port());
        let tcp = TcpNotifyServer::bind(tcp_addr, handler).await?;

        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Self { udp, tcp, shutdown_tx })
    }

    /// Returns the bound address (both transports share it).
    pub fn local_addr(&self) -> SocketAddr {
        self.udp.local_addr()
    }

    /// Returns a handle that stops the server when invoked.
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    /// Signals both loops to stop.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
    }

    /// Runs both accept loops until shutdown.
    pub async fn run(&self) -> Result<()> {
        info!(addr = %self.local_addr(), "NOTIFY listener running");

        let udp_shutdown = self.shutdown_tx.subscribe();
        let tcp_shutdown = self.shutdown_tx.subscribe();

        let (udp_result, tcp_result) =
            tokio::join!(self.udp.run(udp_shutdown), self.tcp.run(tcp_shutdown));

        udp_result?;
        tcp_result?;

        info!("NOTIFY listener stopped");
        Ok(())
    }
}

impl std::fmt::Debug for NotifyServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotifyServer")
            .field("addr", &self.local_addr())
            .finish()
    }
}
