//! NOTIFY event types.

use std::fmt;
use std::net::SocketAddr;

/// Transport a NOTIFY arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    /// Single-datagram UDP.
    Udp,

    /// Length-prefixed TCP.
    Tcp,
}

impl Transport {
    /// Returns the transport name for logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Udp => "UDP",
            Self::Tcp => "TCP",
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// One accepted NOTIFY, handed to the dispatcher and then discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotifyEvent {
    /// Zone name, dot-stripped and case-folded.
    pub zone: String,

    /// Address the message came from.
    pub source: SocketAddr,

    /// Transport the message arrived on.
    pub transport: Transport,
}

impl NotifyEvent {
    /// Creates an event.
    pub fn new(zone: impl Into<String>, source: SocketAddr, transport: Transport) -> Self {
        Self {
            zone: zone.into(),
            source,
            transport,
        }
    }
}

impl fmt::Display for NotifyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NOTIFY {} from {} ({})", self.zone, self.source, self.transport)
    }
}
