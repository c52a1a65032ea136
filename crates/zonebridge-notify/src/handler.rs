//! Per-message NOTIFY handling shared by the UDP and TCP servers.

use crate::dispatch::NotifyDispatch;
use crate::filter::ZoneAllowList;
use arc_swap::ArcSwap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use zonebridge_model::{NotifyEvent, Transport};
use zonebridge_proto::Message;

/// Parses, filters, answers, and dispatches one inbound message.
///
/// The allow-list sits behind an [`ArcSwap`] so a config reload swaps it
/// without touching the sockets. Dispatch runs in spawned tasks bounded by
/// a semaphore: at-least-once, possibly concurrent per zone, and never
/// blocking the accept loops.
pub struct NotifyHandler {
    allow: Arc<ArcSwap<ZoneAllowList>>,
    dispatcher: Arc<dyn NotifyDispatch>,
    dispatch_permits: Arc<Semaphore>,
}

impl NotifyHandler {
    /// Creates a handler.
    ///
    /// `max_dispatch` bounds the number of concurrently running resync
    /// actions; further dispatches queue on the semaphore.
    pub fn new(
        allow: Arc<ArcSwap<ZoneAllowList>>,
        dispatcher: Arc<dyn NotifyDispatch>,
        max_dispatch: usize,
    ) -> Self {
        Self {
            allow,
            dispatcher,
            dispatch_permits: Arc::new(Semaphore::new(max_dispatch.max(1))),
        }
    }

    /// Processes one message, returning the response bytes to send.
    ///
    /// `None` means no response at all: the message was malformed or was
    /// not a NOTIFY request. A well-formed NOTIFY always gets a response,
    /// whether or not the allow-list permits its dispatch.
    pub fn process(&self, data: &[u8], source: SocketAddr, transport: Transport) -> Option<Vec<u8>> {
        let message = match Message::parse(data) {
            Ok(message) => message,
            Err(e) => {
                debug!(source = %source, transport = %transport, error = %e, "Dropping unparsable message");
                return None;
            }
        };

        if !message.is_notify_request() {
            debug!(
                source = %source,
                transport = %transport,
                opcode = %message.header.opcode,
                response = message.header.is_response(),
                "Ignoring non-NOTIFY message"
            );
            return None;
        }

        let zone = match message.question() {
            Some(question) => question.zone_name(),
            None => {
                debug!(source = %source, transport = %transport, "Dropping NOTIFY without question");
                return None;
            }
        };

        let response = match message.notify_response().and_then(|r| r.to_wire()) {
            Ok(wire) => wire,
            Err(e) => {
                warn!(zone = %zone, error = %e, "Failed to build NOTIFY response");
                return None;
            }
        };

        let allow = self.allow.load();
        if allow.permits(&zone) {
            let event = NotifyEvent::new(zone.clone(), source, transport);
            info!(zone = %zone, source = %source, transport = %transport, "NOTIFY accepted");
            self.spawn_dispatch(event);
        } else {
            // The response is still sent: NOTIFY acknowledgement is a
            // protocol matter, local filtering only suppresses the resync.
            info!(zone = %zone, source = %source, transport = %transport, "NOTIFY filtered by allow-list");
        }

        Some(response)
    }

    fn spawn_dispatch(&self, event: NotifyEvent) {
        let dispatcher = self.dispatcher.clone();
        let permits = self.dispatch_permits.clone();

        tokio::spawn(async move {
            let _permit = match permits.acquire().await {
                Ok(permit) => permit,
                Err(_) => return, // semaphore closed: shutting down
            };
            if let Err(e) = dispatcher.dispatch(&event).await {
                warn!(zone = %event.zone, error = %e, "Resync dispatch failed");
            }
        });
    }
}
