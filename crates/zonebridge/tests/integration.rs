//! End-to-end tests for the NOTIFY listener over real sockets.
//!
//! Each test binds UDP + TCP on an ephemeral port, drives the listener
//! with wire-format messages built from zonebridge-proto, and observes
//! both the protocol responses and what reached the dispatcher.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpStream, UdpSocket};
use tokio::time::timeout;

use zonebridge_model::NotifyEvent;
use zonebridge_notify::{NotifyDispatch, NotifyHandler, NotifyServer, ZoneAllowList};
use zonebridge_proto::{Header, Message, OpCode, Question};

const RECV_TIMEOUT: Duration = Duration::from_secs(2);
const NO_TRAFFIC: Duration = Duration::from_millis(300);

// ============================================================================
// Test Helpers
// ============================================================================

/// Dispatcher that records every zone it is asked to resync.
struct RecordingDispatcher {
    zones: Mutex<Vec<String>>,
}

impl RecordingDispatcher {
    fn new() -> Arc<Self> {
        Arc::new(Self { zones: Mutex::new(Vec::new()) })
    }

    fn zones(&self) -> Vec<String> {
        self.zones.lock().clone()
    }
}

#[async_trait]
impl NotifyDispatch for RecordingDispatcher {
    async fn dispatch(&self, event: &NotifyEvent) -> zonebridge_notify::Result<()> {
        self.zones.lock().push(event.zone.clone());
        Ok(())
    }
}

struct TestListener {
    addr: SocketAddr,
    dispatcher: Arc<RecordingDispatcher>,
    allow: Arc<ArcSwap<ZoneAllowList>>,
    server: Arc<NotifyServer>,
}

impl TestListener {
    async fn start(allow_entries: &[&str]) -> Self {
        let allow_list = if allow_entries.is_empty() {
            ZoneAllowList::allow_all()
        } else {
            ZoneAllowList::from_entries(allow_entries.iter().copied())
        };
        let allow = Arc::new(ArcSwap::new(Arc::new(allow_list)));

        let dispatcher = RecordingDispatcher::new();
        let handler = Arc::new(NotifyHandler::new(allow.clone(), dispatcher.clone(), 4));

        let server = Arc::new(
            NotifyServer::bind("127.0.0.1:0".parse().unwrap(), handler)
                .await
                .expect("bind listener"),
        );
        let addr = server.local_addr();

        let run_server = server.clone();
        tokio::spawn(async move {
            let _ = run_server.run().await;
        });

        // Give the accept loops a beat to start.
        tokio::time::sleep(Duration::from_millis(20)).await;

        Self { addr, dispatcher, allow, server }
    }

    async fn dispatched_zones(&self) -> Vec<String> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.dispatcher.zones()
    }
}

impl Drop for TestListener {
    fn drop(&mut self) {
        self.server.shutdown();
    }
}

async fn send_udp(addr: SocketAddr, payload: &[u8]) -> Option<Vec<u8>> {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket.send_to(payload, addr).await.unwrap();

    let mut buf = vec![0u8; 1024];
    match timeout(RECV_TIMEOUT, socket.recv_from(&mut buf)).await {
        Ok(Ok((len, _))) => Some(buf[..len].to_vec()),
        _ => None,
    }
}

/// Sends raw bytes over TCP and reads whatever comes back until EOF or
/// timeout.
async fn send_tcp_raw(addr: SocketAddr, payload: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(payload).await.unwrap();
    stream.flush().await.unwrap();

    let mut response = Vec::new();
    let mut buf = vec![0u8; 1024];
    loop {
        match timeout(RECV_TIMEOUT, stream.read(&mut buf)).await {
            Ok(Ok(0)) => break, // connection closed
            Ok(Ok(n)) => response.extend_from_slice(&buf[..n]),
            _ => break,
        }
    }
    response
}

async fn send_tcp_message(addr: SocketAddr, message: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(message.len() + 2);
    framed.extend_from_slice(&(message.len() as u16).to_be_bytes());
    framed.extend_from_slice(message);
    send_tcp_raw(addr, &framed).await
}

fn notify_wire(id: u16, zone: &str) -> Vec<u8> {
    Message::notify_request(id, zone).to_wire().unwrap()
}

// ============================================================================
// UDP
// ============================================================================

#[tokio::test]
async fn udp_notify_is_answered_and_dispatched() {
    let listener = TestListener::start(&[]).await;

    let response = send_udp(listener.addr, &notify_wire(0x4242, "example.com"))
        .await
        .expect("NOTIFY response");

    let parsed = Message::parse(&response).unwrap();
    assert_eq!(parsed.header.id, 0x4242);
    assert!(parsed.header.is_response());
    assert!(parsed.header.is_authoritative());
    assert_eq!(parsed.header.opcode, OpCode::Notify);
    assert_eq!(parsed.question().unwrap().zone_name(), "example.com");

    assert_eq!(listener.dispatched_zones().await, vec!["example.com".to_string()]);
}

#[tokio::test]
async fn udp_non_notify_gets_no_response() {
    let listener = TestListener::start(&[]).await;

    let mut header = Header::new(0x0101, OpCode::Query);
    header.qd_count = 1;
    let query = Message { header, questions: vec![Question::soa("example.com")] };

    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket
        .send_to(&query.to_wire().unwrap(), listener.addr)
        .await
        .unwrap();

    let mut buf = vec![0u8; 512];
    assert!(
        timeout(NO_TRAFFIC, socket.recv_from(&mut buf)).await.is_err(),
        "plain query must be ignored"
    );
    assert!(listener.dispatched_zones().await.is_empty());
}

#[tokio::test]
async fn udp_garbage_is_ignored() {
    let listener = TestListener::start(&[]).await;
    assert!(send_udp(listener.addr, &[0xDE, 0xAD, 0xBE]).await.is_none());
    assert!(listener.dispatched_zones().await.is_empty());
}

// ============================================================================
// Allow-list filtering
// ============================================================================

#[tokio::test]
async fn filtering_follows_allow_list() {
    let listener = TestListener::start(&["example.com", "*.test.com"]).await;

    // Wildcard subdomain, case-insensitive: dispatched.
    let response = send_udp(listener.addr, &notify_wire(1, "SUB.Test.COM")).await;
    assert!(response.is_some());

    // Not on the list: answered per protocol, but not dispatched.
    let response = send_udp(listener.addr, &notify_wire(2, "other.com")).await;
    assert!(response.is_some(), "filtered NOTIFY still gets a response");

    assert_eq!(listener.dispatched_zones().await, vec!["sub.test.com".to_string()]);
}

#[tokio::test]
async fn allow_list_reload_applies_without_rebinding() {
    let listener = TestListener::start(&["a.example"]).await;

    assert!(send_udp(listener.addr, &notify_wire(1, "b.example")).await.is_some());
    assert!(listener.dispatched_zones().await.is_empty());

    // Simulate a SIGHUP reload: swap the allow-list in place.
    listener
        .allow
        .store(Arc::new(ZoneAllowList::from_entries(["b.example"])));

    assert!(send_udp(listener.addr, &notify_wire(2, "b.example")).await.is_some());
    assert_eq!(listener.dispatched_zones().await, vec!["b.example".to_string()]);
}

// ============================================================================
// TCP
// ============================================================================

#[tokio::test]
async fn tcp_notify_is_answered_and_dispatched() {
    let listener = TestListener::start(&[]).await;

    let response = send_tcp_message(listener.addr, &notify_wire(0x0707, "example.org")).await;
    assert!(response.len() > 2, "expected a length-prefixed response");

    let len = usize::from(u16::from_be_bytes([response[0], response[1]]));
    assert_eq!(len, response.len() - 2);

    let parsed = Message::parse(&response[2..]).unwrap();
    assert_eq!(parsed.header.id, 0x0707);
    assert!(parsed.header.is_response());
    assert!(parsed.header.is_authoritative());

    assert_eq!(listener.dispatched_zones().await, vec!["example.org".to_string()]);
}

#[tokio::test]
async fn tcp_oversized_length_prefix_closes_without_response() {
    let listener = TestListener::start(&[]).await;

    // Length 600 exceeds the 512-byte bound.
    let mut payload = 600u16.to_be_bytes().to_vec();
    payload.extend_from_slice(&notify_wire(1, "example.com"));

    let response = send_tcp_raw(listener.addr, &payload).await;
    assert!(response.is_empty(), "no response bytes for rejected prefix");
    assert!(listener.dispatched_zones().await.is_empty());
}

#[tokio::test]
async fn tcp_undersized_length_prefix_closes_without_response() {
    let listener = TestListener::start(&[]).await;

    // Length 5 is below the 12-byte header minimum.
    let payload = [0u8, 5, 1, 2, 3, 4, 5];
    let response = send_tcp_raw(listener.addr, &payload).await;
    assert!(response.is_empty());
    assert!(listener.dispatched_zones().await.is_empty());
}

#[tokio::test]
async fn tcp_malformed_message_closes_without_response() {
    let listener = TestListener::start(&[]).await;

    // Valid length prefix framing twelve 0xFF bytes: parses as header
    // with a reserved opcode and is dropped.
    let mut payload = 12u16.to_be_bytes().to_vec();
    payload.extend_from_slice(&[0xFF; 12]);

    let response = send_tcp_raw(listener.addr, &payload).await;
    assert!(response.is_empty());
    assert!(listener.dispatched_zones().await.is_empty());
}

// ============================================================================
// Resilience
// ============================================================================

#[tokio::test]
async fn listener_survives_bad_traffic_between_good_messages() {
    let listener = TestListener::start(&[]).await;

    assert!(send_udp(listener.addr, &notify_wire(1, "one.example")).await.is_some());
    let _ = send_udp(listener.addr, &[0x00]).await;
    let _ = send_tcp_raw(listener.addr, &[0x02, 0x58]).await; // bad prefix, no body
    assert!(send_udp(listener.addr, &notify_wire(2, "two.example")).await.is_some());

    let zones = listener.dispatched_zones().await;
    assert_eq!(zones, vec!["one.example".to_string(), "two.example".to_string()]);
}

#[tokio::test]
async fn concurrent_notifies_all_dispatch() {
    let listener = TestListener::start(&[]).await;

    let mut tasks = Vec::new();
    for i in 0..8u16 {
        let addr = listener.addr;
        tasks.push(tokio::spawn(async move {
            send_udp(addr, &notify_wire(i, &format!("zone-{i}.example"))).await
        }));
    }
    for task in tasks {
        assert!(task.await.unwrap().is_some());
    }

    let mut zones = listener.dispatched_zones().await;
    zones.sort();
    assert_eq!(zones.len(), 8);
    assert_eq!(zones[0], "zone-0.example");
}
