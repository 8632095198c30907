//! End-to-end session tests over a loopback TCP socket.
//!
//! Each test bootstraps a full daemon on an ephemeral port, connects a
//! plain `TcpStream` client, and exercises the JSONL protocol exactly as a
//! remote peer would.

use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use jsonwebtoken::{Algorithm, EncodingKey, Header};
use serde::Serialize;
use serde_json::{Value, json};

use lectern_config::{Config, ConfigError, SocketEndpoint, TokenConfig};
use lectern_wire::{ServerFrame, SocketResponse, codes};

use crate::auth::{Role, TokenAuthority};
use crate::bootstrap::{ConfigLoader, Daemon, RunningListener, bootstrap_with};

struct LoopbackLoader;

impl ConfigLoader for LoopbackLoader {
    fn load(&self) -> Result<Config, ConfigError> {
        Ok(Config {
            socket: SocketEndpoint::tcp("127.0.0.1", 0),
            ..Config::default()
        })
    }
}

fn start_daemon() -> (Daemon, RunningListener, SocketAddr) {
    let daemon = bootstrap_with(&LoopbackLoader).expect("bootstrap daemon");
    let running = daemon.listen().expect("listen on loopback");
    let addr = running.local_addr().expect("tcp listener address");
    (daemon, running, addr)
}

fn authority() -> TokenAuthority {
    TokenAuthority::new(&TokenConfig::default())
}

struct TestClient {
    reader: BufReader<TcpStream>,
    writer: TcpStream,
}

impl TestClient {
    fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).expect("connect client");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("set read timeout");
        let writer = stream.try_clone().expect("clone stream");
        Self {
            reader: BufReader::new(stream),
            writer,
        }
    }

    fn send_line(&mut self, line: &str) {
        self.writer
            .write_all(format!("{line}\n").as_bytes())
            .expect("write line");
        self.writer.flush().expect("flush line");
    }

    fn read_frame(&mut self) -> ServerFrame {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).expect("read frame line");
        assert!(read > 0, "connection closed while expecting a frame");
        serde_json::from_str(&line).expect("parse server frame")
    }

    /// Reads until EOF; panics if the server sends anything further.
    fn expect_closed(&mut self) {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).expect("read at eof");
        assert_eq!(read, 0, "expected closed connection, got: {line}");
    }

    fn handshake(&mut self, token: &str) -> ServerFrame {
        self.send_line(&json!({"auth": {"token": token}}).to_string());
        self.read_frame()
    }

    fn request(
        &mut self,
        service: &str,
        action: &str,
        payload: Value,
        ack: Option<u64>,
    ) -> ServerFrame {
        let mut frame = json!({
            "type": service,
            "action": action,
            "payload": payload,
        });
        if let Some(id) = ack {
            frame["ack"] = json!(id);
        }
        self.send_line(&frame.to_string());
        self.read_frame()
    }
}

fn ack_response(frame: ServerFrame, expected_id: u64) -> SocketResponse {
    let ServerFrame::Ack { id, response } = frame else {
        panic!("expected ack frame, got {frame:?}");
    };
    assert_eq!(id, expected_id);
    response
}

#[test]
fn access_token_handshake_is_welcomed_with_subject() {
    let (_daemon, running, addr) = start_daemon();
    let token = authority()
        .issue_access("u1", "meera@example.com", Role::Admin)
        .expect("issue access token");

    let mut client = TestClient::connect(addr);
    let frame = client.handshake(&token);
    assert_eq!(
        frame,
        ServerFrame::welcome("admin", Some("u1".to_owned()))
    );

    running.shutdown();
    running.join().expect("join listener");
}

#[test]
fn handshake_without_token_is_rejected_and_closed() {
    let (_daemon, running, addr) = start_daemon();
    let mut client = TestClient::connect(addr);
    client.send_line("{}");
    assert_eq!(client.read_frame(), ServerFrame::rejected("unauthorized"));
    client.expect_closed();

    running.shutdown();
    running.join().expect("join listener");
}

#[test]
fn expired_access_token_is_rejected_before_any_request() {
    #[derive(Serialize)]
    struct StaleClaims {
        sub: String,
        email: String,
        role: String,
        iat: i64,
        exp: i64,
    }

    let (_daemon, running, addr) = start_daemon();
    let config = TokenConfig::default();
    let token = jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &StaleClaims {
            sub: "u1".to_owned(),
            email: "meera@example.com".to_owned(),
            role: "admin".to_owned(),
            iat: 1_000,
            exp: 2_000,
        },
        &EncodingKey::from_secret(config.access_secret.as_bytes()),
    )
    .expect("encode stale token");

    let mut client = TestClient::connect(addr);
    assert_eq!(
        client.handshake(&token),
        ServerFrame::rejected("invalid_token")
    );
    client.expect_closed();

    running.shutdown();
    running.join().expect("join listener");
}

#[test]
fn get_by_id_round_trip_strips_the_password() {
    let (_daemon, running, addr) = start_daemon();
    let token = authority()
        .issue_access("u2", "arjun@example.com", Role::User)
        .expect("issue access token");

    let mut client = TestClient::connect(addr);
    client.handshake(&token);

    let response = ack_response(
        client.request("userService", "getById", json!({"id": "u1"}), Some(1)),
        1,
    );
    assert!(response.status);
    assert_eq!(response.msg, "user_found");
    let data = response.data.expect("user data");
    assert_eq!(data["id"], "u1");
    assert!(data.get("password").is_none());
    assert_eq!(response.request.service, "userService");
    assert_eq!(response.request.action, "getById");

    let response = ack_response(
        client.request("userService", "getById", json!({}), Some(2)),
        2,
    );
    assert!(!response.status);
    assert_eq!(response.msg, codes::VALIDATION_FAILED);
    assert_eq!(response.errors, vec!["User ID is required"]);

    running.shutdown();
    running.join().expect("join listener");
}

#[test]
fn unknown_service_and_action_use_distinct_codes() {
    let (_daemon, running, addr) = start_daemon();
    let token = authority().issue_guest().expect("issue guest token");

    let mut client = TestClient::connect(addr);
    client.handshake(&token);

    let response = ack_response(
        client.request("paymentService", "charge", json!({}), Some(1)),
        1,
    );
    assert_eq!(response.msg, codes::SERVICE_NOT_FOUND);
    assert_eq!(response.errors, vec!["Service 'paymentService' not found"]);

    let response = ack_response(
        client.request("courseService", "archive", json!({}), Some(2)),
        2,
    );
    assert_eq!(response.msg, codes::ACTION_NOT_FOUND);
    assert_eq!(
        response.errors,
        vec!["Action 'archive' not found in service 'courseService'"]
    );

    running.shutdown();
    running.join().expect("join listener");
}

#[test]
fn guest_is_forbidden_from_admin_actions_but_session_survives() {
    let (_daemon, running, addr) = start_daemon();
    let token = authority().issue_guest().expect("issue guest token");

    let mut client = TestClient::connect(addr);
    assert_eq!(client.handshake(&token), ServerFrame::welcome("guest", None));

    let response = ack_response(
        client.request("courseService", "delete", json!({"id": "c1"}), Some(1)),
        1,
    );
    assert!(!response.status);
    assert_eq!(response.msg, codes::FORBIDDEN);

    let response = ack_response(client.request("courseService", "list", json!({}), Some(2)), 2);
    assert!(response.status);
    assert_eq!(response.msg, "courses_found");
    assert_eq!(response.data.expect("list data")["totalCount"], 3);

    running.shutdown();
    running.join().expect("join listener");
}

#[test]
fn ack_and_event_delivery_carry_identical_responses() {
    let (_daemon, running, addr) = start_daemon();
    let token = authority().issue_guest().expect("issue guest token");

    let mut client = TestClient::connect(addr);
    client.handshake(&token);

    let acked = ack_response(
        client.request("courseService", "list", json!({"limit": 2}), Some(7)),
        7,
    );
    let frame = client.request("courseService", "list", json!({"limit": 2}), None);
    let ServerFrame::Event { event, response } = frame else {
        panic!("expected event frame");
    };
    assert_eq!(event, "response");
    assert_eq!(
        serde_json::to_value(&response).expect("serialize event response"),
        serde_json::to_value(&acked).expect("serialize ack response")
    );

    running.shutdown();
    running.join().expect("join listener");
}

#[test]
fn malformed_line_produces_protocol_error_and_session_continues() {
    let (_daemon, running, addr) = start_daemon();
    let token = authority().issue_guest().expect("issue guest token");

    let mut client = TestClient::connect(addr);
    client.handshake(&token);

    client.send_line("this is not json");
    assert!(matches!(
        client.read_frame(),
        ServerFrame::ProtocolError { .. }
    ));

    let response = ack_response(client.request("courseService", "list", json!({}), Some(1)), 1);
    assert!(response.status);

    running.shutdown();
    running.join().expect("join listener");
}

#[test]
fn missing_type_and_action_fail_validation_with_echo() {
    let (_daemon, running, addr) = start_daemon();
    let token = authority().issue_guest().expect("issue guest token");

    let mut client = TestClient::connect(addr);
    client.handshake(&token);

    client.send_line(&json!({"payload": {}, "ack": 3}).to_string());
    let response = ack_response(client.read_frame(), 3);
    assert!(!response.status);
    assert_eq!(response.msg, codes::VALIDATION_FAILED);
    assert_eq!(
        response.errors,
        vec!["Request type is required", "Request action is required"]
    );
    assert_eq!(response.request.service, "");
    assert_eq!(response.request.action, "");

    running.shutdown();
    running.join().expect("join listener");
}

#[test]
fn connections_share_store_state() {
    let (_daemon, running, addr) = start_daemon();
    let admin = authority()
        .issue_access("u1", "meera@example.com", Role::Admin)
        .expect("issue admin token");
    let guest = authority().issue_guest().expect("issue guest token");

    let mut admin_client = TestClient::connect(addr);
    admin_client.handshake(&admin);
    let response = ack_response(
        admin_client.request("courseService", "delete", json!({"id": "c1"}), Some(1)),
        1,
    );
    assert!(response.status);
    assert_eq!(response.msg, "course_deleted_successfully");

    let mut guest_client = TestClient::connect(addr);
    guest_client.handshake(&guest);
    let response = ack_response(
        guest_client.request("courseService", "list", json!({}), Some(1)),
        1,
    );
    assert_eq!(response.data.expect("list data")["totalCount"], 2);

    running.shutdown();
    running.join().expect("join listener");
}
