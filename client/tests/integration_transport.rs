/// Integration tests for the message transport
///
/// The transport owns the connection state machine, request-id allocation,
/// the busy flag and handler fan-out; these tests drive it through the
/// host-glue callbacks the way an embedding environment would.
mod common;

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::{json, Value};

use simtree_client::{
    ClientCommand, ConnectionState, MessageSocket, Notification, TransportError,
};

use common::{
    compress_frame, init_logging, server_frame, MockSocket, RecordingHandler, UnavailableSocket,
};

#[test]
fn connect_and_open_reach_the_open_state() {
    init_logging();
    let mut socket = MessageSocket::new();
    let (mock, _frames) = MockSocket::new();

    socket.connect(mock, "ws://sim.local/ws", Vec::new()).unwrap();
    assert_eq!(socket.state(), ConnectionState::Connecting);

    socket.on_open();
    assert_eq!(socket.state(), ConnectionState::Open);
    assert_eq!(socket.take_notifications(), vec![Notification::Opened]);
}

#[test]
fn missing_socket_capability_fails_the_connect() {
    let mut socket = MessageSocket::new();
    let result = socket.connect(Box::new(UnavailableSocket), "ws://sim.local/ws", Vec::new());
    assert_eq!(result, Err(TransportError::NoCompatibleSocket));
    assert_eq!(socket.state(), ConnectionState::Closed);

    // the failed attempt does not poison the transport
    let (mock, _frames) = MockSocket::new();
    assert!(socket.connect(mock, "ws://sim.local/ws", Vec::new()).is_ok());
}

#[test]
fn connecting_twice_is_rejected() {
    let mut socket = MessageSocket::new();
    let (first, _frames) = MockSocket::new();
    socket.connect(first, "ws://sim.local/ws", Vec::new()).unwrap();

    let (second, _frames) = MockSocket::new();
    let result = socket.connect(second, "ws://sim.local/ws", Vec::new());
    assert_eq!(result, Err(TransportError::AlreadyConnected));
}

#[test]
fn sending_before_open_is_rejected() {
    let mut socket = MessageSocket::new();
    let (mock, _frames) = MockSocket::new();
    socket.connect(mock, "ws://sim.local/ws", Vec::new()).unwrap();

    let result = socket.send(ClientCommand::Start, None);
    assert_eq!(result, Err(TransportError::NotConnected));
}

#[test]
fn request_ids_are_unique_and_increasing_within_a_connection() {
    let mut socket = MessageSocket::new();
    let (mock, frames) = MockSocket::new();
    socket.connect(mock, "ws://sim.local/ws", Vec::new()).unwrap();
    socket.on_open();

    let a = socket.send(ClientCommand::Start, None).unwrap();
    let b = socket.send(ClientCommand::Pause, None).unwrap();
    let c = socket.send(ClientCommand::Stop, None).unwrap();

    assert_eq!(a, "client-0");
    assert_eq!(b, "client-1");
    assert_eq!(c, "client-2");
    assert_eq!(frames.borrow().len(), 3);
    assert!(frames.borrow()[0].contains(r#""requestID":"client-0""#));
    assert!(frames.borrow()[0].contains(r#""type":"start""#));
}

#[test]
fn adopted_client_id_prefixes_later_request_ids() {
    let mut socket = MessageSocket::new();
    let (mock, _frames) = MockSocket::new();
    socket.connect(mock, "ws://sim.local/ws", Vec::new()).unwrap();
    socket.on_open();

    let before = socket.send(ClientCommand::Start, None).unwrap();
    socket.set_client_id("Client42");
    let after = socket.send(ClientCommand::Pause, None).unwrap();

    // the sequence keeps counting across the identity change
    assert_eq!(before, "client-0");
    assert_eq!(after, "Client42-1");
}

#[test]
fn reload_commands_set_the_busy_flag_until_any_inbound_frame() {
    let mut socket = MessageSocket::new();
    let (mock, _frames) = MockSocket::new();
    socket.connect(mock, "ws://sim.local/ws", Vec::new()).unwrap();
    socket.on_open();
    assert!(!socket.is_busy());

    let url = Value::String("http://sim.local/model.xml".to_string());
    socket.send(ClientCommand::InitUrl, Some(&url)).unwrap();
    assert!(socket.is_busy());

    // non-reload traffic does not clear it
    socket.send(ClientCommand::GetWatch, None).unwrap();
    assert!(socket.is_busy());

    // any inbound frame does, even one that fails to decode
    socket.on_message(&[0xde, 0xad, 0xbe, 0xef]);
    assert!(!socket.is_busy());
}

#[test]
fn undecodable_frames_reach_no_handler_and_leave_the_connection_open() {
    init_logging();
    let mut socket = MessageSocket::new();
    let (mock, _frames) = MockSocket::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let handler = RecordingHandler::new("h", &seen);

    socket
        .connect(mock, "ws://sim.local/ws", vec![handler])
        .unwrap();
    socket.on_open();

    socket.on_message(&[0xff, 0x01, 0x02]);

    assert!(seen.borrow().is_empty());
    assert_eq!(socket.state(), ConnectionState::Open);
    assert_eq!(socket.handler_count(), 1);
    let notifications = socket.take_notifications();
    let failures = notifications
        .iter()
        .filter(|n| matches!(n, Notification::DecodeFailure { .. }))
        .count();
    assert_eq!(failures, 1, "exactly one decode-failure notification");

    // the next well-formed frame is dispatched normally
    socket.on_message(&server_frame("simulation_started", Value::Null));
    assert_eq!(seen.borrow().as_slice(), ["h:simulation_started"]);
}

#[test]
fn every_handler_observes_every_message_in_registration_order() {
    let mut socket = MessageSocket::new();
    let (mock, _frames) = MockSocket::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let first = RecordingHandler::new("h1", &seen);
    let second = RecordingHandler::new("h2", &seen);

    socket
        .connect(mock, "ws://sim.local/ws", vec![first, second])
        .unwrap();
    socket.on_open();

    socket.on_message(&server_frame("simulation_loaded", Value::Null));
    socket.on_message(&server_frame("simulation_started", Value::Null));

    assert_eq!(
        seen.borrow().as_slice(),
        [
            "h1:simulation_loaded",
            "h2:simulation_loaded",
            "h1:simulation_started",
            "h2:simulation_started",
        ]
    );
}

#[test]
fn closing_drops_every_handler() {
    let mut socket = MessageSocket::new();
    let (mock, _frames) = MockSocket::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let handler = RecordingHandler::new("h", &seen);

    socket
        .connect(mock, "ws://sim.local/ws", vec![handler])
        .unwrap();
    socket.on_open();
    assert_eq!(socket.handler_count(), 1);

    socket.on_close();
    assert_eq!(socket.state(), ConnectionState::Closed);
    assert_eq!(socket.handler_count(), 0);
    assert_eq!(
        socket.take_notifications(),
        vec![Notification::Opened, Notification::Closed]
    );
}

#[test]
fn removing_an_unregistered_handler_is_a_no_op() {
    let mut socket = MessageSocket::new();
    let (mock, _frames) = MockSocket::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let registered = RecordingHandler::new("in", &seen);
    let stranger = RecordingHandler::new("out", &seen);

    socket
        .connect(mock, "ws://sim.local/ws", vec![registered.clone()])
        .unwrap();
    socket.on_open();

    socket.remove_handler(&stranger);
    assert_eq!(socket.handler_count(), 1);

    socket.remove_handler(&registered);
    assert_eq!(socket.handler_count(), 0);
}

#[test]
fn connection_errors_surface_without_closing() {
    let mut socket = MessageSocket::new();
    let (mock, _frames) = MockSocket::new();
    socket.connect(mock, "ws://sim.local/ws", Vec::new()).unwrap();
    socket.on_open();

    socket.on_error("tls handshake renegotiated");
    assert_eq!(socket.state(), ConnectionState::Open);

    let notifications = socket.take_notifications();
    assert!(notifications.contains(&Notification::ConnectionError {
        description: "tls handshake renegotiated".to_string(),
    }));
}

#[test]
fn string_embedded_documents_survive_the_frame_codec() {
    let mut socket = MessageSocket::new();
    let (mock, _frames) = MockSocket::new();
    let seen = Rc::new(RefCell::new(Vec::new()));
    let handler = RecordingHandler::new("h", &seen);
    socket
        .connect(mock, "ws://sim.local/ws", vec![handler])
        .unwrap();
    socket.on_open();

    // servers embed documents as JSON text inside the envelope
    let embedded = json!({"e1": {"kind": "Entity", "path": "e1"}}).to_string();
    let frame = compress_frame(
        &json!({"type": "load_model", "update": embedded}).to_string(),
    );
    socket.on_message(&frame);
    assert_eq!(seen.borrow().as_slice(), ["h:load_model"]);
}
